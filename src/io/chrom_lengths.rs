use crate::{
    core::call::canonical_chrom, error::SvmError, io::readers::open_call_reader,
    utils::util::Result,
};
use std::{collections::HashMap, io::BufRead, path::Path};

const LENGTH_COLUMN: usize = 2;

/// Chromosome-lengths table used by the significant matching mode.
/// Rows are whitespace-delimited with the chromosome name in the first
/// field and its length in the third.
pub fn load_chrom_lengths(path: &Path) -> Result<HashMap<String, i64>> {
    let reader = open_call_reader(path)?;
    let mut lengths = HashMap::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line_number = line_idx + 1;
        let line = line.map_err(|error| {
            crate::svm_error!("Error reading {}:{line_number}: {error}", path.display())
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= LENGTH_COLUMN {
            return Err(SvmError::malformed_line(
                path,
                line_number,
                format!(
                    "expected at least {} fields, found {}",
                    LENGTH_COLUMN + 1,
                    fields.len()
                ),
            ));
        }
        let length = fields[LENGTH_COLUMN].parse::<i64>().map_err(|_| {
            SvmError::malformed_line(
                path,
                line_number,
                format!("invalid chromosome length: '{}'", fields[LENGTH_COLUMN]),
            )
        })?;
        lengths.insert(canonical_chrom(fields[0]), length);
    }
    Ok(lengths)
}
