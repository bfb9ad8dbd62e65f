use crate::{
    core::{
        call::{CallRecord, TrioGenotype, Zygosity},
        call_set::CallSet,
        svtype::SvType,
    },
    error::SvmError,
    io::readers::open_call_reader,
    utils::util::Result,
};
use std::{collections::HashMap, io::BufRead, path::Path};

const SIMPLE_MIN_FIELDS: usize = 4;
const SIMPLE_MAX_FIELDS: usize = 5;
const VCF_MIN_FIELDS: usize = 8;
const VCF_FORMAT_COLUMN: usize = 8;

/// Column indices of the trio samples, located in the `#`-prefixed
/// header line.
#[derive(Debug, Clone, Copy)]
struct TrioColumns {
    mother: usize,
    father: usize,
    child: usize,
}

/// Loads one caller's prediction file into a normalized call set.
///
/// Input coordinates are 1-based inclusive and converted to 0-based
/// half-open. Two record shapes are accepted per line: simple tabular
/// (`chrom start end TYPE [tag]`) and VCF-like rows with at least eight
/// columns. Malformed lines abort the load with file and line context;
/// records outside the DEL/INS domain are silently dropped.
pub fn load_call_file(path: &Path, source_id: usize, trio: bool) -> Result<CallSet> {
    let reader = open_call_reader(path)?;
    let mut set = CallSet::new();
    let mut trio_columns: Option<TrioColumns> = None;

    for (line_idx, line) in reader.lines().enumerate() {
        let line_number = line_idx + 1;
        let line = line.map_err(|error| {
            crate::svm_error!("Error reading {}:{line_number}: {error}", path.display())
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("##") {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            trio_columns = locate_trio_columns(header);
            if trio && trio_columns.is_none() {
                return Err(SvmError::MissingTrioColumns {
                    path: path.to_path_buf(),
                });
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let record = match fields.len() {
            SIMPLE_MIN_FIELDS..=SIMPLE_MAX_FIELDS => {
                parse_tabular_row(&fields, path, line_number, source_id)?
            }
            n if n >= VCF_MIN_FIELDS => {
                match parse_vcf_row(&fields, path, line_number, source_id)? {
                    Some(mut record) if trio => {
                        let columns = trio_columns.ok_or_else(|| SvmError::MissingTrioColumns {
                            path: path.to_path_buf(),
                        })?;
                        let genotype = decode_trio_genotype(&fields, columns, path, line_number)?;
                        // Calls no family member carries are not calls
                        // at all.
                        if genotype.is_absent() {
                            None
                        } else {
                            record.genotype = Some(genotype);
                            Some(record)
                        }
                    }
                    record => record,
                }
            }
            n => {
                return Err(SvmError::malformed_line(
                    path,
                    line_number,
                    format!("expected 4-5 or >=8 fields, found {n}"),
                ))
            }
        };
        if let Some(record) = record {
            set.push(record);
        }
    }

    set.sort();
    log::debug!(
        "Loaded {} calls from {} (source {})",
        set.len(),
        path.display(),
        source_id
    );
    Ok(set)
}

fn locate_trio_columns(header: &str) -> Option<TrioColumns> {
    let mut mother = None;
    let mut father = None;
    let mut child = None;
    for (index, name) in header.split_whitespace().enumerate() {
        match name.to_lowercase().as_str() {
            "mother" => mother = Some(index),
            "father" => father = Some(index),
            "child" => child = Some(index),
            _ => {}
        }
    }
    Some(TrioColumns {
        mother: mother?,
        father: father?,
        child: child?,
    })
}

fn parse_coordinate(
    field: &str,
    label: &str,
    path: &Path,
    line_number: usize,
) -> Result<i64> {
    field.parse::<i64>().map_err(|_| {
        SvmError::malformed_line(
            path,
            line_number,
            format!("invalid {label} coordinate: '{field}'"),
        )
    })
}

fn parse_tabular_row(
    fields: &[&str],
    path: &Path,
    line_number: usize,
    source_id: usize,
) -> Result<Option<CallRecord>> {
    if fields[1] == "n/a" || fields[2] == "n/a" {
        return Ok(None);
    }
    let svtype: SvType = fields[3].parse().map_err(|_| {
        SvmError::malformed_line(
            path,
            line_number,
            format!("invalid SV type: '{}'", fields[3]),
        )
    })?;
    let start = parse_coordinate(fields[1], "start", path, line_number)?;
    let end = parse_coordinate(fields[2], "end", path, line_number)?;
    // 1-based inclusive to 0-based half-open.
    let start0 = start - 1;
    let end0 = end;
    if start0 > end0 {
        return Err(SvmError::malformed_line(
            path,
            line_number,
            format!("start {start} is past end {end}"),
        ));
    }
    let mut record = CallRecord::new(fields[0], start0, end0, svtype, source_id);
    if let Some(tag) = fields.get(4) {
        record.info = (*tag).to_string();
    }
    Ok(Some(record))
}

fn decode_info_fields(info: &str) -> HashMap<&str, &str> {
    let mut fields = HashMap::new();
    for encoding in info.trim_matches(';').split(';') {
        if let Some((name, value)) = encoding.split_once('=') {
            fields.insert(name, value);
        }
    }
    fields
}

const DNA_ALPHABET: &[u8] = b"ACGTRYMKWSBDHVN";

fn is_dna_string(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| DNA_ALPHABET.contains(&b.to_ascii_uppercase()))
}

fn parse_vcf_row(
    fields: &[&str],
    path: &Path,
    line_number: usize,
    source_id: usize,
) -> Result<Option<CallRecord>> {
    let pos = parse_coordinate(fields[1], "position", path, line_number)?;
    let ref_allele = fields[3];
    let alt_allele = fields[4];
    let info = fields[7];

    let (svtype, start0, svlen) = if ref_allele == "." || alt_allele == "." {
        // Symbolic record: type and length live in INFO.
        let info_fields = decode_info_fields(info);
        let svtype = match info_fields.get("SVTYPE") {
            Some(&"DEL") => SvType::DELETION,
            Some(&"INS") => SvType::INSERTION,
            _ => return Ok(None),
        };
        let svlen = match info_fields.get("SVLEN") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                SvmError::malformed_line(
                    path,
                    line_number,
                    format!("invalid SVLEN: '{raw}'"),
                )
            })?,
            None => return Ok(None),
        };
        (svtype, pos - 1, svlen.abs())
    } else {
        if !is_dna_string(ref_allele) || !is_dna_string(alt_allele) {
            return Ok(None);
        }
        // Allele-relative shape: the padding base precedes the event,
        // so the event starts at the 1-based anchor position itself.
        if ref_allele.len() > 1 && alt_allele.len() == 1 {
            (SvType::DELETION, pos, ref_allele.len() as i64 - 1)
        } else if ref_allele.len() == 1 && alt_allele.len() > 1 {
            (SvType::INSERTION, pos, alt_allele.len() as i64 - 1)
        } else {
            // Substitutions and mixed events are outside the DEL/INS
            // domain.
            return Ok(None);
        }
    };

    let mut record = CallRecord::new(
        fields[0],
        start0,
        start0 + svlen,
        svtype,
        source_id,
    );
    record.ref_allele = ref_allele.to_string();
    record.alt_allele = alt_allele.to_string();
    record.info = info.to_string();
    Ok(Some(record))
}

fn decode_trio_genotype(
    fields: &[&str],
    columns: TrioColumns,
    path: &Path,
    line_number: usize,
) -> Result<TrioGenotype> {
    let format = fields.get(VCF_FORMAT_COLUMN).ok_or_else(|| {
        SvmError::malformed_line(path, line_number, "trio mode requires a FORMAT column")
    })?;
    let gt_slot = format
        .split(':')
        .position(|key| key == "GT")
        .ok_or_else(|| {
            SvmError::malformed_line(path, line_number, "FORMAT column lacks a GT field")
        })?;

    let member = |column: usize| -> Zygosity {
        fields
            .get(column)
            .and_then(|sample| sample.split(':').nth(gt_slot))
            .map(Zygosity::from_gt)
            .unwrap_or(Zygosity::RefOrMissing)
    };

    Ok(TrioGenotype::new(
        member(columns.mother),
        member(columns.father),
        member(columns.child),
    ))
}
