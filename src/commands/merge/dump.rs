use crate::{core::call_set::CallSet, utils::util::Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const DUMP_HEADER: &str = "source_id\ttool\tchrom\tstart\tend\tsvtype\tsvlen\tgenotype\tinfo";

/// TSV audit trail of every loaded call, written before the size filter
/// so dropped records remain inspectable.
pub(crate) struct DumpWriter {
    writer: BufWriter<File>,
}

impl DumpWriter {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|error| {
            crate::svm_error!(
                "Failed to create dump file at {}: {}",
                path.display(),
                error
            )
        })?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{DUMP_HEADER}")
            .map_err(|error| crate::svm_error!("Failed to write dump header: {error}"))?;
        Ok(Self { writer })
    }

    pub(crate) fn dump_call_set(&mut self, set: &CallSet, tool: &str) -> Result<()> {
        for chrom in set.chromosomes() {
            for call in &set.by_chrom[chrom] {
                let genotype = call
                    .genotype
                    .map_or_else(|| ".".to_string(), |gt| gt.code());
                writeln!(
                    self.writer,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    call.source_id,
                    sanitize_tsv_field(tool),
                    call.chrom,
                    call.start,
                    call.end,
                    call.svtype,
                    call.svlen(),
                    genotype,
                    sanitize_tsv_field(&call.info),
                )
                .map_err(|error| crate::svm_error!("Failed to write dump row: {error}"))?;
            }
        }
        self.writer
            .flush()
            .map_err(|error| crate::svm_error!("Failed to flush dump rows: {error}"))?;
        Ok(())
    }
}

fn sanitize_tsv_field(input: &str) -> String {
    input
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
