use crate::{
    constants::{MAX_OUTPUT_SV_LEN, MIN_OUTPUT_SV_LEN},
    core::{cluster::MergedRecord, svtype::SvType},
    utils::util::{round_to_i64, Result},
};
use std::cmp::Ordering;
use std::io::Write;

pub const OUTPUT_HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";

/// Emission-time size filter. Deletions are measured by reference span;
/// insertions by the literal ALT allele when present, otherwise by the
/// projected event length.
pub fn passes_size_filter(record: &MergedRecord) -> bool {
    let len = match record.svtype {
        SvType::DELETION => record.end - record.start,
        SvType::INSERTION => {
            if record.alt_allele != "." {
                record.alt_allele.len() as i64
            } else {
                record.end - record.start
            }
        }
    };
    (MIN_OUTPUT_SV_LEN..=MAX_OUTPUT_SV_LEN).contains(&len)
}

/// Sort key for output rows: chromosome with the `chr` prefix stripped
/// (all-digit names compare numerically, ahead of the rest), then start.
fn compare_chroms(a: &str, b: &str) -> Ordering {
    let strip = |chrom: &str| -> String {
        chrom
            .strip_prefix("chr")
            .unwrap_or(chrom)
            .to_string()
    };
    let (a, b) = (strip(a), strip(b));
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(&b),
    }
}

fn format_info(record: &MergedRecord, tool_names: &[String]) -> String {
    let tools = record
        .sources
        .iter()
        .map(|&source| tool_names[source].as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "SVTYPE={};TOOLS={};MAXDIST={};MAXLENDIFF={};END={}",
        record.svtype,
        tools,
        round_to_i64(record.max_dist),
        record.max_lendiff,
        record.end
    )
}

/// Writes the merged call set: header, then one row per record that
/// survives the size filter, sorted by chromosome and start.
pub fn write_merged_records<W: Write>(
    writer: &mut W,
    records: &[MergedRecord],
    tool_names: &[String],
) -> Result<usize> {
    writeln!(writer, "{OUTPUT_HEADER}")?;

    let mut rows: Vec<&MergedRecord> = records.iter().filter(|r| passes_size_filter(r)).collect();
    rows.sort_by(|a, b| compare_chroms(&a.chrom, &b.chrom).then(a.start.cmp(&b.start)));

    for record in &rows {
        writeln!(
            writer,
            "{}\t{}\t.\t{}\t{}\t.\tPASS\t{}",
            record.chrom,
            record.start + 1,
            record.ref_allele,
            record.alt_allele,
            format_info(record, tool_names)
        )?;
    }
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(chrom: &str, start: i64, end: i64, sources: Vec<usize>) -> MergedRecord {
        MergedRecord {
            chrom: chrom.to_string(),
            start,
            end,
            svtype: SvType::DELETION,
            ref_allele: ".".to_string(),
            alt_allele: ".".to_string(),
            genotype: None,
            info: String::new(),
            max_dist: 0.0,
            max_lendiff: 0,
            sources,
            call_list: String::new(),
        }
    }

    fn tool_names() -> Vec<String> {
        vec!["caller_a".to_string(), "caller_b".to_string()]
    }

    #[test]
    fn test_row_format() {
        let mut record = merged("chr1", 99, 200, vec![0, 1]);
        record.max_dist = 1.0;
        record.max_lendiff = 10;
        let mut out = Vec::new();
        let written = write_merged_records(&mut out, &[record], &tool_names()).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), OUTPUT_HEADER);
        assert_eq!(
            lines.next().unwrap(),
            "chr1\t100\t.\t.\t.\t.\tPASS\tSVTYPE=DEL;TOOLS=caller_a,caller_b;MAXDIST=1;MAXLENDIFF=10;END=200"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_size_filter_bounds() {
        let records = vec![
            merged("chr1", 100, 115, vec![0]),    // 15bp: below floor
            merged("chr1", 200, 220, vec![0]),    // 20bp: kept
            merged("chr1", 300, 50_300, vec![0]), // 50kb: kept
            merged("chr1", 400, 50_421, vec![0]), // 50,021bp: above ceiling
        ];
        let mut out = Vec::new();
        let written = write_merged_records(&mut out, &records, &tool_names()).unwrap();
        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("\t101\t"));
        assert!(text.contains("\t201\t"));
        assert!(text.contains("\t301\t"));
        assert!(!text.contains("\t401\t"));
    }

    #[test]
    fn test_insertion_filter_uses_alt_length() {
        let mut short_ins = merged("chr1", 100, 130, vec![0]);
        short_ins.svtype = SvType::INSERTION;
        short_ins.alt_allele = "A".repeat(10); // |ALT| = 10: dropped
        let mut long_ins = merged("chr1", 200, 230, vec![0]);
        long_ins.svtype = SvType::INSERTION;
        long_ins.alt_allele = "A".repeat(30);

        let mut out = Vec::new();
        let written =
            write_merged_records(&mut out, &[short_ins, long_ins], &tool_names()).unwrap();
        assert_eq!(written, 1);
        assert!(String::from_utf8(out).unwrap().contains("\t201\t"));
    }

    #[test]
    fn test_rows_sorted_by_chromosome_then_start() {
        let records = vec![
            merged("chr10", 50, 100, vec![0]),
            merged("chr2", 500, 600, vec![0]),
            merged("chrx", 10, 80, vec![0]),
            merged("chr2", 100, 200, vec![0]),
        ];
        let mut out = Vec::new();
        write_merged_records(&mut out, &records, &tool_names()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let chroms: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| line.split('\t').next().unwrap())
            .collect();
        assert_eq!(chroms, vec!["chr2", "chr2", "chr10", "chrx"]);
        let starts: Vec<&str> = text
            .lines()
            .skip(1)
            .take(2)
            .map(|line| line.split('\t').nth(1).unwrap())
            .collect();
        assert_eq!(starts, vec!["101", "501"]);
    }
}
