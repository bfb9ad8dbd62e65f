use crate::core::{call::CallRecord, call_set::CallSet};
use std::collections::{BTreeMap, HashMap};

/// Per-source, per-chromosome counts of calls by event length.
///
/// Sparse on purpose: indel lengths span five orders of magnitude and a
/// dense table per chromosome would be almost entirely zeros.
#[derive(Debug)]
pub struct BreakpointHistogram {
    counts: Vec<HashMap<String, BTreeMap<i64, u64>>>,
}

impl BreakpointHistogram {
    /// Build histograms for every input set; `sets[i]` must hold the
    /// calls of source `i`.
    pub fn from_call_sets(sets: &[CallSet]) -> Self {
        let mut counts = Vec::with_capacity(sets.len());
        for set in sets {
            let mut per_chrom: HashMap<String, BTreeMap<i64, u64>> = HashMap::new();
            for (chrom, records) in &set.by_chrom {
                let lengths = per_chrom.entry(chrom.clone()).or_default();
                for record in records {
                    *lengths.entry(record.svlen()).or_insert(0) += 1;
                }
            }
            counts.push(per_chrom);
        }
        Self { counts }
    }

    /// Number of calls of source `source` on `chrom` with length in the
    /// inclusive range `[lo, hi]`.
    pub fn count_in_range(&self, source: usize, chrom: &str, lo: i64, hi: i64) -> u64 {
        self.counts
            .get(source)
            .and_then(|per_chrom| per_chrom.get(chrom))
            .map(|lengths| lengths.range(lo..=hi).map(|(_, count)| count).sum())
            .unwrap_or(0)
    }
}

/// Pairwise statistical matching predicate, usable as an alternative to
/// the distance/overlap predicates.
#[derive(Debug)]
pub struct SignificanceScorer {
    histogram: BreakpointHistogram,
    chrom_lengths: HashMap<String, i64>,
}

impl SignificanceScorer {
    pub fn new(histogram: BreakpointHistogram, chrom_lengths: HashMap<String, i64>) -> Self {
        Self {
            histogram,
            chrom_lengths,
        }
    }

    /// Probability-style score for a candidate pair: how likely two
    /// independent breakpoint sets of the observed length band would
    /// land this close by chance. Returns `None` when the chromosome
    /// length is unknown, which makes the pair ineligible.
    pub fn score(&self, chrom: &str, a: &CallRecord, b: &CallRecord) -> Option<f64> {
        let chrom_length = *self.chrom_lengths.get(chrom)?;
        let (lo, hi) = if a.svlen() <= b.svlen() {
            (a.svlen(), b.svlen())
        } else {
            (b.svlen(), a.svlen())
        };
        let k1 = self.histogram.count_in_range(a.source_id, chrom, lo, hi);
        let k2 = self.histogram.count_in_range(b.source_id, chrom, lo, hi);
        let dist = (a.centerpoint() - b.centerpoint()).abs();
        let exponent = -((k1 * k2) as f64 * (dist + 1.0)) / chrom_length as f64;
        Some(1.0 - exponent.exp())
    }
}
