use crate::core::call::CallRecord;
use std::collections::{HashMap, HashSet};

/// Per-chromosome collections of call records.
///
/// Each chromosome's list is kept ordered by `(start, end)` ascending;
/// the clustering engine depends on that ordering, so every mutation
/// that can disturb it re-sorts.
#[derive(Debug, Default)]
pub struct CallSet {
    pub by_chrom: HashMap<String, Vec<CallRecord>>,
}

impl CallSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CallRecord) {
        self.by_chrom
            .entry(record.chrom.clone())
            .or_default()
            .push(record);
    }

    pub fn sort(&mut self) {
        for records in self.by_chrom.values_mut() {
            records.sort_by_key(|r| (r.start, r.end));
        }
    }

    /// Union of several call sets: concatenates per-chromosome lists,
    /// preserving each record's provenance, then restores the
    /// `(start, end)` ordering.
    pub fn join(sets: Vec<CallSet>) -> CallSet {
        let mut joined = CallSet::new();
        for set in sets {
            for (chrom, records) in set.by_chrom {
                joined.by_chrom.entry(chrom).or_default().extend(records);
            }
        }
        joined.sort();
        joined
    }

    /// Chromosomes in deterministic (sorted) order.
    pub fn chromosomes(&self) -> Vec<&String> {
        let mut chroms: Vec<&String> = self.by_chrom.keys().collect();
        chroms.sort();
        chroms
    }

    pub fn retain_chromosomes(&mut self, allowed: &HashSet<String>) {
        self.by_chrom.retain(|chrom, _| allowed.contains(chrom));
    }

    pub fn len(&self) -> usize {
        self.by_chrom.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::svtype::SvType;

    fn record(chrom: &str, start: i64, end: i64, source_id: usize) -> CallRecord {
        CallRecord::new(chrom, start, end, SvType::DELETION, source_id)
    }

    #[test]
    fn test_join_concatenates_and_sorts() {
        let mut a = CallSet::new();
        a.push(record("chr1", 500, 600, 0));
        a.push(record("chr1", 100, 300, 0));
        let mut b = CallSet::new();
        b.push(record("chr1", 100, 200, 1));
        b.push(record("chr2", 50, 80, 1));

        let joined = CallSet::join(vec![a, b]);
        assert_eq!(joined.len(), 4);

        let chr1 = &joined.by_chrom["chr1"];
        let spans: Vec<(i64, i64)> = chr1.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(100, 200), (100, 300), (500, 600)]);
        // Provenance survives the union.
        assert_eq!(chr1[0].source_id, 1);
        assert_eq!(chr1[1].source_id, 0);
    }

    #[test]
    fn test_retain_chromosomes() {
        let mut set = CallSet::new();
        set.push(record("chr1", 1, 30, 0));
        set.push(record("chr2", 1, 30, 0));
        let allowed: HashSet<String> = ["chr2".to_string()].into_iter().collect();
        set.retain_chromosomes(&allowed);
        assert_eq!(set.chromosomes(), vec!["chr2"]);
        assert_eq!(set.len(), 1);
    }
}
