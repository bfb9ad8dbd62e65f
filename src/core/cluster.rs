use crate::core::{
    call::{CallRecord, TrioGenotype},
    call_set::CallSet,
    significance::SignificanceScorer,
    svtype::SvType,
};
use crate::error::SvmError;
use crate::utils::util::Result;
use std::collections::HashSet;
use std::fmt;

/// Matching predicate used to decide whether two calls describe the
/// same underlying event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    FixedDistance,
    Overlap,
    Significant,
}

impl std::str::FromStr for MatchMode {
    type Err = SvmError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed_distance" => Ok(MatchMode::FixedDistance),
            "overlap" => Ok(MatchMode::Overlap),
            "significant" => Ok(MatchMode::Significant),
            _ => Err(SvmError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::FixedDistance => write!(f, "fixed_distance"),
            MatchMode::Overlap => write!(f, "overlap"),
            MatchMode::Significant => write!(f, "significant"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub mode: MatchMode,
    pub offset: i64,
    pub max_lendiff: i64,
    pub overlap_ratio: f64,
    pub sig_level: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            mode: MatchMode::FixedDistance,
            offset: crate::constants::DEFAULT_MERGE_OFFSET,
            max_lendiff: crate::constants::DEFAULT_MAX_LENDIFF,
            overlap_ratio: crate::constants::DEFAULT_OVERLAP_RATIO,
            sig_level: crate::constants::DEFAULT_SIG_LEVEL,
        }
    }
}

/// One consolidated call emitted for a finalized clique.
///
/// Representative fields come from the member with the smallest source
/// index; `max_dist`/`max_lendiff` are the exact maxima over all member
/// pairs; `call_list` is the `start:end:source` audit trail.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub svtype: SvType,
    pub ref_allele: String,
    pub alt_allele: String,
    pub genotype: Option<TrioGenotype>,
    pub info: String,
    pub max_dist: f64,
    pub max_lendiff: i64,
    pub sources: Vec<usize>,
    pub call_list: String,
}

/// An open cluster of arena indices into the chromosome's record slice,
/// plus the coordinate that decides when it falls out of the sweep
/// window (max member end in overlap mode, max member centerpoint
/// otherwise). Distance/length accumulators are folded in as members
/// arrive so finalization is O(1).
struct Clique {
    members: Vec<usize>,
    critical: f64,
    max_dist: f64,
    max_lendiff: i64,
}

/// Sweep-line clique clustering over one joined, sorted call set.
pub struct ClusterEngine<'a> {
    params: &'a ClusterParams,
    scorer: Option<&'a SignificanceScorer>,
}

impl<'a> ClusterEngine<'a> {
    pub fn new(params: &'a ClusterParams, scorer: Option<&'a SignificanceScorer>) -> Self {
        Self { params, scorer }
    }

    /// Cluster every chromosome of `set` (in sorted chromosome order)
    /// and return the merged records in finalization order. Finalization
    /// order is close to coordinate order but not strictly monotonic
    /// (split cliques finalize out of insertion order); the writer sorts
    /// before emission.
    pub fn cluster_call_set(&self, set: &CallSet) -> Vec<MergedRecord> {
        let mut merged = Vec::new();
        for chrom in set.chromosomes() {
            let records = &set.by_chrom[chrom];
            merged.extend(self.cluster_chromosome(chrom, records));
        }
        merged
    }

    /// One left-to-right sweep over a single chromosome's records,
    /// which must be sorted by `(start, end)` ascending.
    pub fn cluster_chromosome(&self, chrom: &str, records: &[CallRecord]) -> Vec<MergedRecord> {
        debug_assert!(records.windows(2).all(|w| w[0].start <= w[1].start));

        let mut merged = Vec::new();
        let mut active: Vec<usize> = Vec::new();
        let mut cliques: Vec<Clique> = Vec::new();

        for (idx, incoming) in records.iter().enumerate() {
            // Drop active records that can no longer match anything at
            // or beyond the incoming start.
            active.retain(|&a| !self.record_expired(&records[a], incoming));

            let neighborhood: HashSet<usize> = active
                .iter()
                .copied()
                .filter(|&a| self.matches(chrom, &records[a], incoming))
                .collect();

            active.push(idx);

            let mut matched = false;
            let mut split_born: Vec<Clique> = Vec::new();
            let mut kept: Vec<Clique> = Vec::with_capacity(cliques.len());
            for mut clique in cliques.drain(..) {
                if self.clique_expired(&clique, incoming) {
                    merged.push(self.finalize(records, &clique));
                    continue;
                }
                if clique.members.iter().all(|m| neighborhood.contains(m)) {
                    self.absorb(records, &mut clique, idx);
                    matched = true;
                    log::trace!(
                        "Absorbed {} into clique of {} members",
                        incoming,
                        clique.members.len()
                    );
                } else {
                    let intersection: Vec<usize> = clique
                        .members
                        .iter()
                        .copied()
                        .filter(|m| neighborhood.contains(m))
                        .collect();
                    if !intersection.is_empty() {
                        log::trace!(
                            "Split clique of {} members on {} shared neighbors at {}",
                            clique.members.len(),
                            intersection.len(),
                            incoming
                        );
                        split_born.push(self.spawn(records, intersection, idx));
                        matched = true;
                    }
                }
                kept.push(clique);
            }
            // Split-born cliques join the walk order only from the next
            // record on; the incoming record must not be tested against
            // a clique it just created.
            kept.extend(split_born);
            cliques = kept;

            if !matched {
                cliques.push(self.spawn(records, Vec::new(), idx));
            }
        }

        for clique in &cliques {
            merged.push(self.finalize(records, clique));
        }
        merged
    }

    /// Coordinate used for window pruning: end in overlap mode,
    /// centerpoint otherwise.
    fn landmark(&self, record: &CallRecord) -> f64 {
        match self.params.mode {
            MatchMode::Overlap => record.end as f64,
            MatchMode::FixedDistance | MatchMode::Significant => record.centerpoint(),
        }
    }

    fn record_expired(&self, candidate: &CallRecord, incoming: &CallRecord) -> bool {
        match self.params.mode {
            MatchMode::Overlap => candidate.end < incoming.start,
            MatchMode::FixedDistance | MatchMode::Significant => {
                candidate.centerpoint() < incoming.centerpoint() - self.params.offset as f64
            }
        }
    }

    fn clique_expired(&self, clique: &Clique, incoming: &CallRecord) -> bool {
        match self.params.mode {
            MatchMode::Overlap => clique.critical < incoming.start as f64,
            MatchMode::FixedDistance | MatchMode::Significant => {
                clique.critical < incoming.centerpoint() - self.params.offset as f64
            }
        }
    }

    fn matches(&self, chrom: &str, candidate: &CallRecord, incoming: &CallRecord) -> bool {
        // A deletion and an insertion are never the same event.
        if candidate.svtype != incoming.svtype {
            return false;
        }
        match self.params.mode {
            MatchMode::FixedDistance => {
                (candidate.centerpoint() - incoming.centerpoint()).abs()
                    <= self.params.offset as f64
                    && (candidate.svlen() - incoming.svlen()).abs() <= self.params.max_lendiff
            }
            MatchMode::Overlap => {
                let overlap = (candidate.end.min(incoming.end)
                    - candidate.start.max(incoming.start))
                .max(0);
                let longer = candidate.svlen().max(incoming.svlen());
                overlap as f64 >= self.params.overlap_ratio * longer as f64
            }
            MatchMode::Significant => match self
                .scorer
                .and_then(|scorer| scorer.score(chrom, candidate, incoming))
            {
                Some(score) => score >= self.params.sig_level,
                None => false,
            },
        }
    }

    /// Pairwise distance feeding the `max_dist` accumulator:
    /// centerpoint distance in fixed-distance/significant mode, worst of
    /// the start/end extremes in overlap mode.
    fn pair_dist(&self, a: &CallRecord, b: &CallRecord) -> f64 {
        match self.params.mode {
            MatchMode::Overlap => {
                let start_dist = (a.start - b.start).abs();
                let end_dist = (a.end - b.end).abs();
                start_dist.max(end_dist) as f64
            }
            MatchMode::FixedDistance | MatchMode::Significant => {
                (a.centerpoint() - b.centerpoint()).abs()
            }
        }
    }

    fn absorb(&self, records: &[CallRecord], clique: &mut Clique, idx: usize) {
        let incoming = &records[idx];
        for &member in &clique.members {
            let present = &records[member];
            clique.max_dist = clique.max_dist.max(self.pair_dist(present, incoming));
            clique.max_lendiff = clique
                .max_lendiff
                .max((present.svlen() - incoming.svlen()).abs());
        }
        clique.members.push(idx);
        clique.critical = clique.critical.max(self.landmark(incoming));
    }

    fn spawn(&self, records: &[CallRecord], base_members: Vec<usize>, idx: usize) -> Clique {
        let mut clique = Clique {
            members: Vec::with_capacity(base_members.len() + 1),
            critical: f64::NEG_INFINITY,
            max_dist: 0.0,
            max_lendiff: 0,
        };
        for member in base_members {
            self.absorb(records, &mut clique, member);
        }
        self.absorb(records, &mut clique, idx);
        clique
    }

    fn finalize(&self, records: &[CallRecord], clique: &Clique) -> MergedRecord {
        let representative = clique
            .members
            .iter()
            .map(|&m| &records[m])
            .min_by_key(|r| r.source_id)
            .expect("cliques are never empty");

        let mut sources: Vec<usize> = clique
            .members
            .iter()
            .map(|&m| records[m].source_id)
            .collect();
        sources.sort_unstable();
        sources.dedup();

        let call_list = clique
            .members
            .iter()
            .map(|&m| {
                let r = &records[m];
                format!("{}:{}:{}", r.start, r.end, r.source_id)
            })
            .collect::<Vec<_>>()
            .join(",");

        MergedRecord {
            chrom: representative.chrom.clone(),
            start: representative.start,
            end: representative.end,
            svtype: representative.svtype,
            ref_allele: representative.ref_allele.clone(),
            alt_allele: representative.alt_allele.clone(),
            genotype: representative.genotype,
            info: representative.info.clone(),
            max_dist: clique.max_dist,
            max_lendiff: clique.max_lendiff,
            sources,
            call_list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chrom: &str, start: i64, end: i64, source_id: usize) -> CallRecord {
        CallRecord::new(chrom, start, end, SvType::DELETION, source_id)
    }

    fn fixed_params(offset: i64, max_lendiff: i64) -> ClusterParams {
        ClusterParams {
            mode: MatchMode::FixedDistance,
            offset,
            max_lendiff,
            ..ClusterParams::default()
        }
    }

    fn cluster(records: Vec<CallRecord>, params: &ClusterParams) -> Vec<MergedRecord> {
        let mut set = CallSet::new();
        for r in records {
            set.push(r);
        }
        set.sort();
        ClusterEngine::new(params, None).cluster_call_set(&set)
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "fixed_distance".parse::<MatchMode>().unwrap(),
            MatchMode::FixedDistance
        );
        assert_eq!("overlap".parse::<MatchMode>().unwrap(), MatchMode::Overlap);
        assert_eq!(
            "significant".parse::<MatchMode>().unwrap(),
            MatchMode::Significant
        );
        assert!(matches!(
            "nearest".parse::<MatchMode>(),
            Err(SvmError::UnknownMode { .. })
        ));
    }

    #[test]
    fn test_two_tools_one_event() {
        let merged = cluster(
            vec![record("chr1", 99, 200, 0), record("chr1", 105, 196, 1)],
            &fixed_params(50, 20),
        );
        assert_eq!(merged.len(), 1);
        let m = &merged[0];
        assert_eq!(m.start, 99);
        assert_eq!(m.end, 200);
        assert_eq!(m.sources, vec![0, 1]);
        assert_eq!(m.max_dist, 1.0);
        assert_eq!(m.max_lendiff, 10);
        assert_eq!(m.call_list, "99:200:0,105:196:1");
    }

    #[test]
    fn test_self_merge_is_identity() {
        // offset 0 / lendiff 0 against a single source: every record
        // keeps its own clique.
        let records = vec![
            record("chr1", 100, 200, 0),
            record("chr1", 150, 260, 0),
            record("chr1", 300, 400, 0),
        ];
        let merged = cluster(records, &fixed_params(0, 0));
        assert_eq!(merged.len(), 3);
        for m in &merged {
            assert_eq!(m.sources.len(), 1);
        }
        // No record is shared between outputs.
        let mut seen = HashSet::new();
        for m in &merged {
            for entry in m.call_list.split(',') {
                assert!(seen.insert(entry.to_string()));
            }
        }
    }

    #[test]
    fn test_earliest_tool_wins_representative() {
        // The lower source index supplies the representative fields even
        // when its record enters the sweep second.
        let merged = cluster(
            vec![record("chr1", 98, 200, 1), record("chr1", 100, 201, 0)],
            &fixed_params(50, 20),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 100);
        assert_eq!(merged[0].end, 201);
        assert_eq!(merged[0].sources, vec![0, 1]);
    }

    #[test]
    fn test_max_dist_is_exact_over_all_pairs() {
        let merged = cluster(
            vec![
                record("chr1", 100, 200, 0), // center 150, len 100
                record("chr1", 104, 196, 1), // center 150, len 92
                record("chr1", 130, 240, 2), // center 185, len 110
            ],
            &fixed_params(50, 20),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].max_dist, 35.0);
        assert_eq!(merged[0].max_lendiff, 18);
    }

    #[test]
    fn test_different_chromosomes_never_merge() {
        let merged = cluster(
            vec![record("chr1", 100, 200, 0), record("chr2", 100, 200, 1)],
            &fixed_params(50, 20),
        );
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| m.sources.len() == 1));
    }

    #[test]
    fn test_types_never_mix() {
        let deletion = record("chr1", 100, 200, 0);
        let mut insertion = record("chr1", 100, 200, 1);
        insertion.svtype = SvType::INSERTION;
        let merged = cluster(vec![deletion, insertion], &fixed_params(50, 20));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_length_tolerance_blocks_merge() {
        let merged = cluster(
            vec![record("chr1", 100, 200, 0), record("chr1", 90, 240, 1)],
            &fixed_params(50, 20),
        );
        // Centers are 15 apart but lengths differ by 50.
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_split_keeps_original_clique() {
        // A and B form a clique; C matches only B, so B is split into a
        // second clique while {A, B} survives untouched.
        let merged = cluster(
            vec![
                record("chr1", 100, 200, 0), // center 150
                record("chr1", 110, 210, 1), // center 160
                record("chr1", 120, 210, 2), // center 165, len 90
            ],
            &fixed_params(10, 20),
        );
        assert_eq!(merged.len(), 2);
        let mut source_sets: Vec<Vec<usize>> = merged.iter().map(|m| m.sources.clone()).collect();
        source_sets.sort();
        assert_eq!(source_sets, vec![vec![0, 1], vec![1, 2]]);
    }

    #[test]
    fn test_overlap_mode_ratio() {
        let params = ClusterParams {
            mode: MatchMode::Overlap,
            overlap_ratio: 0.5,
            ..ClusterParams::default()
        };
        // 50bp overlap against a 100bp longer call: exactly at the ratio.
        let merged = cluster(
            vec![record("chr1", 100, 200, 0), record("chr1", 150, 250, 1)],
            &params,
        );
        assert_eq!(merged.len(), 1);
        // Overlap-mode distance tracks the worst start/end displacement.
        assert_eq!(merged[0].max_dist, 50.0);

        // 40bp overlap misses the 0.5 ratio.
        let merged = cluster(
            vec![record("chr1", 100, 200, 0), record("chr1", 160, 260, 1)],
            &params,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_emitted_starts_non_decreasing_after_sort() {
        let mut records = Vec::new();
        for i in 0..20 {
            let start = i * 500;
            records.push(record("chr1", start, start + 120, (i % 3) as usize));
        }
        let mut merged = cluster(records, &fixed_params(50, 20));
        merged.sort_by_key(|m| m.start);
        assert!(merged.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_significant_mode_uses_scorer() {
        use crate::core::significance::BreakpointHistogram;
        use std::collections::HashMap;

        let mut set0 = CallSet::new();
        set0.push(record("chr1", 100, 200, 0));
        set0.sort();
        let mut set1 = CallSet::new();
        set1.push(record("chr1", 104, 206, 1));
        set1.sort();

        let histogram = BreakpointHistogram::from_call_sets(&[set0, set1]);
        let chrom_lengths: HashMap<String, i64> =
            [("chr1".to_string(), 1_000_000)].into_iter().collect();
        let scorer = SignificanceScorer::new(histogram, chrom_lengths);

        let params = ClusterParams {
            mode: MatchMode::Significant,
            // Score for this pair is ~6e-6; a permissive threshold
            // accepts it, the default 0.01 rejects it.
            sig_level: 1e-7,
            ..ClusterParams::default()
        };
        let mut joined = CallSet::new();
        joined.push(record("chr1", 100, 200, 0));
        joined.push(record("chr1", 104, 206, 1));
        joined.sort();

        let merged = ClusterEngine::new(&params, Some(&scorer)).cluster_call_set(&joined);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].sources, vec![0, 1]);

        let strict = ClusterParams {
            mode: MatchMode::Significant,
            sig_level: 0.01,
            ..ClusterParams::default()
        };
        let merged = ClusterEngine::new(&strict, Some(&scorer)).cluster_call_set(&joined);
        assert_eq!(merged.len(), 2);
    }
}
