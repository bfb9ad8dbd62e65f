pub const DEFAULT_MERGE_OFFSET: i64 = 50;
pub const DEFAULT_MAX_LENDIFF: i64 = 20;
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.5;
pub const DEFAULT_SIG_LEVEL: f64 = 0.01;

/// Emission-time size bounds: records whose event length falls outside
/// this range are kept in the dump but never written to the merged output.
pub const MIN_OUTPUT_SV_LEN: i64 = 20;
pub const MAX_OUTPUT_SV_LEN: i64 = 50_000;
