use crate::{
    constants::*,
    core::cluster::{ClusterParams, MatchMode},
    utils::util::Result,
};
use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser, Debug)]
#[command(name="svmerge",
          version=&**FULL_VERSION,
          about="Reconciles structural variant calls from multiple callers",
          long_about = None,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Merge(MergeArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Merge(_) => "merge",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct MergeArgs {
    /// Call files to merge; order determines provenance priority
    #[arg(
        value_name = "FILES",
        num_args = 1..,
        required = true,
        value_parser = check_file_exists
    )]
    pub files: Vec<PathBuf>,

    /// Write output to a file [default: standard output]
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: Option<String>,

    /// Write an unfiltered TSV dump of all input calls to a file
    #[arg(
        long = "dump",
        value_name = "FILE",
        help_heading = "Advanced"
    )]
    pub dump_path: Option<PathBuf>,

    /// Comma-separated tool names used in output attribution; must match
    /// the number of call files [default: file names]
    #[arg(
        short = 'N',
        long = "tool-names",
        value_name = "NAMES",
        value_delimiter = ','
    )]
    pub tool_names: Option<Vec<String>>,

    /// Process only the specified chromosomes (comma-separated list), e.g., (chr1,chr2,chrX)
    #[arg(
        short = 'c',
        long = "contig",
        value_name = "CONTIG",
        value_delimiter = ','
    )]
    pub contigs: Option<Vec<String>>,

    /// File with chromosome lengths, needed when running in significant mode
    #[arg(
        short = 'C',
        long = "chrom-lengths",
        value_name = "FILE",
        value_parser = check_file_exists
    )]
    pub chrom_lengths: Option<PathBuf>,

    /// Expect trio call files with mother/father/child genotype columns
    #[arg(long = "trio")]
    pub trio: bool,

    /// Run even if there is only one file on input
    #[arg(long = "force-single", help_heading = "Advanced")]
    pub force_single: bool,

    #[command(flatten)]
    pub merge_args: MergeArgsInner,
}

#[derive(Parser, Debug, Clone)]
pub struct MergeArgsInner {
    /// Matching mode: fixed_distance, overlap or significant
    #[arg(
        short = 'm',
        long = "mode",
        value_name = "MODE",
        default_value_t = MatchMode::FixedDistance,
        value_parser = parse_match_mode
    )]
    pub mode: MatchMode,

    /// Maximum distance between centerpoints for merging calls
    #[arg(
        long,
        value_name = "INT",
        default_value_t = DEFAULT_MERGE_OFFSET,
        value_parser = offset_in_range
    )]
    pub offset: i64,

    /// Maximum difference in length for merging calls
    #[arg(
        long = "max-lendiff",
        value_name = "INT",
        default_value_t = DEFAULT_MAX_LENDIFF,
        value_parser = offset_in_range
    )]
    pub max_lendiff: i64,

    /// The minimum overlap fraction of the longer call in overlap mode
    #[arg(
        long = "overlap-ratio",
        value_name = "FLOAT",
        default_value_t = DEFAULT_OVERLAP_RATIO,
        help_heading = "Advanced"
    )]
    pub overlap_ratio: f64,

    /// Significance threshold for mode "significant"; has no effect in other modes
    #[arg(
        short = 'p',
        long = "siglevel",
        value_name = "FLOAT",
        default_value_t = DEFAULT_SIG_LEVEL,
        value_parser = siglevel_in_range
    )]
    pub sig_level: f64,
}

impl MergeArgsInner {
    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            mode: self.mode,
            offset: self.offset,
            max_lendiff: self.max_lendiff,
            overlap_ratio: self.overlap_ratio,
            sig_level: self.sig_level,
        }
    }
}

impl Default for MergeArgsInner {
    fn default() -> Self {
        Self {
            mode: MatchMode::FixedDistance,
            offset: DEFAULT_MERGE_OFFSET,
            max_lendiff: DEFAULT_MAX_LENDIFF,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            sig_level: DEFAULT_SIG_LEVEL,
        }
    }
}

/// Initializes the verbosity level for logging based on the command-line arguments.
pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn parse_match_mode(s: &str) -> Result<MatchMode> {
    s.parse()
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(anyhow!("File does not exist: {}", path.display()).into());
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(anyhow!("Path does not exist: {}", parent_dir.display()).into());
        }
    }
    Ok(s.to_string())
}

fn offset_in_range(s: &str) -> Result<i64> {
    let value: i64 = s
        .parse::<i64>()
        .map_err(|_| anyhow!("`{}` is not a valid distance", s))?;
    if value < 0 {
        return Err(anyhow!("Distance thresholds must be >= 0").into());
    }
    Ok(value)
}

fn siglevel_in_range(s: &str) -> Result<f64> {
    let level: f64 = s
        .parse::<f64>()
        .map_err(|_| anyhow!("`{}` is not a valid significance level", s))?;
    if !(0.0..1.0).contains(&level) || level == 0.0 {
        return Err(anyhow!("Significance level must be in (0, 1)").into());
    }
    Ok(level)
}
