pub mod cli;
pub mod commands;
pub mod error;

pub mod core {
    pub mod call;
    pub mod call_set;
    pub mod cluster;
    pub mod significance;
    pub mod svtype;
}

pub mod io {
    pub mod call_reader;
    pub mod chrom_lengths;
    pub mod readers;
    pub mod vcf_writer;
}

pub mod utils {
    pub mod util;
}

pub mod constants;

pub use constants::*;
