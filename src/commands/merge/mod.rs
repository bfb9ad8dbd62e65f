use crate::{
    cli::MergeArgs,
    core::{
        call::canonical_chrom,
        call_set::CallSet,
        cluster::{ClusterEngine, MatchMode},
        significance::{BreakpointHistogram, SignificanceScorer},
    },
    error::SvmError,
    io::{
        call_reader::load_call_file, chrom_lengths::load_chrom_lengths,
        vcf_writer::write_merged_records,
    },
    utils::util::{format_number_with_commas, Result},
};
use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufWriter},
    path::Path,
};

mod dump;

use dump::DumpWriter;


pub fn merge(args: MergeArgs) -> Result<()> {
    if args.files.len() < 2 && !args.force_single {
        return Err(crate::svm_error!(
            "Expected two or more call files to merge, got {}. Use --force-single to proceed anyway",
            args.files.len()
        ));
    }
    let tool_names = resolve_tool_names(&args)?;
    if args.merge_args.mode == MatchMode::Significant && args.chrom_lengths.is_none() {
        return Err(SvmError::MissingChromosomeLengths);
    }
    if let (Some(dump_path), Some(output)) = (&args.dump_path, &args.output) {
        if Path::new(output) == dump_path {
            return Err(crate::svm_error!(
                "The dump path and output path must be different: {}",
                dump_path.display()
            ));
        }
    }

    let mut sets = Vec::with_capacity(args.files.len());
    for (source_id, path) in args.files.iter().enumerate() {
        log::info!(
            "Reading {} as \"{}\" (priority {})",
            path.display(),
            tool_names[source_id],
            source_id
        );
        sets.push(load_call_file(path, source_id, args.trio)?);
    }

    if let Some(ref contigs) = args.contigs {
        let allowed: HashSet<String> = contigs.iter().map(|c| canonical_chrom(c)).collect();
        for set in &mut sets {
            set.retain_chromosomes(&allowed);
        }
    }

    if let Some(ref dump_path) = args.dump_path {
        let mut dump_writer = DumpWriter::from_path(dump_path)?;
        for (set, tool) in sets.iter().zip(&tool_names) {
            dump_writer.dump_call_set(set, tool)?;
        }
        log::debug!("Dumped all input calls to {}", dump_path.display());
    }

    let scorer = if args.merge_args.mode == MatchMode::Significant {
        let lengths_path = args
            .chrom_lengths
            .as_ref()
            .expect("checked before loading");
        let histogram = BreakpointHistogram::from_call_sets(&sets);
        Some(SignificanceScorer::new(
            histogram,
            load_chrom_lengths(lengths_path)?,
        ))
    } else {
        None
    };

    let total_calls: usize = sets.iter().map(CallSet::len).sum();
    let joined = CallSet::join(sets);
    let params = args.merge_args.cluster_params();
    let merged = ClusterEngine::new(&params, scorer.as_ref()).cluster_call_set(&joined);
    log::info!(
        "Clustered {} calls into {} merged records",
        format_number_with_commas(total_calls),
        format_number_with_commas(merged.len())
    );

    let written = match args.output {
        Some(ref path) => {
            let file = File::create(path).map_err(|error| {
                crate::svm_error!("Failed to create output file {path}: {error}")
            })?;
            write_merged_records(&mut BufWriter::new(file), &merged, &tool_names)?
        }
        None => write_merged_records(&mut io::stdout().lock(), &merged, &tool_names)?,
    };
    log::info!(
        "Wrote {} records after size filtering",
        format_number_with_commas(written)
    );
    Ok(())
}

fn resolve_tool_names(args: &MergeArgs) -> Result<Vec<String>> {
    match &args.tool_names {
        Some(names) => {
            if names.len() != args.files.len() {
                return Err(SvmError::ToolNameCountMismatch {
                    names: names.len(),
                    files: args.files.len(),
                });
            }
            Ok(names.clone())
        }
        None => Ok(args
            .files
            .iter()
            .map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
            .collect()),
    }
}
