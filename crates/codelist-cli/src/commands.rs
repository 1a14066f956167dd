use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, info_span};

use codelist_core::{
    MergedCodelists, ReconcileOptions, ReconcileReport, RemovalMatch, collect_codelists,
    merge_across_directories, reconcile,
};

use crate::cli::{ListArgs, SetClosedEnumsArgs};

pub fn run_set_closed_enums(args: &SetClosedEnumsArgs) -> Result<ReconcileReport> {
    let options = ReconcileOptions::new()
        .with_schema_file_names(args.schema_files.clone())
        .with_removal_match(removal_match(args.case_insensitive_removals))
        .with_dry_run(args.dry_run);

    let span = info_span!("set_closed_enums", directory_count = args.directories.len());
    let _guard = span.enter();
    let start = Instant::now();

    let report =
        reconcile(&args.directories, &options).context("set closed codelist enums")?;
    if report.is_clean() {
        debug!("every codelist on disk is used and consistent");
    } else {
        report.report();
    }

    info!(
        changed = report.changed.len(),
        unchanged = report.unchanged.len(),
        dry_run = report.dry_run,
        duration_ms = start.elapsed().as_millis(),
        "reconciliation complete"
    );
    Ok(report)
}

pub fn run_list(args: &ListArgs) -> Result<MergedCodelists> {
    let per_directory = args
        .directories
        .iter()
        .map(|directory| {
            collect_codelists(directory)
                .with_context(|| format!("collect codelists: {}", directory.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_across_directories(
        &per_directory,
        removal_match(args.case_insensitive_removals),
    )
    .context("resolve codelists")?;

    for name in &merged.conflicts {
        error!("conflicting codelists: {name}");
    }
    Ok(merged)
}

fn removal_match(case_insensitive: bool) -> RemovalMatch {
    if case_insensitive {
        RemovalMatch::CaseInsensitive
    } else {
        RemovalMatch::Exact
    }
}
