// Orchestration of one extraction run: resolve the profile, read the
// input, scan, render CSV, optionally compare against a reference file.

use log::{info, warn};
use snafu::{prelude::*, Snafu};

use std::fs;

use results_extraction::{
    emit_table, run_line_scan, run_tree_scan, LogObserver, ScanOutcome,
};
use text_diff::print_diff;

use crate::args::Args;

pub mod io_csv;
pub mod io_lines;
pub mod io_tree;
pub mod profile_reader;

#[derive(Debug, Snafu)]
pub enum ExtractError {
    #[snafu(display("Error opening input file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV output"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("Error writing output file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown input type {input_type}, expected 'lines' or 'tree'"))]
    UnknownInputType { input_type: String },
    #[snafu(display("The scan failed: {source}"))]
    Scanning {
        source: results_extraction::ScanError,
    },
    #[snafu(display("The output differs from the reference file {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ExtractResult<T> = Result<T, ExtractError>;

pub fn run_extraction(args: &Args) -> ExtractResult<()> {
    let profile = profile_reader::resolve_profile(&args.profile)?;
    info!("using profile {:?}", profile.name);

    let mut observer = LogObserver;
    let input_type = args.input_type.as_deref().unwrap_or("lines");
    let outcome: ScanOutcome = match input_type {
        "lines" => {
            let lines = io_lines::read_lines(&args.input)?;
            run_line_scan(&lines, &args.county, &profile, &mut observer)
                .context(ScanningSnafu)?
        }
        "tree" => {
            let rows = io_tree::read_tree_rows(&args.input)?;
            run_tree_scan(&rows, &args.county, &profile, &mut observer)
                .context(ScanningSnafu)?
        }
        x => {
            return UnknownInputTypeSnafu { input_type: x }.fail();
        }
    };
    info!(
        "scan of {:?}: {} lines, {} records, {} unclassified, {} malformed",
        args.input,
        outcome.stats.lines_seen,
        outcome.records.len(),
        outcome.stats.unclassified,
        outcome.stats.malformed
    );

    let table = emit_table(outcome.records, &profile);
    let rendered = io_csv::render_csv(&table)?;

    match args.out.as_deref() {
        None | Some("stdout") | Some("") => {
            print!("{}", rendered);
        }
        Some(path) => {
            fs::write(path, &rendered).context(WritingOutputSnafu { path })?;
            info!("wrote {} rows to {:?}", table.rows.len(), path);
        }
    }

    if let Some(ref_path) = &args.reference {
        let reference = fs::read_to_string(ref_path).context(OpeningInputSnafu {
            path: ref_path.clone(),
        })?;
        if reference != rendered {
            warn!("Found differences with the reference file");
            print_diff(reference.as_str(), rendered.as_str(), "\n");
            return ReferenceMismatchSnafu {
                path: ref_path.clone(),
            }
            .fail();
        }
        info!("output matches the reference file {:?}", ref_path);
    }
    Ok(())
}
