//! Command dispatcher that routes parsed clap commands to their handlers.
//!
//! Every command loads both input files, runs the allocation, and renders
//! either a table or JSON. Any failure aborts the run before output, so no
//! partial results are ever printed.

use anyhow::{Context, Result};
use poolshare::allocation::{allocate, Allocation, DateWeights};
use poolshare::config::{Config, InputPaths};
use poolshare::importers::{parse_ledger_csv, parse_valuation_csv};
use poolshare::models::TransactionRecord;
use poolshare::reports::calculate_roi;
use poolshare::valuation::ValuationIndex;
use tracing::info;

use crate::cli::{formatters, Commands, InputArgs};

/// Route a parsed command to its handler
pub fn dispatch_command(command: Commands, config: &Config, json_output: bool) -> Result<()> {
    match command {
        Commands::Report { inputs } => dispatch_report(&resolve(config, &inputs), json_output),
        Commands::Weights { inputs } => dispatch_weights(&resolve(config, &inputs), json_output),
    }
}

fn resolve(config: &Config, inputs: &InputArgs) -> InputPaths {
    config.input_paths(inputs.transactions.as_deref(), inputs.valuations.as_deref())
}

fn load_inputs(paths: &InputPaths) -> Result<(Vec<TransactionRecord>, ValuationIndex)> {
    let transactions = parse_ledger_csv(&paths.transactions)?;
    let snapshots = parse_valuation_csv(&paths.valuations)?;
    let valuations = ValuationIndex::new(snapshots)
        .with_context(|| format!("No usable valuations in {:?}", paths.valuations))?;
    Ok((transactions, valuations))
}

fn run_allocation(paths: &InputPaths) -> Result<(Allocation, ValuationIndex)> {
    let (transactions, valuations) = load_inputs(paths)?;
    let allocation = allocate(&transactions, &valuations).context("Allocation run failed")?;
    Ok((allocation, valuations))
}

fn dispatch_report(paths: &InputPaths, json_output: bool) -> Result<()> {
    info!(
        "Calculating ROI from {:?} and {:?}",
        paths.transactions, paths.valuations
    );

    let (allocation, valuations) = run_allocation(paths)?;
    let report = calculate_roi(&allocation, &valuations).context("ROI calculation failed")?;

    if json_output {
        println!("{}", formatters::format_report_json(&report));
    } else if report.positions.is_empty() {
        print!("{}", formatters::format_empty_report());
    } else {
        print!("{}", formatters::format_report_table(&report));
    }
    Ok(())
}

fn dispatch_weights(paths: &InputPaths, json_output: bool) -> Result<()> {
    let (transactions, valuations) = load_inputs(paths)?;
    let weights = DateWeights::build(&transactions, &valuations)
        .context("Date weight assignment failed")?;

    if json_output {
        println!("{}", formatters::format_weights_json(&weights));
    } else if weights.is_empty() {
        print!("{}", formatters::format_empty_report());
    } else {
        print!("{}", formatters::format_weights_table(&weights));
    }
    Ok(())
}
