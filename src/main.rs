mod args;
mod batch;
mod constants;
mod export;
mod input;
mod logging;
mod normalize;
mod pacing;
mod registry;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressDrawTarget, ProgressStyle};
use std::{path::PathBuf, time::Duration};

use args::Args;
use batch::{ResultTable, run};
use constants::{DEFAULT_OUTPUT_FILE_NAME, NPPES_API_DOC_URL};
use export::{OutputFormat, partial_output_path, write_output};
use input::{list_sheets, load_identifiers};
use pacing::Pacer;
use registry::RegistryClient;

#[tokio::main]
async fn main() -> Result<()> {
    let progress = logging::init();

    let args = Args::parse();

    if args.list_sheets {
        for name in list_sheets(&args.input)? {
            println!("{name}");
        }
        return Ok(());
    }

    let output_path = args.output.clone().unwrap_or_else(|| default_output_path(&args));
    // Reject a bad output extension before spending time on lookups.
    OutputFormat::from_path(&output_path)?;

    let identifiers = load_identifiers(
        &args.input,
        &args.sheet_selector(),
        &args.column_selector(),
    )
    .context("Failed reading input file")?;
    tracing::info!(
        count = identifiers.len(),
        input = %args.input.display(),
        "found unique NPIs to process"
    );

    let registry = RegistryClient::new(
        &args.api_base_url,
        &args.api_version,
        Duration::from_secs(args.timeout_secs),
    )?;
    let mut pacer = Pacer::new(Duration::from_millis(args.delay_ms));
    tracing::info!(
        api = args.api_base_url.as_str(),
        docs = NPPES_API_DOC_URL,
        delay_ms = pacer.min_interval().as_millis() as u64,
        "starting lookups"
    );

    progress.set_length(identifiers.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [NPI {elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        progress.set_style(style.progress_chars("=> "));
    }
    progress.set_draw_target(ProgressDrawTarget::stderr());

    let mut table = ResultTable::default();
    let batch = run(
        &identifiers,
        &registry,
        &mut pacer,
        &mut table,
        |current, _total, npi| {
            progress.set_position(current as u64);
            progress.set_message(npi.to_string());
        },
    );

    let interrupted = tokio::select! {
        _ = batch => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        progress.abandon_with_message("interrupted");
        let partial_path = partial_output_path(&output_path);
        write_output(&table, &partial_path)?;
        bail!(
            "Interrupted after {} of {} NPIs; partial results written to {}",
            table.tally.total(),
            identifiers.len(),
            partial_path.display()
        );
    }

    let tally = table.tally;
    progress.finish_with_message(format!(
        "done: found={} not_found={} invalid={}",
        tally.found, tally.not_found, tally.invalid
    ));

    write_output(&table, &output_path)?;
    println!(
        "Wrote {} rows for {} NPIs to {}",
        table.rows.len(),
        tally.total(),
        output_path.display()
    );
    Ok(())
}

fn default_output_path(args: &Args) -> PathBuf {
    args.input.with_file_name(DEFAULT_OUTPUT_FILE_NAME)
}
