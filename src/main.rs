use clap::Parser;
use color_eyre::eyre::{Report, Result};
use ccsp::{cli::Command, Cli};

fn main() -> Result<(), Report> {
    // ------------------------------------------------------------------------
    // CLI Setup

    // Parse CLI parameters
    let args = Cli::parse();

    // initialize color_eyre crate for colorized logs
    color_eyre::install()?;

    // Set logging/verbosity level via RUST_LOG
    std::env::set_var("RUST_LOG", args.verbosity.to_string());

    // initialize env_logger crate for logging/verbosity level
    env_logger::init();

    // check which CLI command we're running (combine, extract, plot)
    match args.command {
        Command::CombineBatches(args) => _ = ccsp::combine::combine_batches(&args)?,
        Command::ExtractIc50Plots(args) => ccsp::extract::extract_ic50_plots(&args)?,
        Command::PlotIaa(args) => _ = ccsp::plot::plot_iaa(&args)?,
    }

    Ok(())
}
