//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::combine::CombineArgs;
use crate::extract::ExtractArgs;
use crate::plot::PlotArgs;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function. This is achieved with the `parse` function, which parses the command line arguments from [`std::env::args`](https://doc.rust-lang.org/std/env/fn.args.html).
/// ```no_run
/// use clap::Parser;
/// let args = ccsp::Cli::parse();
/// ```
/// The command-line arguments from `std::env::args` are simply a vector of space separated strings. Here is a manual example of setting the command-line input:
/// ```rust
/// # use clap::Parser;
/// let input = ["ccsp", "extract-ic50-plots", "data.zip", "output.html", "--compound-map", "names.json"];
/// let args = ccsp::Cli::parse_from(input);
/// serde_json::to_string_pretty(&args)?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "ccsp", author, version)]
#[clap(about = "ccsp combines, extracts, and plots dose-response assay spreadsheets.")]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants). Used to decide which utility the CLI arguments should be passed to.
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    /// Pass CLI arguments to [combine_batches](crate::combine::combine_batches).
    /// ## Examples
    /// ```rust
    /// use ccsp::{Cli, cli::Command};
    /// use clap::Parser;
    /// let input = ["ccsp", "combine-batches", "--markers", "ERBB2,MET"];
    /// let args = Cli::parse_from(input);
    /// assert!(matches!(args.command, Command::CombineBatches(_)));
    /// ```
    #[clap(about = "Combine per-batch assay spreadsheets into one summary workbook.")]
    CombineBatches(CombineArgs),

    /// Pass CLI arguments to [extract_ic50_plots](crate::extract::extract_ic50_plots).
    /// ## Examples
    /// ```rust
    /// use ccsp::{Cli, cli::Command};
    /// use clap::Parser;
    /// let input = ["ccsp", "extract-ic50-plots", "data.zip", "output.html"];
    /// let args = Cli::parse_from(input);
    /// assert!(matches!(args.command, Command::ExtractIc50Plots(_)));
    /// ```
    #[clap(about = "Extract IC50 % inhibition plots into an HTML report.")]
    #[clap(arg_required_else_help = true)]
    ExtractIc50Plots(ExtractArgs),

    /// Pass CLI arguments to [plot_iaa](crate::plot::plot_iaa).
    #[clap(about = "Plot IAA/Receptor values as a broken-axis bar chart.")]
    PlotIaa(PlotArgs),
}

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// The output verbosity level.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ValueEnum)]
pub enum Verbosity {
    #[default]
    Info,
    Warn,
    Debug,
    Error,
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        // Convert to lowercase for RUST_LOG env var compatibility
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}
