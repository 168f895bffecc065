use chrono::NaiveDate;
use clap::{Args, Parser, ValueEnum, ValueHint};
use std::path::PathBuf;

/* Argument Structure
 *
 * [--products <csv>] [--template <xlsx>] [--output <dir>] [--layout <file>]
 * generate [--invoice-start N] [--control-start N] [--from D] [--until D]
 *          [--mode per-page|stacked] [--seed N] [--yes]
 * preview  (same as generate, nothing is written)
 * layout
 */

#[derive(Parser)]
#[clap(about = "Fill the invoice template from a table of products")]
pub struct Opts {
    /// Table of products to invoice
    #[clap(short, long, default_value = "data/processed/inputTable.csv",
        value_hint = ValueHint::FilePath)]
    pub products: PathBuf,

    /// Workbook used as the template, never modified
    #[clap(short, long, default_value = "data/template/template.xlsx",
        value_hint = ValueHint::FilePath)]
    pub template: PathBuf,

    /// Directory finished invoices are written to
    #[clap(short, long, default_value = "data/invoice",
        value_hint = ValueHint::DirPath)]
    pub output: PathBuf,

    /// S-expression file overriding template cell positions
    #[clap(short, long, value_hint = ValueHint::FilePath)]
    pub layout: Option<PathBuf>,

    #[clap(subcommand)]
    pub subcommand: Command,
}

#[derive(Parser)]
pub enum Command {
    /// Write filled invoices from the product table
    Generate {
        #[clap(flatten)]
        params: RunArgs,

        /// How pages are split across workbooks
        #[clap(short, long, value_enum, default_value_t = OutputMode::PerPage)]
        mode: OutputMode,

        /// Skip the confirmation prompt
        #[clap(short, long)]
        yes: bool,
    },

    /// Show the pages that would be generated without writing anything
    Preview {
        #[clap(flatten)]
        params: RunArgs,
    },

    /// Print the template layout in use
    Layout,
}

/// Run parameters; anything left out is asked for interactively.
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// First invoice number
    #[clap(long)]
    pub invoice_start: Option<u32>,

    /// First control number (up to 6 digits)
    #[clap(long)]
    pub control_start: Option<u32>,

    /// First possible invoice date (DD/MM/YYYY, weekday)
    #[clap(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last possible invoice date (DD/MM/YYYY, weekday)
    #[clap(long, value_parser = parse_date)]
    pub until: Option<NaiveDate>,

    /// Seed for reproducible numbering and dates
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputMode {
    /// One workbook per page
    PerPage,
    /// Every page in one workbook, one below the other
    Stacked,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .map_err(|_| format!("'{}' is not a DD/MM/YYYY date", raw))
}
