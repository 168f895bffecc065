/*
 * Fill the invoice template from a table of products
 *
 * Requirements:
 * Read the product table (CSV)
 * - codigo, Descripcion, Cantidad, PrecioUnitario, PrecioTotal
 * Split the products into pages
 * - 9 items per page, at most 50 pages
 * Number every page
 * - invoice numbers are sequential from the number given
 * - control numbers are 6 digits, red, advancing 1-11 per page
 * Date every page
 * - weekdays only, never going backwards, inside the given range
 * - expiration 30 days later, moved off weekends
 * Write the pages
 * - a fresh copy of the template per page, template left untouched
 * - or every page stacked in one workbook
 *
 * Anything not given on the command line is prompted for.
 */

mod calendar;
mod cli;
mod dating;
mod error;
mod input;
mod layout;
mod numbering;
mod pages;
mod products;
mod run;
mod writer;

use std::process;

use clap::Parser;
use crate::cli::Opts;

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .init();

    let opts = Opts::parse();

    if let Err(error) = run::run_cmd(opts) {
        eprintln!("{}", error);
        process::exit(1);
    }
}
