use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::cli::{Command, Opts, OutputMode, RunArgs};
use crate::dating::DateRange;
use crate::error::InvoiceError;
use crate::input;
use crate::layout::TemplateLayout;
use crate::numbering::ControlNumber;
use crate::pages::{self, Numbering, Page};
use crate::products;
use crate::writer::TemplateWriter;

pub fn run_cmd(opts: Opts) -> Result<(), RunError> {
    let layout = load_layout(opts.layout.as_deref())?;

    match opts.subcommand {
        Command::Layout => show_layout(&layout),
        Command::Preview { ref params } => {
            for page in prepare(&opts.products, &layout, params)? {
                println!("{}\n", page);
            }
            Ok(())
        }
        Command::Generate {
            ref params,
            mode,
            yes,
        } => generate(&opts, &layout, params, mode, yes).map(|_| ()),
    }
}

fn load_layout(path: Option<&Path>) -> Result<TemplateLayout, RunError> {
    match path {
        None => Ok(TemplateLayout::default()),
        Some(path) => {
            let reader = BufReader::new(File::open(path)?);
            let layout: TemplateLayout = serde_lexpr::from_reader(reader)?;
            layout.validate()?;
            info!("Using template layout from {}", path.display());
            Ok(layout)
        }
    }
}

fn show_layout(layout: &TemplateLayout) -> Result<(), RunError> {
    println!("{}", serde_lexpr::to_string(layout)?);
    Ok(())
}

/// Reads the products and numbers every page. Nothing is written.
fn prepare(
    products_path: &Path,
    layout: &TemplateLayout,
    params: &RunArgs,
) -> Result<Vec<Page>, RunError> {
    let products = products::load_products(products_path)?;
    // Fail on an unusable table before asking for anything.
    pages::paginate(&products, layout.items_per_page)?;

    let numbering = numbering(params)?;
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Ok(pages::build_pages(
        &products,
        layout.items_per_page,
        &numbering,
        &mut rng,
    )?)
}

fn numbering(params: &RunArgs) -> Result<Numbering, RunError> {
    let invoice_start = match params.invoice_start {
        Some(start) => start,
        None => input::invoice_start()?,
    };
    let control_start = match params.control_start {
        Some(start) => start,
        None => input::control_start()?,
    };
    let from = match params.from {
        Some(from) => from,
        None => input::date_from()?,
    };
    let until = match params.until {
        Some(until) => until,
        None => input::date_until(from)?,
    };

    Ok(Numbering {
        invoice_start,
        control_start: ControlNumber::new(control_start)?,
        range: DateRange::new(from, until)?,
    })
}

fn generate(
    opts: &Opts,
    layout: &TemplateLayout,
    params: &RunArgs,
    mode: OutputMode,
    yes: bool,
) -> Result<Vec<PathBuf>, RunError> {
    if !opts.template.exists() {
        return Err(RunError::TemplateNotFound {
            path: opts.template.display().to_string(),
        });
    }

    let pages = prepare(&opts.products, layout, params)?;
    print_summary(&pages);

    if !yes && !input::confirm()? {
        println!("Nothing written");
        return Ok(Vec::new());
    }

    let writer = TemplateWriter::new(&opts.template, &opts.output, layout);
    let written = match mode {
        OutputMode::PerPage => writer.write_pages(&pages)?,
        OutputMode::Stacked => vec![writer.write_stacked(&pages)?],
    };

    for path in written.iter() {
        println!("Finished invoice created: {}", path.display());
    }
    Ok(written)
}

fn print_summary(pages: &[Page]) {
    let items: usize = pages.iter().map(|p| p.items.len()).sum();
    println!("{} item(s) across {} page(s):\n", items, pages.len());
    for page in pages {
        println!(
            "{:>2}. #{} control {} dated {} expires {}, {} item(s), {:.2}",
            page.position,
            page.number,
            page.control,
            page.date.format("%d/%m/%Y"),
            page.expires.format("%d/%m/%Y"),
            page.items.len(),
            page.subtotal()
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::tests::ymd;
    use crate::calendar::Weekdays;
    use crate::products::tests::table;
    use crate::writer::tests::make_template;
    use chrono::{Days, NaiveDate};
    use const_format::formatcp;
    use std::fs;
    use tempfile::TempDir;

    fn opts(dir: &Path, count: usize, subcommand: Command) -> Opts {
        let products = dir.join("inputTable.csv");
        fs::write(&products, table(count)).unwrap();
        Opts {
            products,
            template: make_template(dir),
            output: dir.join("invoice"),
            layout: None,
            subcommand,
        }
    }

    fn params(invoice_start: u32) -> RunArgs {
        RunArgs {
            invoice_start: Some(invoice_start),
            control_start: Some(968),
            from: Some(ymd(2026, 1, 19)),
            until: Some(ymd(2026, 1, 30)),
            seed: Some(2026),
        }
    }

    fn generate_cmd(params: RunArgs, mode: OutputMode) -> Command {
        Command::Generate {
            params,
            mode,
            yes: true,
        }
    }

    fn from_serial(serial: f64) -> NaiveDate {
        ymd(1899, 12, 30)
            .checked_add_days(Days::new(serial as u64))
            .unwrap()
    }

    #[test]
    fn twenty_seven_products_make_three_invoices() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let opts = opts(
            dir.path(),
            27,
            generate_cmd(params(100), OutputMode::PerPage),
        );
        let layout = TemplateLayout::default();

        let written =
            generate(&opts, &layout, &params(100), OutputMode::PerPage, true)?;

        assert_eq!(written.len(), 3);
        let mut last_date = ymd(2026, 1, 19);
        let mut last_control = 0.0;
        for (number, path) in (100..).zip(written.iter()) {
            assert_eq!(
                path,
                &opts.output.join(format!("invoice_{}.xlsx", number))
            );
            let book = umya_spreadsheet::reader::xlsx::read(path)?;
            let sheet = book.get_sheet(&0).unwrap();
            let value = |cell: &str| {
                sheet.get_cell(cell).and_then(|c| c.get_value_number())
            };

            assert_eq!(value("E10"), Some(number as f64));

            let control = value("K6").unwrap();
            assert!(control > last_control);
            last_control = control;

            let date = from_serial(value("K12").unwrap());
            assert!(date.is_weekday());
            assert!(date >= last_date && date <= ymd(2026, 1, 30));
            last_date = date;

            let expires = from_serial(value("K13").unwrap());
            assert_eq!(Some(expires), date.add_days_to_weekday(30));

            let last_item = (number - 100) * 9 + 8;
            assert_eq!(
                sheet.get_value("B35"),
                format!("Repuesto {}", last_item)
            );
        }
        Ok(())
    }

    #[test]
    fn run_cmd_writes_files() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let opts = opts(
            dir.path(),
            10,
            generate_cmd(params(7), OutputMode::PerPage),
        );
        let output = opts.output.clone();

        run_cmd(opts)?;

        assert!(output.join("invoice_7.xlsx").exists());
        assert!(output.join("invoice_8.xlsx").exists());
        assert!(!output.join("invoice_9.xlsx").exists());
        Ok(())
    }

    #[test]
    fn stacked_mode_writes_one_file() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let opts = opts(
            dir.path(),
            20,
            generate_cmd(params(40), OutputMode::Stacked),
        );
        let output = opts.output.clone();

        run_cmd(opts)?;

        let files: Vec<_> = fs::read_dir(&output)?.collect();
        assert_eq!(files.len(), 1);
        assert!(output.join("invoice_40-42.xlsx").exists());
        Ok(())
    }

    #[test]
    fn same_seed_same_pages() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let opts = opts(dir.path(), 45, Command::Layout);
        let layout = TemplateLayout::default();

        let first = prepare(&opts.products, &layout, &params(1))?;
        let second = prepare(&opts.products, &layout, &params(1))?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn too_many_products() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let opts = opts(
            dir.path(),
            451,
            generate_cmd(params(1), OutputMode::PerPage),
        );
        let output = opts.output.clone();

        let result = run_cmd(opts);

        assert!(matches!(
            result,
            Err(RunError::Invoice {
                source: InvoiceError::TooManyPages { pages: 51, .. }
            })
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn weekend_range_is_rejected() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let mut weekend = params(1);
        weekend.until = Some(ymd(2026, 1, 31));
        let opts = opts(
            dir.path(),
            3,
            generate_cmd(weekend, OutputMode::PerPage),
        );

        assert!(matches!(
            run_cmd(opts),
            Err(RunError::Invoice {
                source: InvoiceError::NotWeekday { .. }
            })
        ));
        Ok(())
    }

    #[test]
    fn missing_template() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let mut opts = opts(
            dir.path(),
            3,
            generate_cmd(params(1), OutputMode::PerPage),
        );
        opts.template = dir.path().join("missing.xlsx");

        assert!(matches!(
            run_cmd(opts),
            Err(RunError::TemplateNotFound { .. })
        ));
        Ok(())
    }

    const LAYOUT_STR: &str = formatcp!(
        "({} {})",
        "(invoice_number . \"F10\")",
        "(items_per_page . 5)"
    );

    #[test]
    fn layout_file_overrides_defaults() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let path = dir.path().join("layout.sexp");
        fs::write(&path, LAYOUT_STR)?;

        let layout = load_layout(Some(&path))?;
        assert_eq!(layout.invoice_number.to_string(), "F10");
        assert_eq!(layout.items_per_page, 5);
        assert_eq!(layout.control_number.to_string(), "K6");

        let opts = opts(dir.path(), 12, Command::Layout);
        let pages = prepare(&opts.products, &layout, &params(1))?;
        assert_eq!(pages.len(), 3);
        Ok(())
    }

    #[test]
    fn overlapping_layout_file_is_rejected() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let path = dir.path().join("layout.sexp");
        fs::write(&path, "((page_row_stride . 0))")?;
        assert!(matches!(
            load_layout(Some(&path)),
            Err(RunError::Invoice {
                source: InvoiceError::EmptyPageStride
            })
        ));

        fs::write(&path, "((items_per_page . 20))")?;
        let mut opts = opts(
            dir.path(),
            30,
            generate_cmd(params(7), OutputMode::Stacked),
        );
        opts.layout = Some(path);
        let output = opts.output.clone();

        assert!(matches!(
            run_cmd(opts),
            Err(RunError::Invoice {
                source: InvoiceError::PageOverlap { stride: 49, .. }
            })
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn preview_and_layout_commands() -> Result<(), RunError> {
        let dir = TempDir::new()?;
        let preview = Command::Preview { params: params(1) };
        let opts = opts(dir.path(), 4, preview);
        let output = opts.output.clone();
        run_cmd(opts)?;
        assert!(!output.exists());

        run_cmd(self::opts(dir.path(), 4, Command::Layout))?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("IO Error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Error decoding layout: {source}")]
    Format {
        #[from]
        source: serde_lexpr::Error,
    },

    #[error("Error reading products: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("Workbook Error: {source}")]
    Xlsx {
        #[from]
        source: umya_spreadsheet::XlsxError,
    },

    #[error("Input Error: {source}")]
    Input {
        #[from]
        source: inquire::error::InquireError,
    },

    #[error("Template not found: {path}")]
    TemplateNotFound { path: String },

    #[error("{source}")]
    Invoice {
        #[from]
        source: InvoiceError,
    },
}
