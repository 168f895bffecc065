use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use umya_spreadsheet::{Color, Spreadsheet, Worksheet};

use crate::calendar::Weekdays;
use crate::error::InvoiceError;
use crate::layout::{CellRef, TemplateLayout};
use crate::pages::Page;
use crate::run::RunError;

/// Fills copies of a template workbook. The template itself is only read.
pub struct TemplateWriter<'a> {
    template: &'a Path,
    output_dir: &'a Path,
    layout: &'a TemplateLayout,
}

impl<'a> TemplateWriter<'a> {
    pub fn new(
        template: &'a Path,
        output_dir: &'a Path,
        layout: &'a TemplateLayout,
    ) -> Self {
        Self {
            template,
            output_dir,
            layout,
        }
    }

    /// One workbook per page, named `invoice_<number>.xlsx`.
    pub fn write_pages(
        &self,
        pages: &[Page],
    ) -> Result<Vec<PathBuf>, RunError> {
        let paths = pages
            .iter()
            .map(|p| self.output_path(&format!("invoice_{}.xlsx", p.number)))
            .collect::<Result<Vec<PathBuf>, InvoiceError>>()?;

        fs::create_dir_all(self.output_dir)?;
        for (page, path) in pages.iter().zip(paths.iter()) {
            let mut book = self.open_template()?;
            fill_page(self.sheet(&mut book)?, self.layout, page, 0)?;
            save(&book, path)?;
        }
        Ok(paths)
    }

    /// All pages in a single workbook, each `page_row_stride` rows below
    /// the previous one.
    pub fn write_stacked(&self, pages: &[Page]) -> Result<PathBuf, RunError> {
        let (first, last) = match (pages.first(), pages.last()) {
            (Some(first), Some(last)) => (first.number, last.number),
            _ => return Err(InvoiceError::NoProducts.into()),
        };
        let path =
            self.output_path(&format!("invoice_{}-{}.xlsx", first, last))?;

        fs::create_dir_all(self.output_dir)?;
        let mut book = self.open_template()?;
        let sheet = self.sheet(&mut book)?;
        for (i, page) in pages.iter().enumerate() {
            let offset = i as u32 * self.layout.page_row_stride;
            fill_page(sheet, self.layout, page, offset)?;
        }
        save(&book, &path)?;
        Ok(path)
    }

    fn output_path(&self, name: &str) -> Result<PathBuf, InvoiceError> {
        let path = self.output_dir.join(name);
        if path.exists() {
            return Err(InvoiceError::OutputExists {
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }

    fn open_template(&self) -> Result<Spreadsheet, RunError> {
        debug!("Opening template {}", self.template.display());
        Ok(umya_spreadsheet::reader::xlsx::read(self.template)?)
    }

    fn sheet<'b>(
        &self,
        book: &'b mut Spreadsheet,
    ) -> Result<&'b mut Worksheet, InvoiceError> {
        let index = self.layout.sheet_index;
        book.get_sheet_mut(&index)
            .ok_or(InvoiceError::MissingSheet { index })
    }
}

fn save(book: &Spreadsheet, path: &Path) -> Result<(), RunError> {
    umya_spreadsheet::writer::xlsx::write(book, path)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn amount(value: Decimal) -> Result<f64, InvoiceError> {
    value.to_f64().ok_or(InvoiceError::InvalidAmount {
        amount: value.to_string(),
    })
}

/// Writes one page with its cells shifted down by `row_offset`.
pub fn fill_page(
    sheet: &mut Worksheet,
    layout: &TemplateLayout,
    page: &Page,
    row_offset: u32,
) -> Result<(), InvoiceError> {
    let at = |cell: CellRef| cell.offset(0, row_offset).coordinate();

    sheet
        .get_cell_mut(at(layout.invoice_number))
        .set_value_number(page.number);

    let control = at(layout.control_number);
    sheet
        .get_cell_mut(control)
        .set_value_number(page.control.value());
    let style = sheet.get_style_mut(control);
    style
        .get_number_format_mut()
        .set_format_code(layout.control_format.as_str());
    style.get_font_mut().get_color_mut().set_argb(Color::COLOR_RED);

    for (cell, date) in [
        (layout.invoice_date, page.date),
        (layout.expiration_date(), page.expires),
    ] {
        let cell = at(cell);
        sheet
            .get_cell_mut(cell)
            .set_value_number(date.excel_serial());
        sheet
            .get_style_mut(cell)
            .get_number_format_mut()
            .set_format_code(layout.date_format.as_str());
    }

    let col = layout.item_start.col;
    for (slot, item) in page.items.iter().enumerate() {
        let row = layout.item_row(row_offset, slot);
        sheet
            .get_cell_mut((col, row))
            .set_value_string(item.description.as_str());
        sheet
            .get_cell_mut((col + layout.quantity_offset, row))
            .set_value_number(item.quantity);
        sheet
            .get_cell_mut((col + layout.unit_price_offset, row))
            .set_value_number(amount(item.unit_price)?);
        sheet
            .get_cell_mut((col + layout.total_offset, row))
            .set_value_number(amount(item.total)?);
        let label = format!("{}{}", layout.part_number_label, item.code);
        sheet.get_cell_mut((col, row + 1)).set_value_string(label);
    }

    debug!(
        "Filled invoice #{} ({} item(s)) at row offset {}",
        page.number,
        page.items.len(),
        row_offset
    );
    Ok(())
}
