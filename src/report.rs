//!
//! Spreadsheet report, one sheet per resource category
//!
use crate::extract::{Cell, ResourceRecord};
use crate::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

/// Longest text Excel accepts in a single cell
const MAX_CELL_CHARS: usize = 32_767;

/// A named sheet with a fixed header
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    columns: &'static [&'static str],
    rows: Vec<ResourceRecord>,
}

impl Sheet {
    /// Sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header row
    #[must_use]
    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Rows in insertion order
    #[must_use]
    pub fn rows(&self) -> &[ResourceRecord] {
        &self.rows
    }
}

/// Ordered collection of sheets, written once with [`Report::save`]
#[derive(Debug, Clone, Default)]
pub struct Report {
    sheets: Vec<Sheet>,
}

impl Report {
    /// Empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet. The header comes from `columns`, not from the rows, so a
    /// sheet without records is still written with its header.
    pub fn add_sheet(
        &mut self,
        name: &str,
        columns: &'static [&'static str],
        records: Vec<ResourceRecord>,
    ) {
        tracing::debug!("sheet {}: {} rows", name, records.len());
        self.sheets.push(Sheet {
            name: name.to_string(),
            columns,
            rows: records,
        });
    }

    /// Sheets in insertion order
    #[must_use]
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Find a sheet by name
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Write the report as an `.xlsx` workbook
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            write_sheet(worksheet, sheet, &header)?;
        }

        workbook.save(path).map_err(|e| {
            tracing::error!("failed to write {}: {}", path.display(), e);
            Error::from(e)
        })?;
        tracing::info!("Report written to {}", path.display());
        Ok(())
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, header: &Format) -> Result<()> {
    for (col, name) in sheet.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col)?, *name, header)?;
    }

    for (row, record) in sheet.rows.iter().enumerate() {
        let row = row_index(row + 1)?;
        for (col, cell) in record.cells().iter().enumerate() {
            write_cell(worksheet, row, column_index(col)?, cell)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(text) => {
            worksheet.write_string(row, col, clip(text))?;
        }
        Cell::Integer(value) => {
            worksheet.write_number(row, col, *value as f64)?;
        }
        Cell::Float(value) => {
            worksheet.write_number(row, col, *value)?;
        }
    }
    Ok(())
}

fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => {
            tracing::warn!("cell text truncated to {} characters", MAX_CELL_CHARS);
            &text[..idx]
        }
        None => text,
    }
}

fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| Error::Report(XlsxError::RowColumnLimitError))
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::Report(XlsxError::RowColumnLimitError))
}
