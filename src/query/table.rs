//! Column-named tables returned by the query clients

use std::io::Write;

use crate::{Result, SpiceToolsError};

/// Rows of optional text cells under named columns
///
/// Cells stay as text so that each service's formatting (full-precision
/// numbers, designations with spaces, dates) survives untouched; use
/// [`Table::column_f64`] for numeric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, which must have one cell per column
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SpiceToolsError::InvalidParameter(format!(
                "Row has {} cells but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_deref()).collect())
    }

    /// A column parsed as numbers; empty cells become `None`
    pub fn column_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let cells = self
            .column(name)
            .ok_or_else(|| SpiceToolsError::InvalidParameter(format!("No column named {:?}", name)))?;
        cells
            .into_iter()
            .map(|cell| match cell.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                    SpiceToolsError::InvalidParameter(format!(
                        "Column {:?} holds non-numeric value {:?}",
                        name, text
                    ))
                }),
            })
            .collect()
    }

    /// Write the table as CSV with a header row; missing cells are empty
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
