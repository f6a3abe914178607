//! Rectangular table of display strings.
//!
//! A [`TabularResult`] always holds `rows * columns` cells and exactly
//! `columns` column names. Cells that could not be produced hold
//! [`ERROR_PLACEHOLDER`].

use core::str::FromStr;

/// Cell text used where no value could be produced.
pub const ERROR_PLACEHOLDER: &str = "[error]";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TabularResult {
    column_names: Vec<String>,
    rows: usize,
    cells: Vec<String>,
}

impl TabularResult {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_name(&self, column: usize) -> Option<&str> {
        self.column_names.get(column).map(String::as_str)
    }

    /// Index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|column| column == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        if row >= self.rows || column >= self.columns() {
            return None;
        }
        self.cells.get(row * self.columns() + column).map(String::as_str)
    }

    pub fn cell_by_name(&self, row: usize, name: &str) -> Option<&str> {
        self.cell(row, self.column_index(name)?)
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        if row >= self.rows {
            return None;
        }
        let columns = self.columns();
        self.cells.get(row * columns..(row + 1) * columns)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        (0..self.rows).filter_map(move |row| self.row(row))
    }

    /// Parses the cell of column `name` in `row`. Missing columns, error
    /// cells and unparsable text all yield `None`.
    ///
    /// ```
    /// use dlms_meter::TabularResult;
    ///
    /// let mut builder = TabularResult::builder(vec!["1.0.1.8.0.255".to_owned()]);
    /// builder.push_row(vec!["1234".to_owned()]);
    /// let table = builder.finish();
    ///
    /// assert_eq!(table.parse_cell::<u32>(0, "1.0.1.8.0.255"), Some(1234));
    /// assert_eq!(table.parse_cell::<u32>(0, "1.0.2.8.0.255"), None);
    /// ```
    pub fn parse_cell<T: FromStr>(&self, row: usize, name: &str) -> Option<T> {
        match self.cell_by_name(row, name)? {
            ERROR_PLACEHOLDER => None,
            text => text.trim().parse().ok(),
        }
    }

    pub fn builder(column_names: Vec<String>) -> TabularBuilder {
        TabularBuilder { table: TabularResult { column_names, rows: 0, cells: Vec::new() } }
    }
}

/// Accumulates rows of a [`TabularResult`], keeping it rectangular.
#[derive(Debug)]
pub struct TabularBuilder {
    table: TabularResult,
}

impl TabularBuilder {
    /// Appends a row. Short rows are padded with [`ERROR_PLACEHOLDER`],
    /// surplus cells are dropped.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        let columns = self.table.columns();
        cells.resize_with(columns, || ERROR_PLACEHOLDER.to_owned());
        self.table.cells.extend(cells);
        self.table.rows += 1;
    }

    pub fn finish(self) -> TabularResult {
        self.table
    }
}
