use std::collections::HashMap;

use crate::core::error::{Error, Result};
use crate::table::view::FeatureView;

/// Column-oriented table of named numeric features
///
/// One row per observation (plot), one column per image-derived feature.
/// Columns keep their insertion order; names are unique and every column has
/// the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<Vec<f64>>,
    column_order: Vec<String>,
    positions: HashMap<String, usize>,
    row_count: usize,
}

impl FeatureTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs, preserving their order
    pub fn from_columns<S, I>(columns: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let mut table = FeatureTable::new();
        for (name, values) in columns {
            table.add_column(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.row_count
    }

    /// Number of feature columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Add a column at the end of the table
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();

        // Check if column already exists
        if self.positions.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        // Check length consistency
        if !self.columns.is_empty() && values.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: values.len(),
            });
        }

        if self.columns.is_empty() {
            self.row_count = values.len();
        }

        self.positions.insert(name.clone(), self.columns.len());
        self.column_order.push(name);
        self.columns.push(values);

        Ok(())
    }

    /// Column names in table order
    pub fn column_names(&self) -> &[String] {
        &self.column_order
    }

    /// Name of the column at `index`
    pub fn column_name(&self, index: usize) -> Result<&str> {
        self.column_order
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::InvalidInput(format!("column index {} out of range", index)))
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Values of the column at `index`
    pub fn column_at(&self, index: usize) -> Result<&[f64]> {
        self.columns
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::InvalidInput(format!("column index {} out of range", index)))
    }

    /// Values of a named column
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        let index = self.column_index(name)?;
        self.column_at(index)
    }

    /// All columns, in table order
    pub(crate) fn raw_columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// View over every column
    pub fn view(&self) -> FeatureView<'_> {
        FeatureView::new(self, (0..self.ncols()).collect())
    }

    /// View over the columns at `indices`, in that order
    pub fn select_indices(&self, indices: Vec<usize>) -> Result<FeatureView<'_>> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.ncols()) {
            return Err(Error::InvalidInput(format!(
                "column index {} out of range for {} columns",
                bad,
                self.ncols()
            )));
        }
        Ok(FeatureView::new(self, indices))
    }

    /// View over named columns, in the given order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<FeatureView<'_>> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureView::new(self, indices))
    }
}
