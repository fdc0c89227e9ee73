use crate::core::error::Result;
use crate::table::base::FeatureTable;

/// Read-only view of a subset of a [`FeatureTable`]'s columns
///
/// A view only stores column positions; the backing table is borrowed and
/// never modified. Forward selection builds a fresh view for every trial
/// feature set instead of growing a table in place.
#[derive(Debug, Clone)]
pub struct FeatureView<'a> {
    table: &'a FeatureTable,
    indices: Vec<usize>,
}

impl<'a> FeatureView<'a> {
    pub(crate) fn new(table: &'a FeatureTable, indices: Vec<usize>) -> Self {
        Self { table, indices }
    }

    /// The backing table
    pub fn table(&self) -> &'a FeatureTable {
        self.table
    }

    /// Positions of the viewed columns in the backing table
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn nrows(&self) -> usize {
        self.table.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.indices.len()
    }

    /// Names of the viewed columns, in view order
    pub fn names(&self) -> Vec<String> {
        let all = self.table.column_names();
        self.indices.iter().map(|&i| all[i].clone()).collect()
    }

    /// Values of the `position`-th viewed column
    pub fn column(&self, position: usize) -> Result<&'a [f64]> {
        let index = self.indices.get(position).copied().unwrap_or(usize::MAX);
        self.table.column_at(index)
    }

    /// Borrow every viewed column
    pub fn columns(&self) -> Vec<&'a [f64]> {
        let raw = self.table.raw_columns();
        self.indices.iter().map(|&i| raw[i].as_slice()).collect()
    }

    /// Copy the viewed columns for the given rows (column-major)
    pub fn gather_rows(&self, rows: &[usize]) -> Vec<Vec<f64>> {
        let raw = self.table.raw_columns();
        self.indices
            .iter()
            .map(|&i| rows.iter().map(|&r| raw[i][r]).collect())
            .collect()
    }

    /// Copy every viewed column (column-major)
    pub fn to_columns(&self) -> Vec<Vec<f64>> {
        self.columns().into_iter().map(<[f64]>::to_vec).collect()
    }

    /// A new view with `index` appended
    pub fn with_column(&self, index: usize) -> FeatureView<'a> {
        let mut indices = Vec::with_capacity(self.indices.len() + 1);
        indices.extend_from_slice(&self.indices);
        indices.push(index);
        FeatureView::new(self.table, indices)
    }

    /// A new view over the first `n` viewed columns
    pub fn prefix(&self, n: usize) -> FeatureView<'a> {
        let n = n.min(self.indices.len());
        FeatureView::new(self.table, self.indices[..n].to_vec())
    }
}
