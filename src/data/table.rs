//! Column-labelled numeric table (the "tabular source").
//!
//! Columns are stored column-major; row order is significant and preserved
//! by every operation. Column lookup by name is case-insensitive.

use std::ops::Range;

use crate::error::DilError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl Table {
    /// Build a table from named columns of equal length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, DilError> {
        if names.len() != columns.len() {
            return Err(DilError::invalid_argument(format!(
                "{} column names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let n_rows = columns.first().map(Vec::len).unwrap_or(0);
        if let Some((name, col)) = names.iter().zip(&columns).find(|(_, c)| c.len() != n_rows) {
            return Err(DilError::invalid_argument(format!(
                "column '{name}' has {} rows, expected {n_rows}",
                col.len()
            )));
        }
        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Build a table from row-major data. Every row must have one value per name.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, DilError> {
        let mut columns = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(DilError::invalid_argument(format!(
                    "row {i} has {} values, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (col, &v) in columns.iter_mut().zip(row) {
                col.push(v);
            }
        }
        Ok(Self {
            names,
            columns,
            n_rows: rows.len(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Case-insensitive column lookup. When several columns share a name the
    /// first one wins.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        (i < self.n_rows).then(|| self.columns.iter().map(|c| c[i]).collect())
    }

    /// Copy of a contiguous block of rows. The range is clamped to the table.
    pub fn slice_rows(&self, range: Range<usize>) -> Table {
        let end = range.end.min(self.n_rows);
        let start = range.start.min(end);
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c[start..end].to_vec()).collect(),
            n_rows: end - start,
        }
    }

    /// Copy of the rows at `positions`, in the given order.
    ///
    /// # Panics
    /// Panics if a position is out of bounds. Callers derive positions from
    /// this table's own row count.
    pub fn select_rows(&self, positions: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| positions.iter().map(|&i| c[i]).collect())
                .collect(),
            n_rows: positions.len(),
        }
    }

    /// Concatenate tables row-wise, in order.
    ///
    /// The result carries the union of all column names (first-seen order,
    /// compared case-insensitively); cells of columns a table lacks are NaN.
    pub fn concat<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Table {
        let tables: Vec<&Table> = tables.into_iter().collect();

        let mut names: Vec<String> = Vec::new();
        for t in &tables {
            for name in &t.names {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                    names.push(name.clone());
                }
            }
        }

        let n_rows: usize = tables.iter().map(|t| t.n_rows).sum();
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n_rows); names.len()];
        for t in &tables {
            for (name, out) in names.iter().zip(columns.iter_mut()) {
                match t.column(name) {
                    Some(values) => out.extend_from_slice(values),
                    None => out.extend(std::iter::repeat_n(f64::NAN, t.n_rows)),
                }
            }
        }

        Table {
            names,
            columns,
            n_rows,
        }
    }
}
