//! Square integral distance matrix.

use crate::error::MatrixError;

/// Travel costs between every pair of a cluster's nodes, in integer units
/// (meters when sourced from OSRM).
///
/// Always square with a zero diagonal. Not necessarily symmetric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<u64>,
}

impl DistanceMatrix {
    /// Validate and flatten row-major data.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        if size == 0 {
            return Err(MatrixError::Empty);
        }

        let mut cells = Vec::with_capacity(size * size);
        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(MatrixError::NotSquare {
                    row: row_index,
                    expected: size,
                    actual: row.len(),
                });
            }
            if row[row_index] != 0 {
                return Err(MatrixError::NonZeroDiagonal {
                    index: row_index,
                    value: row[row_index],
                });
            }
            cells.extend(row);
        }

        Ok(Self { size, cells })
    }

    /// Build a matrix from a cost function. The diagonal is forced to zero.
    pub fn from_fn(size: usize, mut cost: impl FnMut(usize, usize) -> u64) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                cells.push(if i == j { 0 } else { cost(i, j) });
            }
        }
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> u64 {
        self.cells[from * self.size + to]
    }

    /// Largest cell; 0 for an empty matrix.
    pub fn max_entry(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (i + 1..self.size).all(|j| self.get(i, j) == self.get(j, i)))
    }
}
