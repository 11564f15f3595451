//! Boolean row selection aligned to a dataset's row order.

/// One flag per dataset row. Masks are never mutated once built; the
/// combinators return fresh masks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowMask {
    bits: Vec<bool>,
}

impl RowMask {
    /// Select every row.
    pub fn all(len: usize) -> Self {
        RowMask { bits: vec![true; len] }
    }

    /// Select no row.
    pub fn none(len: usize) -> Self {
        RowMask { bits: vec![false; len] }
    }

    pub fn from_fn(len: usize, f: impl FnMut(usize) -> bool) -> Self {
        RowMask {
            bits: (0..len).map(f).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whether row `idx` is selected. Out-of-range rows are not.
    pub fn get(&self, idx: usize) -> bool {
        self.bits.get(idx).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn count_selected(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Indices of selected rows, ascending.
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| i)
    }

    /// Row-wise AND. The result has the length of the shorter mask.
    pub fn and(&self, other: &RowMask) -> RowMask {
        RowMask {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(a, b)| *a && *b)
                .collect(),
        }
    }

    /// Row-wise OR. The result has the length of the shorter mask.
    pub fn or(&self, other: &RowMask) -> RowMask {
        RowMask {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(a, b)| *a || *b)
                .collect(),
        }
    }

    /// OR of all `masks`, starting from all-false over `len` rows.
    pub fn union<'a>(masks: impl IntoIterator<Item = &'a RowMask>, len: usize) -> RowMask {
        masks
            .into_iter()
            .fold(RowMask::none(len), |acc, m| acc.or(m))
    }
}

impl From<Vec<bool>> for RowMask {
    fn from(bits: Vec<bool>) -> Self {
        RowMask { bits }
    }
}
