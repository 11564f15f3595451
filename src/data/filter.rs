use log::debug;

use super::mask::RowMask;
use super::model::{CellValue, Dataset};
use crate::error::{ConfigurationError, EngineError};

// ---------------------------------------------------------------------------
// Filter selection: which values are admissible per dimension
// ---------------------------------------------------------------------------

/// One filter axis: a dimension column and its admissible values, in the
/// order the caller chose them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionFilter {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// Ordered sequence of dimension filters. Dimension order and value order
/// drive both the enumeration order and the labels of [`expand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    dimensions: Vec<DimensionFilter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterSpec::push_dimension`].
    pub fn with<V: Into<CellValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push_dimension(name, values.into_iter().map(Into::into));
        self
    }

    /// Append a dimension entry. A name that is already present gets a second
    /// entry, and [`expand`] ANDs the two. Duplicate values are dropped,
    /// keeping the first occurrence.
    pub fn push_dimension(&mut self, name: impl Into<String>, values: impl IntoIterator<Item = CellValue>) {
        self.dimensions.push(DimensionFilter {
            name: name.into(),
            values: dedup(values),
        });
    }

    /// Replace the values of the first entry named `name`, or append one.
    pub fn set_values(&mut self, name: &str, values: impl IntoIterator<Item = CellValue>) {
        let values = dedup(values);
        match self.dimensions.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.values = values,
            None => self.dimensions.push(DimensionFilter {
                name: name.to_string(),
                values,
            }),
        }
    }

    /// Drop every entry named `name`.
    pub fn remove_dimension(&mut self, name: &str) {
        self.dimensions.retain(|d| d.name != name);
    }

    /// Add `value` at the end of the first matching entry's values, or remove
    /// it if present.
    pub fn toggle_value(&mut self, name: &str, value: &CellValue) {
        if let Some(dim) = self.dimensions.iter_mut().find(|d| d.name == name) {
            if let Some(pos) = dim.values.iter().position(|v| v == value) {
                dim.values.remove(pos);
            } else {
                dim.values.push(value.clone());
            }
        }
    }

    pub fn select_all(&mut self, name: &str, values: &[CellValue]) {
        self.set_values(name, values.iter().cloned());
    }

    pub fn select_none(&mut self, name: &str) {
        self.set_values(name, std::iter::empty());
    }

    pub fn dimensions(&self) -> &[DimensionFilter] {
        &self.dimensions
    }

    pub fn get(&self, name: &str) -> Option<&DimensionFilter> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Number of combinations [`expand`] will produce.
    pub fn combination_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.values.len()).product()
    }
}

fn dedup(values: impl IntoIterator<Item = CellValue>) -> Vec<CellValue> {
    let mut unique: Vec<CellValue> = Vec::new();
    for v in values {
        if !unique.contains(&v) {
            unique.push(v);
        }
    }
    unique
}

// ---------------------------------------------------------------------------
// Combination expansion
// ---------------------------------------------------------------------------

/// One element of the Cartesian product of a [`FilterSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    /// One value per dimension, in filter order.
    pub values: Vec<CellValue>,
    /// Values concatenated without separator.
    pub label: String,
    /// Rows matching every assigned value.
    pub mask: RowMask,
}

/// Expand `spec` into every combination of per-dimension values.
///
/// The first dimension is the outermost loop and the last spins fastest.
/// Any empty value set yields no combinations; an empty spec yields a
/// single all-rows combination with an empty label.
///
/// Uses an index odometer with per-depth prefix masks and labels, so an
/// advance only rebuilds the suffix of dimensions that changed.
pub fn expand(dataset: &Dataset, spec: &FilterSpec) -> Result<Vec<Combination>, EngineError> {
    let dims = spec.dimensions();
    let columns = dims
        .iter()
        .map(|d| {
            dataset
                .column_index(&d.name)
                .ok_or_else(|| ConfigurationError::UnknownDimension(d.name.clone()))
        })
        .collect::<Result<Vec<usize>, _>>()?;

    if dims.iter().any(|d| d.values.is_empty()) {
        debug!("filter has an empty value set, nothing to expand");
        return Ok(Vec::new());
    }

    let rows = dataset.len();
    // eq_masks[d][v]: rows whose dimension-d cell equals value v.
    let eq_masks: Vec<Vec<RowMask>> = dims
        .iter()
        .zip(&columns)
        .map(|(dim, &col)| {
            dim.values
                .iter()
                .map(|value| RowMask::from_fn(rows, |r| dataset.records[r].cell(col) == value))
                .collect()
        })
        .collect();

    let depth = dims.len();
    let mut odometer = vec![0usize; depth];
    let mut prefix_masks = vec![RowMask::all(rows)];
    let mut prefix_labels = vec![String::new()];
    let mut combinations = Vec::with_capacity(spec.combination_count());
    let mut changed_from = 0;

    loop {
        prefix_masks.truncate(changed_from + 1);
        prefix_labels.truncate(changed_from + 1);
        for d in changed_from..depth {
            let v = odometer[d];
            let mask = prefix_masks[d].and(&eq_masks[d][v]);
            let label = format!("{}{}", prefix_labels[d], dims[d].values[v]);
            prefix_masks.push(mask);
            prefix_labels.push(label);
        }

        combinations.push(Combination {
            values: odometer
                .iter()
                .enumerate()
                .map(|(d, &v)| dims[d].values[v].clone())
                .collect(),
            label: prefix_labels[depth].clone(),
            mask: prefix_masks[depth].clone(),
        });

        // Advance: bump the last dimension, carrying leftwards.
        let mut d = depth;
        loop {
            if d == 0 {
                debug!(
                    "expanded {} dimension(s) into {} combination(s)",
                    depth,
                    combinations.len()
                );
                return Ok(combinations);
            }
            d -= 1;
            odometer[d] += 1;
            if odometer[d] < dims[d].values.len() {
                break;
            }
            odometer[d] = 0;
        }
        changed_from = d;
    }
}
