//! In-memory dataset store.

use chrono::{DateTime, Utc};
use ndarray::{Array5, Axis};

use super::DataStore;
use crate::error::{Result, SamplerError};

/// A dataset held entirely in memory.
///
/// Useful for tests and for small derived datasets that were already
/// materialized by some other pipeline stage.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Array5<f32>,
    fields: Vec<String>,
    levels: Vec<i64>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    times: Vec<DateTime<Utc>>,
    is_global: bool,
}

impl MemoryStore {
    /// Create a store; all coordinate arrays must match the data extent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: Array5<f32>,
        fields: Vec<String>,
        levels: Vec<i64>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        times: Vec<DateTime<Utc>>,
        is_global: bool,
    ) -> Result<Self> {
        let shape = data.shape();
        if times.len() != shape[0]
            || fields.len() != shape[1]
            || levels.len() != shape[2]
            || lats.len() != shape[3]
            || lons.len() != shape[4]
        {
            return Err(SamplerError::shape(format!(
                "coordinate lengths ({}, {}, {}, {}, {}) do not match data shape {:?}",
                times.len(),
                fields.len(),
                levels.len(),
                lats.len(),
                lons.len(),
                shape
            )));
        }
        Ok(Self {
            data,
            fields,
            levels,
            lats,
            lons,
            times,
            is_global,
        })
    }
}

impl DataStore for MemoryStore {
    fn shape(&self) -> [usize; 5] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3], s[4]]
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn levels(&self) -> &[i64] {
        &self.levels
    }

    fn is_global(&self) -> bool {
        self.is_global
    }

    fn lats(&self) -> &[f64] {
        &self.lats
    }

    fn lons(&self) -> &[f64] {
        &self.lons
    }

    fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    fn read_block(
        &self,
        time_indices: &[usize],
        field_indices: &[usize],
        level_indices: &[usize],
    ) -> Result<Array5<f32>> {
        let shape = self.shape();
        check_indices("time", time_indices, shape[0])?;
        check_indices("field", field_indices, shape[1])?;
        check_indices("level", level_indices, shape[2])?;

        Ok(self
            .data
            .select(Axis(0), time_indices)
            .select(Axis(1), field_indices)
            .select(Axis(2), level_indices))
    }
}

fn check_indices(axis: &str, indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&bad) => Err(SamplerError::read_failed(format!(
            "{axis} index {bad} out of range (axis length {len})"
        ))),
        None => Ok(()),
    }
}
