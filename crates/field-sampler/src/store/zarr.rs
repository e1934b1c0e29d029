//! Zarr-backed dataset store.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::{s, Array2, Array5};
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableStorageTraits;
use zarrs_filesystem::FilesystemStore;

use super::DataStore;
use crate::error::{Result, SamplerError};

/// A dataset stored as a Zarr group.
///
/// Expected layout:
/// - `data`: float32, shape `(time, field, level, lat, lon)`
/// - `time`: int64 epoch seconds, length `time`
/// - `lats`, `lons`: float64 coordinate axes
///
/// Attributes on `data`: `fields` (array of names), `levels` (array of
/// integer identifiers) and `is_global` (numeric flag; the longitude axis is
/// periodic iff the value is at least 1).
///
/// Metadata and coordinate arrays are read eagerly at open; only
/// [`read_block`](DataStore::read_block) touches the bulk data afterwards.
pub struct ZarrDataStore<S: ReadableStorageTraits + 'static> {
    data: Array<S>,
    shape: [usize; 5],
    fields: Vec<String>,
    levels: Vec<i64>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    times: Vec<DateTime<Utc>>,
    is_global: bool,
}

impl ZarrDataStore<FilesystemStore> {
    /// Open a dataset stored on the local filesystem.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let store = FilesystemStore::new(path.as_ref())
            .map_err(|e| SamplerError::open_failed(e.to_string()))?;
        Self::open(Arc::new(store))
    }
}

impl<S: ReadableStorageTraits + 'static> ZarrDataStore<S> {
    /// Open a dataset from any readable zarr storage backend.
    pub fn open(storage: Arc<S>) -> Result<Self> {
        let data = Array::open(storage.clone(), "/data")
            .map_err(|e| SamplerError::open_failed(e.to_string()))?;

        let shape = {
            let s = data.shape();
            if s.len() != 5 {
                return Err(SamplerError::invalid_metadata(format!(
                    "data array must have 5 axes (time, field, level, lat, lon), got {}",
                    s.len()
                )));
            }
            [
                s[0] as usize,
                s[1] as usize,
                s[2] as usize,
                s[3] as usize,
                s[4] as usize,
            ]
        };

        let (fields, levels, is_global) = parse_attributes(&data)?;

        let lats = read_f64_axis(&storage, "/lats")?;
        let lons = read_f64_axis(&storage, "/lons")?;
        let times = read_time_axis(&storage, "/time")?;

        if lats.len() != shape[3] || lons.len() != shape[4] {
            return Err(SamplerError::shape(format!(
                "coordinate arrays ({}, {}) do not match spatial extent ({}, {})",
                lats.len(),
                lons.len(),
                shape[3],
                shape[4]
            )));
        }
        if times.len() != shape[0] {
            return Err(SamplerError::shape(format!(
                "time array length {} does not match time extent {}",
                times.len(),
                shape[0]
            )));
        }
        if fields.len() != shape[1] || levels.len() != shape[2] {
            return Err(SamplerError::invalid_metadata(format!(
                "catalog attributes ({} fields, {} levels) do not match data shape ({}, {})",
                fields.len(),
                levels.len(),
                shape[1],
                shape[2]
            )));
        }

        tracing::debug!(
            ?shape,
            fields = fields.len(),
            levels = levels.len(),
            is_global,
            "opened zarr dataset"
        );

        Ok(Self {
            data,
            shape,
            fields,
            levels,
            lats,
            lons,
            times,
            is_global,
        })
    }

    /// Read one `(lat, lon)` plane of the data array.
    fn read_plane(&self, t: usize, f: usize, l: usize) -> Result<Vec<f32>> {
        let subset = ArraySubset::new_with_start_shape(
            vec![t as u64, f as u64, l as u64, 0, 0],
            vec![1, 1, 1, self.shape[3] as u64, self.shape[4] as u64],
        )
        .map_err(|e| SamplerError::read_failed(e.to_string()))?;

        self.data
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| SamplerError::read_failed(e.to_string()))
    }
}

impl<S: ReadableStorageTraits + 'static> DataStore for ZarrDataStore<S> {
    fn shape(&self) -> [usize; 5] {
        self.shape
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
        let (nlat, nlon) = (self.shape[3], self.shape[4]);
        let mut block = Array5::zeros((
            time_indices.len(),
            field_indices.len(),
            level_indices.len(),
            nlat,
            nlon,
        ));

        // The requested index sets are arbitrary along each axis, so the
        // block is assembled plane by plane from contiguous spatial reads.
        for (ti, &t) in time_indices.iter().enumerate() {
            for (fi, &f) in field_indices.iter().enumerate() {
                for (li, &l) in level_indices.iter().enumerate() {
                    let plane = self.read_plane(t, f, l)?;
                    let plane = Array2::from_shape_vec((nlat, nlon), plane)?;
                    block.slice_mut(s![ti, fi, li, .., ..]).assign(&plane);
                }
            }
        }

        Ok(block)
    }
}

fn parse_attributes<S: ReadableStorageTraits + 'static>(
    data: &Array<S>,
) -> Result<(Vec<String>, Vec<i64>, bool)> {
    let attrs = data.attributes();

    let fields = attrs
        .get("fields")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SamplerError::invalid_metadata("missing 'fields' attribute"))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| SamplerError::invalid_metadata("non-string field name"))
        })
        .collect::<Result<Vec<_>>>()?;

    let levels = attrs
        .get("levels")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SamplerError::invalid_metadata("missing 'levels' attribute"))?
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| SamplerError::invalid_metadata("non-integer level identifier"))
        })
        .collect::<Result<Vec<_>>>()?;

    let is_global = attrs
        .get("is_global")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| SamplerError::invalid_metadata("missing 'is_global' attribute"))?
        >= 1.0;

    Ok((fields, levels, is_global))
}

fn read_f64_axis<S: ReadableStorageTraits + 'static>(
    storage: &Arc<S>,
    path: &str,
) -> Result<Vec<f64>> {
    let array = Array::open(storage.clone(), path)
        .map_err(|e| SamplerError::open_failed(format!("{path}: {e}")))?;
    let len = array.shape()[0];
    let subset = ArraySubset::new_with_shape(vec![len]);
    array
        .retrieve_array_subset_elements(&subset)
        .map_err(|e| SamplerError::read_failed(format!("{path}: {e}")))
}

fn read_time_axis<S: ReadableStorageTraits + 'static>(
    storage: &Arc<S>,
    path: &str,
) -> Result<Vec<DateTime<Utc>>> {
    let array = Array::open(storage.clone(), path)
        .map_err(|e| SamplerError::open_failed(format!("{path}: {e}")))?;
    let len = array.shape()[0];
    let subset = ArraySubset::new_with_shape(vec![len]);
    let seconds: Vec<i64> = array
        .retrieve_array_subset_elements(&subset)
        .map_err(|e| SamplerError::read_failed(format!("{path}: {e}")))?;

    seconds
        .into_iter()
        .map(|s| {
            DateTime::from_timestamp(s, 0)
                .ok_or_else(|| SamplerError::invalid_metadata(format!("invalid timestamp {s}")))
        })
        .collect()
}
