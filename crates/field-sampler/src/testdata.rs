//! Synthetic dataset fixtures shared by unit and integration tests.
//!
//! Cell values encode their own storage coordinates, so a read can be
//! checked against [`test_value`] without keeping a reference copy of the
//! data around.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::Array5;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::store::MemoryStore;

/// The value stored at `(time, field, level, lat, lon)` in every fixture.
///
/// Each coordinate occupies its own decimal range, and the result stays
/// well inside f32's exact integer range for fixture-sized datasets.
pub fn test_value(t: usize, f: usize, l: usize, i: usize, j: usize) -> f32 {
    (t * 1_000_000 + f * 100_000 + l * 10_000 + i * 100 + j) as f32
}

/// Hourly timestamps starting 1 Jan 2021 00:00 UTC.
pub fn synthetic_times(nt: usize) -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    (0..nt).map(|t| start + Duration::hours(t as i64)).collect()
}

/// Latitudes spanning `[-90, 90]` inclusive with `nlat` points.
pub fn synthetic_lats(nlat: usize) -> Vec<f64> {
    let step = 180.0 / (nlat - 1) as f64;
    (0..nlat).map(|i| -90.0 + i as f64 * step).collect()
}

/// Longitudes spanning `[0, 360)` with `nlon` points.
pub fn synthetic_lons(nlon: usize) -> Vec<f64> {
    let step = 360.0 / nlon as f64;
    (0..nlon).map(|j| j as f64 * step).collect()
}

fn synthetic_data(nt: usize, nf: usize, nl: usize, nlat: usize, nlon: usize) -> Array5<f32> {
    Array5::from_shape_fn((nt, nf, nl, nlat, nlon), |(t, f, l, i, j)| {
        test_value(t, f, l, i, j)
    })
}

/// Build an in-memory dataset filled with [`test_value`] cells.
pub fn memory_store(
    nt: usize,
    fields: &[&str],
    levels: &[i64],
    nlat: usize,
    nlon: usize,
    is_global: bool,
) -> MemoryStore {
    MemoryStore::new(
        synthetic_data(nt, fields.len(), levels.len(), nlat, nlon),
        fields.iter().map(|s| s.to_string()).collect(),
        levels.to_vec(),
        synthetic_lats(nlat),
        synthetic_lons(nlon),
        synthetic_times(nt),
        is_global,
    )
    .unwrap()
}

/// Write a complete dataset group to `path` in the layout
/// [`ZarrDataStore`](crate::store::ZarrDataStore) expects.
pub fn write_zarr_dataset(
    path: &Path,
    nt: usize,
    fields: &[&str],
    levels: &[i64],
    nlat: usize,
    nlon: usize,
    is_global: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    let (nf, nl) = (fields.len(), levels.len());
    let data = ArrayBuilder::new(
        vec![
            nt as u64,
            nf as u64,
            nl as u64,
            nlat as u64,
            nlon as u64,
        ],
        DataType::Float32,
        vec![1, 1, 1, nlat as u64, nlon as u64].try_into()?,
        FillValue::from(f32::NAN),
    )
    .attributes({
        let mut attrs = serde_json::Map::new();
        attrs.insert("fields".to_string(), serde_json::json!(fields));
        attrs.insert("levels".to_string(), serde_json::json!(levels));
        attrs.insert(
            "is_global".to_string(),
            serde_json::json!(if is_global { 1.0 } else { 0.0 }),
        );
        attrs
    })
    .build(store.clone(), "/data")?;
    data.store_metadata()?;

    let values = synthetic_data(nt, nf, nl, nlat, nlon);
    let subset = ArraySubset::new_with_start_shape(
        vec![0, 0, 0, 0, 0],
        vec![
            nt as u64,
            nf as u64,
            nl as u64,
            nlat as u64,
            nlon as u64,
        ],
    )?;
    data.store_array_subset_elements(&subset, values.as_slice().unwrap())?;

    write_f64_axis(&store, "/lats", &synthetic_lats(nlat))?;
    write_f64_axis(&store, "/lons", &synthetic_lons(nlon))?;

    let seconds: Vec<i64> = synthetic_times(nt).iter().map(|t| t.timestamp()).collect();
    let time = ArrayBuilder::new(
        vec![nt as u64],
        DataType::Int64,
        vec![nt as u64].try_into()?,
        FillValue::from(0i64),
    )
    .build(store.clone(), "/time")?;
    time.store_metadata()?;
    time.store_array_subset_elements(&ArraySubset::new_with_shape(vec![nt as u64]), &seconds)?;

    Ok(())
}

fn write_f64_axis(
    store: &Arc<FilesystemStore>,
    path: &str,
    values: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    let len = values.len() as u64;
    let array = ArrayBuilder::new(
        vec![len],
        DataType::Float64,
        vec![len].try_into()?,
        FillValue::from(f64::NAN),
    )
    .build(store.clone(), path)?;
    array.store_metadata()?;
    array.store_array_subset_elements(&ArraySubset::new_with_shape(vec![len]), values)?;
    Ok(())
}
