//! Low-level netCDF extraction helpers.

use std::io;
use std::path::Path;

use crate::model::IngestError;

/// Open a netCDF file, reporting a missing path as an I/O error.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IngestError> {
    if !path.exists() {
        return Err(IngestError::Io {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
    }
    netcdf::open(path).map_err(|source| IngestError::NetCdf {
        path: path.to_path_buf(),
        source,
    })
}

fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, IngestError> {
    file.variable(name).ok_or_else(|| IngestError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a 1-D variable as `f64`, whatever its stored type.
pub(crate) fn read_1d_f64(file: &netcdf::File, name: &str, path: &Path) -> Result<Vec<f64>, IngestError> {
    variable(file, name, path)?
        .get_values::<f64, _>(..)
        .map_err(|source| IngestError::NetCdf {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a 1-D integer variable, such as the reach identifiers.
pub(crate) fn read_1d_i64(file: &netcdf::File, name: &str, path: &Path) -> Result<Vec<i64>, IngestError> {
    variable(file, name, path)?
        .get_values::<i64, _>(..)
        .map_err(|source| IngestError::NetCdf {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a 2-D reach-by-time variable into one row per reach.
///
/// Accepts both `(rivid, time)` and `(time, rivid)` layouts; the latter is
/// recognized by the name of its first dimension.
pub(crate) fn read_reach_rows(
    file: &netcdf::File,
    name: &str,
    path: &Path,
) -> Result<Vec<Vec<f64>>, IngestError> {
    let var = variable(file, name, path)?;
    let dims = var.dimensions();
    if dims.len() != 2 {
        return Err(IngestError::DimensionMismatch {
            name: name.to_string(),
            path: path.to_path_buf(),
            expected: 2,
            got: dims.len(),
        });
    }
    let (outer, inner) = (dims[0].len(), dims[1].len());
    let time_major = dims[0].name() == "time";

    let data = var
        .get_values::<f64, _>(..)
        .map_err(|source| IngestError::NetCdf {
            path: path.to_path_buf(),
            source,
        })?;
    let at = |i: usize, j: usize| data[i * inner + j];

    let rows = if time_major {
        (0..inner)
            .map(|reach| (0..outer).map(|t| at(t, reach)).collect())
            .collect()
    } else {
        (0..outer)
            .map(|reach| (0..inner).map(|t| at(reach, t)).collect())
            .collect()
    };
    Ok(rows)
}
