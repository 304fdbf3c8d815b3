//! Summary table CSV writer.
//!
//! Columns: `comid,timestamp,max,mean,color,thickness,ret_per`. Flows are
//! written with exactly two decimals.

use std::io;
use std::path::Path;

use crate::model::ClassifiedRow;

pub const HEADER: [&str; 7] = [
    "comid",
    "timestamp",
    "max",
    "mean",
    "color",
    "thickness",
    "ret_per",
];

/// Write the header and every row to `writer`.
pub fn write_rows<W: io::Write>(writer: W, rows: &[ClassifiedRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record([
            row.reach_id.to_string(),
            row.formatted_timestamp(),
            flow(row.max),
            flow(row.mean),
            row.color.to_string(),
            row.thickness.to_string(),
            row.return_period.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Two-decimal flow; a rounded-away negative zero prints as `0.00`.
fn flow(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

/// Write the table to a file, replacing any previous table.
pub fn write_csv(path: &Path, rows: &[ClassifiedRow]) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_rows(io::BufWriter::new(file), rows)
}

/// File name of the summary table of a forecast directory:
/// `<prefix>_<watershed>_<forecast date without dots>.csv`.
///
/// A forecast directory `.../south_asia-geoglows/20200528.00` yields
/// `summary_table_south_asia-geoglows_2020052800.csv`.
pub fn summary_file_name(prefix: &str, watershed: &str, forecast_dir: &Path) -> Option<String> {
    let date = forecast_dir.file_name()?.to_str()?.replace('.', "");
    Some(format!("{}_{}_{}.csv", prefix, watershed, date))
}
