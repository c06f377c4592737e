use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use csv::Trim;
use csv::Writer;
use nalgebra::DMatrix;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::series::MultivariateSeries;
use crate::error::Result;
use crate::error::VarError;

pub const DATE_COLUMN: &str = "Date";
const VALUE_COLUMN: &str = "Value";
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    .ok_or_else(|| VarError::Parse {
      column: DATE_COLUMN.into(),
      value: raw.into(),
      reason: "expected MM/DD/YYYY or YYYY-MM-DD".into(),
    })
}

/// Reads a `Date` column plus numeric value columns.
///
/// Rows are sorted by date; empty cells are reported as [`VarError::MissingValue`]
/// since the engine expects pre-cleaned input.
pub fn read_series<P: AsRef<Path>>(path: P) -> Result<MultivariateSeries> {
  let path = path.as_ref();
  let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
  let headers = reader.headers()?.clone();

  let date_idx = headers
    .iter()
    .position(|h| h == DATE_COLUMN)
    .ok_or_else(|| VarError::Schema(format!("{} has no '{DATE_COLUMN}' column", path.display())))?;
  let value_cols: Vec<(usize, String)> = headers
    .iter()
    .enumerate()
    .filter(|(i, _)| *i != date_idx)
    .map(|(i, h)| (i, h.to_string()))
    .collect();
  if value_cols.is_empty() {
    return Err(VarError::Schema(format!(
      "{} has no value columns",
      path.display()
    )));
  }

  let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
  for (row, record) in reader.records().enumerate() {
    let record = record?;
    let date = parse_date(record.get(date_idx).unwrap_or_default())?;
    let mut values = Vec::with_capacity(value_cols.len());
    for (idx, name) in &value_cols {
      let raw = record.get(*idx).unwrap_or_default();
      if raw.is_empty() {
        return Err(VarError::MissingValue {
          column: name.clone(),
          row: row + 1,
        });
      }
      let v = raw.parse::<f64>().map_err(|e| VarError::Parse {
        column: name.clone(),
        value: raw.into(),
        reason: e.to_string(),
      })?;
      values.push(v);
    }
    rows.push((date, values));
  }
  rows.sort_by_key(|(d, _)| *d);

  let nobs = rows.len();
  let nvars = value_cols.len();
  let values = DMatrix::from_fn(nobs, nvars, |r, c| rows[r].1[c]);
  let dates = rows.into_iter().map(|(d, _)| d).collect();
  let names = value_cols.into_iter().map(|(_, n)| n).collect();

  debug!(path = %path.display(), nobs, nvars, "read series");
  MultivariateSeries::new(dates, names, values)
}

/// Reads a single-variable file, renaming a generic `Value` column to the file stem.
pub fn read_value_file<P: AsRef<Path>>(path: P) -> Result<MultivariateSeries> {
  let path = path.as_ref();
  let series = read_series(path)?;
  if series.names() != [VALUE_COLUMN] {
    return Ok(series);
  }
  let stem = path
    .file_stem()
    .and_then(|s| s.to_str())
    .ok_or_else(|| VarError::Schema(format!("cannot derive a name from {}", path.display())))?;
  MultivariateSeries::new(
    series.dates().to_vec(),
    vec![stem.to_string()],
    series.values().clone(),
  )
}

/// Inner-joins series on their dates.
///
/// Dates missing from any input are dropped; the variable names of all inputs
/// must be distinct.
pub fn merge_on_date(frames: &[MultivariateSeries]) -> Result<MultivariateSeries> {
  let Some(first) = frames.first() else {
    return Err(VarError::InvalidArgument("nothing to merge".into()));
  };

  let mut common: BTreeSet<NaiveDate> = first.dates().iter().copied().collect();
  for frame in &frames[1..] {
    let dates: BTreeSet<NaiveDate> = frame.dates().iter().copied().collect();
    common = common.intersection(&dates).copied().collect();
  }

  for frame in frames {
    let dropped = frame.nobs() - common.len();
    if dropped > 0 {
      warn!(
        variables = ?frame.names(),
        dropped,
        "dropping rows without a match in every input"
      );
    }
  }

  let dates: Vec<NaiveDate> = common.into_iter().collect();
  let nvars: usize = frames.iter().map(|f| f.nvars()).sum();
  let mut values = DMatrix::zeros(dates.len(), nvars);
  let mut names = Vec::with_capacity(nvars);
  let mut offset = 0;

  for frame in frames {
    let lookup: HashMap<NaiveDate, usize> = frame
      .dates()
      .iter()
      .enumerate()
      .map(|(i, d)| (*d, i))
      .collect();
    for (r, date) in dates.iter().enumerate() {
      let src = lookup[date];
      for c in 0..frame.nvars() {
        values[(r, offset + c)] = frame.values()[(src, c)];
      }
    }
    names.extend(frame.names().iter().cloned());
    offset += frame.nvars();
  }

  info!(nobs = dates.len(), nvars, "merged series on date");
  MultivariateSeries::new(dates, names, values)
}

/// Writes `Date,<var1>,…` with ISO dates.
pub fn write_series<P: AsRef<Path>>(path: P, series: &MultivariateSeries) -> Result<()> {
  let mut writer = Writer::from_path(path.as_ref())?;

  let mut header = Vec::with_capacity(series.nvars() + 1);
  header.push(DATE_COLUMN.to_string());
  header.extend(series.names().iter().cloned());
  writer.write_record(&header)?;

  for (r, date) in series.dates().iter().enumerate() {
    let mut record = Vec::with_capacity(series.nvars() + 1);
    record.push(date.format(OUTPUT_DATE_FORMAT).to_string());
    for c in 0..series.nvars() {
      record.push(series.values()[(r, c)].to_string());
    }
    writer.write_record(&record)?;
  }

  writer.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn reads_us_style_dates_and_sorts_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cpi.csv");
    fs::write(&path, "Date,cpi,ip\n06/01/2001,2.0,20.0\n03/01/2001,1.0,10.0\n").unwrap();

    let s = read_series(&path).unwrap();
    assert_eq!(s.nobs(), 2);
    assert_eq!(s.dates()[0], NaiveDate::from_ymd_opt(2001, 3, 1).unwrap());
    assert_eq!(s.column("ip").unwrap()[1], 20.0);
  }

  #[test]
  fn missing_cell_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gap.csv");
    fs::write(&path, "Date,a\n2001-01-01,1.0\n2001-04-01,\n").unwrap();

    let err = read_series(&path).unwrap_err();
    assert!(matches!(err, VarError::MissingValue { row: 2, .. }), "{err}");
  }

  #[test]
  fn missing_date_column_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodate.csv");
    fs::write(&path, "when,a\n2001-01-01,1.0\n").unwrap();

    assert!(matches!(read_series(&path), Err(VarError::Schema(_))));
  }

  #[test]
  fn value_column_takes_file_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("US CPI SA.csv");
    fs::write(&path, "Date,Value\n01/01/2001,1.5\n").unwrap();

    let s = read_value_file(&path).unwrap();
    assert_eq!(s.names(), &["US CPI SA".to_string()]);
  }

  #[test]
  fn merge_keeps_only_shared_dates() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    fs::write(&a, "Date,Value\n01/01/2001,1\n04/01/2001,2\n07/01/2001,3\n").unwrap();
    fs::write(&b, "Date,Value\n04/01/2001,20\n07/01/2001,30\n10/01/2001,40\n").unwrap();

    let merged =
      merge_on_date(&[read_value_file(&a).unwrap(), read_value_file(&b).unwrap()]).unwrap();
    assert_eq!(merged.names(), &["a".to_string(), "b".to_string()]);
    assert_eq!(merged.nobs(), 2);
    assert_eq!(merged.values()[(0, 0)], 2.0);
    assert_eq!(merged.values()[(1, 1)], 30.0);
  }

  #[test]
  fn written_series_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("in.csv");
    let out = dir.path().join("out.csv");
    fs::write(&src, "Date,x,y\n2001-01-01,0.1,-3\n2001-04-01,0.25,4.5\n").unwrap();

    let s = read_series(&src).unwrap();
    write_series(&out, &s).unwrap();
    assert_eq!(read_series(&out).unwrap(), s);
  }
}
