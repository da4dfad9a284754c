use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};

use model::{Sample, TraceError, TraceProcessor};

/// Fractional seconds are optional
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// How a trace file is laid out
#[derive(Clone, Debug, PartialEq)]
pub struct TraceFormat {
    pub delimiter: u8,
    /// The column holding timestamps. If None, it's the first column, whatever it's called.
    pub time_column: Option<String>,
}

impl Default for TraceFormat {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            time_column: None,
        }
    }
}

/// Reads a header row, then one sample per record. `x` and `y` columns are required; anything
/// else is ignored.
pub fn load_trace<R: std::io::Read>(reader: R, format: &TraceFormat) -> Result<TraceProcessor> {
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        // A trailing delimiter makes an extra, empty column
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let time_idx = match format.time_column {
        Some(ref name) => find_column(&headers, name)?,
        None => 0,
    };
    let x_idx = find_column(&headers, "x")?;
    let y_idx = find_column(&headers, "y")?;

    let mut samples = Vec::new();
    for rec in reader.records() {
        let rec = rec?;
        let line = rec.position().map(|pos| pos.line()).unwrap_or(0);

        let raw_time = get_field(&rec, time_idx, line)?;
        let time = NaiveDateTime::parse_from_str(raw_time, TIMESTAMP_FORMAT).map_err(|err| {
            TraceError::malformed(format!("line {line}: bad timestamp {raw_time:?}: {err}"))
        })?;
        let x = parse_coordinate(&rec, x_idx, "x", line)?;
        let y = parse_coordinate(&rec, y_idx, "y", line)?;
        samples.push(Sample::new(time, x, y));
    }
    debug!("Read {} samples", samples.len());

    Ok(TraceProcessor::new(samples)?)
}

pub fn load_trace_file<P: AsRef<Path>>(path: P, format: &TraceFormat) -> Result<TraceProcessor> {
    let path = path.as_ref();
    let trace = load_trace(crate::open(path)?, format)?;
    info!("Loaded {} samples from {}", trace.len(), path.display());
    Ok(trace)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, TraceError> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| {
            TraceError::malformed(format!("no {name} column; the header is {:?}", headers))
        })
}

fn get_field<'a>(rec: &'a StringRecord, idx: usize, line: u64) -> Result<&'a str, TraceError> {
    rec.get(idx)
        .map(|field| field.trim())
        .ok_or_else(|| TraceError::malformed(format!("line {line} only has {} fields", rec.len())))
}

fn parse_coordinate(
    rec: &StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<f64, TraceError> {
    let raw = get_field(rec, idx, line)?;
    if raw.is_empty() {
        return Err(TraceError::malformed(format!("line {line} is missing {name}")));
    }
    raw.parse::<f64>()
        .map_err(|err| TraceError::malformed(format!("line {line}: bad {name} {raw:?}: {err}")))
}
