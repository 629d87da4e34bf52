//! Line-oriented readers and writers.
//!
//! - preferences: `user<TAB>item[<TAB>value]`, value defaults to 1.0
//! - features: `item<TAB>feature[<TAB>weight]`, weight defaults to 1.0
//! - recommendations: one JSON object per line
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::error::{DataError, DataResult};
use crate::feature::SimpleFeatureData;
use crate::preference::{PreferenceData, SimplePreferenceData};
use crate::recommendation::{Id, Recommendation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Load preference triples from a tab-separated file.
pub fn load_preferences<U, I>(path: impl AsRef<Path>) -> DataResult<SimplePreferenceData<U, I>>
where
    U: Id + FromStr,
    I: Id + FromStr,
    U::Err: Display,
    I::Err: Display,
{
    let path = path.as_ref();
    let reader = open(path)?;
    let data = parse_preferences(reader, &path.display().to_string())?;
    debug!(
        path = %path.display(),
        users = data.num_users(),
        preferences = data.num_preferences(),
        "Loaded preference data"
    );
    Ok(data)
}

/// Load item features from a tab-separated file.
pub fn load_features<I, F>(path: impl AsRef<Path>) -> DataResult<SimpleFeatureData<I, F>>
where
    I: Id + FromStr,
    F: Id + FromStr,
    I::Err: Display,
    F::Err: Display,
{
    let path = path.as_ref();
    let reader = open(path)?;
    let data = parse_features(reader, &path.display().to_string())?;
    debug!(
        path = %path.display(),
        items = data.num_items(),
        "Loaded feature data"
    );
    Ok(data)
}

/// Read a JSON-lines recommendation file.
pub fn read_recommendations<U, I>(path: impl AsRef<Path>) -> DataResult<Vec<Recommendation<U, I>>>
where
    U: DeserializeOwned,
    I: DeserializeOwned,
{
    let path = path.as_ref();
    let reader = open(path)?;
    parse_recommendations(reader, &path.display().to_string())
}

/// Write recommendations as JSON lines, replacing the file.
pub fn write_recommendations<U, I>(
    path: impl AsRef<Path>,
    recommendations: &[Recommendation<U, I>],
) -> DataResult<()>
where
    U: Serialize,
    I: Serialize,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| DataError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for recommendation in recommendations {
        serde_json::to_writer(&mut writer, recommendation)?;
        writer.write_all(b"\n").map_err(|e| DataError::io(path, e))?;
    }
    writer.flush().map_err(|e| DataError::io(path, e))?;
    Ok(())
}

/// Parse tab-separated `user<TAB>item[<TAB>value]` records.
pub fn parse_preferences<U, I>(
    reader: impl BufRead,
    source: &str,
) -> DataResult<SimplePreferenceData<U, I>>
where
    U: Id + FromStr,
    I: Id + FromStr,
    U::Err: Display,
    I::Err: Display,
{
    let mut data = SimplePreferenceData::new();
    for_each_record(reader, source, |line_no, fields| {
        let (user, item, value) = parse_triple::<U, I>(source, line_no, fields)?;
        data.add(user, item, value);
        Ok(())
    })?;
    Ok(data)
}

/// Parse tab-separated `item<TAB>feature[<TAB>weight]` records.
pub fn parse_features<I, F>(reader: impl BufRead, source: &str) -> DataResult<SimpleFeatureData<I, F>>
where
    I: Id + FromStr,
    F: Id + FromStr,
    I::Err: Display,
    F::Err: Display,
{
    let mut data = SimpleFeatureData::new();
    for_each_record(reader, source, |line_no, fields| {
        let (item, feature, weight) = parse_triple::<I, F>(source, line_no, fields)?;
        data.add(item, feature, weight);
        Ok(())
    })?;
    Ok(data)
}

/// Parse JSON-lines recommendations.
pub fn parse_recommendations<U, I>(
    reader: impl BufRead,
    source: &str,
) -> DataResult<Vec<Recommendation<U, I>>>
where
    U: DeserializeOwned,
    I: DeserializeOwned,
{
    let mut recommendations = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DataError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let recommendation = serde_json::from_str(trimmed)
            .map_err(|e| DataError::malformed(source, idx + 1, e.to_string()))?;
        recommendations.push(recommendation);
    }
    Ok(recommendations)
}

fn open(path: &Path) -> DataResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| DataError::io(path, e))
}

fn for_each_record<R, G>(reader: R, source: &str, mut on_record: G) -> DataResult<()>
where
    R: BufRead,
    G: FnMut(usize, Vec<&str>) -> DataResult<()>,
{
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DataError::io(source, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        on_record(idx + 1, trimmed.split('\t').collect())?;
    }
    Ok(())
}

fn parse_triple<A, B>(source: &str, line_no: usize, fields: Vec<&str>) -> DataResult<(A, B, f64)>
where
    A: FromStr,
    B: FromStr,
    A::Err: Display,
    B::Err: Display,
{
    if fields.len() < 2 || fields.len() > 3 {
        return Err(DataError::malformed(
            source,
            line_no,
            format!("expected 2 or 3 tab-separated fields, got {}", fields.len()),
        ));
    }

    let first = fields[0]
        .parse::<A>()
        .map_err(|e| DataError::malformed(source, line_no, e.to_string()))?;
    let second = fields[1]
        .parse::<B>()
        .map_err(|e| DataError::malformed(source, line_no, e.to_string()))?;
    let value = match fields.get(2) {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|e| DataError::malformed(source, line_no, format!("bad value {raw:?}: {e}")))?,
        None => 1.0,
    };

    Ok((first, second, value))
}
