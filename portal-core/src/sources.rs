use std::fmt;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::Serialize;

use crate::error::CoreError;

/// Coarse column type inferred from a single sample value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "decimal")]
    Decimal,
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "varchar")]
    Varchar,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Boolean => "boolean",
            ColumnType::Varchar => "varchar",
        };
        write!(f, "{}", s)
    }
}

/// One column descriptor from a seed file.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: ColumnType,
    pub sample: String,
    pub nullable: bool,
}

/// Classify a sample value. Rules are ordered; first match wins.
pub fn infer_type(sample: &str) -> ColumnType {
    lazy_static! {
        static ref INTEGER_RE: Regex = Regex::new(r"^\d+$").unwrap();
        static ref DECIMAL_RE: Regex = Regex::new(r"^\d+\.\d+$").unwrap();
        static ref DATE_PREFIX_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap();
    }

    if INTEGER_RE.is_match(sample) {
        ColumnType::Integer
    } else if DECIMAL_RE.is_match(sample) {
        ColumnType::Decimal
    } else if DATE_PREFIX_RE.is_match(sample) {
        ColumnType::Timestamp
    } else if sample == "true" || sample == "false" {
        ColumnType::Boolean
    } else {
        ColumnType::Varchar
    }
}

/// Lists the source tables available in a seeds directory: every `.csv`
/// filename, with the extension stripped.
pub fn list_sources(dir: &Path) -> Result<Vec<String>, CoreError> {
    let entries = fs::read_dir(dir)
        .map_err(|_| CoreError::SourceNotFound(dir.display().to_string()))?;

    let mut tables = vec![];
    for entry in entries {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if let Some(table) = name.strip_suffix(".csv") {
            tables.push(table.to_owned());
        }
    }
    tables.sort();

    Ok(tables)
}

/// Reads column descriptors from a seed file: first line is the header,
/// second line a representative sample row.
///
/// Fields are split on bare commas; quoted fields containing commas are
/// not handled. This is a known limitation kept for compatibility with
/// the seed files the portal has always read.
pub fn describe_columns(csv_path: &Path) -> Result<Vec<ColumnInfo>, CoreError> {
    let content = fs::read_to_string(csv_path)
        .map_err(|_| CoreError::SourceNotFound(csv_path.display().to_string()))?;

    let mut lines = content.lines();
    let header = lines.next().unwrap_or("");
    let sample_row: Vec<&str> = lines
        .next()
        .map(|l| l.split(',').map(str::trim).collect())
        .unwrap_or_default();

    let columns = header
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(idx, name)| {
            let sample = sample_row.get(idx).copied().unwrap_or("");
            ColumnInfo {
                name: name.to_owned(),
                data_type: infer_type(sample),
                sample: sample.to_owned(),
                // seed files carry no constraint metadata
                nullable: true,
            }
        })
        .collect();

    Ok(columns)
}
