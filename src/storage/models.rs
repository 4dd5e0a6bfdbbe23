//! Database models and types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A single JavaScript resource known to the run.
///
/// Maps to the `assets` table. There is exactly one row per `remote_url`; a
/// row is created pending (`success = false`) when first claimed and is set
/// successful at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Asset {
    /// Local file name inside the namespace directory (`<tag>.<file name>`)
    pub alias: String,
    /// Original file name taken from the URL path
    pub name: String,
    pub remote_url: String,
    /// Snippet that produced this URL; `None` for seeds
    pub lineage_id: Option<i64>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub created_at_ms: i64,
}

/// How a loader snippet was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Syntax-tree search
    Structural,
    /// Regex fallback over the raw text
    Regex,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Structural => "structural",
            ExtractionMethod::Regex => "regex",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structural" => Ok(ExtractionMethod::Structural),
            "regex" => Ok(ExtractionMethod::Regex),
            other => Err(format!("unknown extraction method '{other}'")),
        }
    }
}

/// A recovered chunk-loader fragment (lineage node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub id: i64,
    pub asset_alias: String,
    pub parameter: String,
    pub code: String,
    pub method: ExtractionMethod,
}

impl<'r> FromRow<'r, SqliteRow> for Snippet {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let method: String = row.try_get("method")?;
        let method = method
            .parse::<ExtractionMethod>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "method".to_string(),
                source: e.into(),
            })?;
        Ok(Snippet {
            id: row.try_get("id")?,
            asset_alias: row.try_get("asset_alias")?,
            parameter: row.try_get("parameter")?,
            code: row.try_get("code")?,
            method,
        })
    }
}

/// Row counts of the namespace store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    /// Every claimed asset, pending or not
    pub assets_discovered: i64,
    pub assets_downloaded: i64,
    /// Assets with a recorded failure reason
    pub assets_failed: i64,
    pub snippets_recovered: i64,
}
