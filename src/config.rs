//! Loader and normalizer settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Header names of the registry columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub gender: String,
    pub name: String,
    pub year: String,
    pub department: String,
    pub count: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            gender: "sexe".to_string(),
            name: "preusuel".to_string(),
            year: "annais".to_string(),
            department: "dpt".to_string(),
            count: "nombre".to_string(),
        }
    }
}

/// Denominator used for the male/female shares of a decade bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareBasis {
    /// Every gender code present counts toward the total; shares may sum below 1.
    #[default]
    AllCodes,
    /// Only male and female counts form the total.
    KnownOnly,
}

/// Settings for reading and summarising a registry export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Field delimiter of delimited-text files.
    pub delimiter: char,
    pub columns: ColumnNames,
    /// Year placeholder used by the registry for undated births.
    pub unknown_year_token: String,
    /// Fail the whole load on the first unparseable count instead of dropping the row.
    pub strict_counts: bool,
    pub share_basis: ShareBasis,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            columns: ColumnNames::default(),
            unknown_year_token: "XXXX".to_string(),
            strict_counts: false,
            share_basis: ShareBasis::default(),
        }
    }
}

impl RegistryConfig {
    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The delimiter as a single byte, as the csv reader wants it.
    /// Non-ASCII delimiters fall back to `;`.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            log::warn!(
                "Delimiter {:?} is not ASCII, falling back to ';'",
                self.delimiter
            );
            b';'
        }
    }
}
