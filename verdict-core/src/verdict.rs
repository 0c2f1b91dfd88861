//! Verdict marker classification.
//!
//! Only the first marker in a comment counts. A comment reading
//! "NTA, though some would say YTA" is a `NotAsshole` verdict.

use crate::error::ConfigError;
use crate::types::VerdictCategory;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Default markers. `NAH` and `ESH` are recognised but resolve to no category.
pub const DEFAULT_MARKERS: [(&str, Option<VerdictCategory>); 4] = [
    ("YTA", Some(VerdictCategory::Asshole)),
    ("NTA", Some(VerdictCategory::NotAsshole)),
    ("NAH", None),
    ("ESH", None),
];

#[derive(Debug, Clone)]
pub struct VerdictClassifier {
    pattern: Regex,
    markers: HashMap<String, Option<VerdictCategory>>,
}

impl Default for VerdictClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_MARKERS
                .iter()
                .map(|(marker, category)| (marker.to_string(), *category)),
        )
        .expect("default verdict markers are valid")
    }
}

impl VerdictClassifier {
    /// Builds a classifier from marker spellings. Markers are matched as whole
    /// words, case-insensitively; several markers may share a category.
    pub fn new<I>(markers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, Option<VerdictCategory>)>,
    {
        let mut table = HashMap::new();
        for (marker, category) in markers {
            let marker = marker.trim().to_uppercase();
            if marker.is_empty() || !marker.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidValue {
                    field: "verdict_markers".to_string(),
                    value: marker,
                });
            }
            table.insert(marker, category);
        }

        if table.is_empty() {
            return Err(ConfigError::MissingField {
                field: "verdict_markers".to_string(),
            });
        }

        let mut alternatives: Vec<&str> = table.keys().map(String::as_str).collect();
        alternatives.sort_unstable();
        let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
        let pattern = Regex::new(&pattern).map_err(|e| ConfigError::InvalidValue {
            field: "verdict_markers".to_string(),
            value: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            markers: table,
        })
    }

    /// The first marker occurring in `body`, as written.
    pub fn first_marker<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.pattern.find(body).map(|m| m.as_str())
    }

    /// Category of the first marker in `body`, if that marker maps to one.
    pub fn classify(&self, body: &str) -> Option<VerdictCategory> {
        let marker = self.first_marker(body)?.to_uppercase();
        debug!("Judgment found: {}", marker);
        self.markers.get(&marker).copied().flatten()
    }
}
