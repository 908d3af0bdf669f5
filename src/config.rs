//! Store configuration.
//!
//! Mark ranges and the average scale are explicit settings rather than
//! constants baked into the loaders. Configuration is plain JSON:
//!
//! ```json
//! { "strictness": "lenient", "average_scale": "out_of_fifty_times_ten" }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MarksError, Result};
use crate::record::AverageScale;
use crate::table::{Delimiter, Schema};

/// Decimal places used when numbers are written to text tables
pub const DEFAULT_DECIMAL_PLACES: usize = 2;

const MAX_DECIMAL_PLACES: usize = 10;

/// Inclusive range of accepted marks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkRange {
    pub min: f64,
    pub max: f64,
}

impl MarkRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl std::fmt::Display for MarkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} and {}", self.min, self.max)
    }
}

/// What happens when a stored cell cannot be read as the expected type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Bad cells fail the read with a validation error
    #[default]
    Strict,
    /// Bad cells read as `0.0` or `""` and a warning is logged
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Column layout; detected from the header when unset
    pub schema: Option<Schema>,
    /// Text delimiter; picked from the file extension when unset
    pub delimiter: Option<Delimiter>,
    pub strictness: Strictness,
    /// Range a stored exam mark must fall in to be read
    pub stored_range: MarkRange,
    /// Range a newly entered exam mark must fall in
    pub input_range: MarkRange,
    pub aat_range: MarkRange,
    pub average_scale: AverageScale,
    pub decimal_places: usize,
    /// Regex every USN must match under strict reads
    pub usn_pattern: Option<String>,
    /// Refuse to save when the file changed on disk since it was loaded
    pub verify_checksum: bool,
    pub backup_on_save: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            schema: None,
            delimiter: None,
            strictness: Strictness::Strict,
            stored_range: MarkRange::new(0.0, 100.0),
            input_range: MarkRange::new(0.0, 50.0),
            aat_range: MarkRange::new(0.0, 50.0),
            average_scale: AverageScale::default(),
            decimal_places: DEFAULT_DECIMAL_PLACES,
            usn_pattern: None,
            verify_checksum: true,
            backup_on_save: false,
        }
    }
}

impl StoreConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(text)
            .map_err(|e| MarksError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MarksError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn lenient(mut self) -> Self {
        self.strictness = Strictness::Lenient;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("stored_range", self.stored_range),
            ("input_range", self.input_range),
            ("aat_range", self.aat_range),
        ] {
            if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                return Err(MarksError::Config(format!(
                    "{} must be a finite range with min <= max, got {} to {}",
                    name, range.min, range.max
                )));
            }
        }

        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(MarksError::Config(format!(
                "decimal_places must be at most {}, got {}",
                MAX_DECIMAL_PLACES, self.decimal_places
            )));
        }

        if let Some(ref pattern) = self.usn_pattern {
            Regex::new(pattern).map_err(|e| {
                MarksError::Config(format!("Invalid usn_pattern '{}': {}", pattern, e))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.strictness, Strictness::Strict);
        assert_eq!(config.stored_range, MarkRange::new(0.0, 100.0));
        assert_eq!(config.input_range, MarkRange::new(0.0, 50.0));
        assert_eq!(config.average_scale, AverageScale::OutOfFifty);
        assert_eq!(config.decimal_places, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = StoreConfig::from_json_str(
            r#"{"strictness": "lenient", "schema": "final", "average_scale": "out_of_fifty_times_ten"}"#,
        )
        .unwrap();
        assert_eq!(config.strictness, Strictness::Lenient);
        assert_eq!(config.schema, Some(Schema::Final));
        assert_eq!(config.average_scale, AverageScale::OutOfFiftyTimesTen);
        assert_eq!(config.decimal_places, 2);
        assert!(config.verify_checksum);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let result = StoreConfig::from_json_str(r#"{"input_range": {"min": 50, "max": 0}}"#);
        assert!(matches!(result, Err(MarksError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_pattern() {
        let config = StoreConfig {
            usn_pattern: Some("([".to_string()),
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(MarksError::Config(_))));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = MarkRange::new(0.0, 50.0);
        assert!(range.contains(0.0));
        assert!(range.contains(50.0));
        assert!(!range.contains(50.01));
        assert!(!range.contains(f64::NAN));
    }
}
