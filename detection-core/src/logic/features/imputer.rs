//! Simple imputer
//!
//! Per-column fill statistics learned offline (mean, median or most frequent).
//! The statistic's type also fixes the column's runtime type: a numeric fill
//! rule only accepts numbers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::pipeline::PreprocessingError;
use super::record::RawValue;
use crate::logic::artifact::{self, ArtifactError};

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

/// Cell after imputation; no missing marker can remain
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Uniform textual form used by the encoder.
    ///
    /// Integral numbers keep one decimal (`3` → `"3.0"`) so categories fit on
    /// float columns still match their stored labels.
    pub fn to_category(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 => {
                format!("{:.1}", n)
            }
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl From<&FillValue> for Cell {
    fn from(fill: &FillValue) -> Self {
        match fill {
            FillValue::Number(n) => Cell::Number(*n),
            FillValue::Text(s) => Cell::Text(s.clone()),
        }
    }
}

/// Fitted imputer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    /// Informational: "mean", "median", "most_frequent"
    #[serde(default)]
    pub strategy: String,
    /// Column names seen at fit time, when the exporter recorded them
    #[serde(default)]
    pub columns: Vec<String>,
    /// One statistic per column, schema order
    pub statistics: Vec<FillValue>,
}

impl SimpleImputer {
    pub fn new(strategy: impl Into<String>, columns: Vec<String>, statistics: Vec<FillValue>) -> Self {
        Self {
            strategy: strategy.into(),
            columns,
            statistics,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        artifact::read_json(path)
    }

    pub fn width(&self) -> usize {
        self.statistics.len()
    }

    /// Fill or pass through one cell of column `index`
    pub fn impute(&self, index: usize, field: &str, raw: &RawValue) -> Result<Cell, PreprocessingError> {
        let fill = self
            .statistics
            .get(index)
            .ok_or(PreprocessingError::WidthMismatch {
                expected: self.statistics.len(),
                actual: index + 1,
            })?;

        match (raw, fill) {
            (RawValue::Unsupported(found), _) => Err(PreprocessingError::UnsupportedValue {
                field: field.to_string(),
                found,
            }),
            (RawValue::Missing, fill) => Ok(Cell::from(fill)),
            (RawValue::Number(n), _) => Ok(Cell::Number(*n)),
            (RawValue::Text(s), FillValue::Text(_)) => Ok(Cell::Text(s.clone())),
            (RawValue::Text(s), FillValue::Number(_)) => Err(PreprocessingError::NonNumeric {
                field: field.to_string(),
                value: s.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imputer() -> SimpleImputer {
        SimpleImputer::new(
            "most_frequent",
            vec!["amt".into(), "kind".into()],
            vec![FillValue::Number(12.5), FillValue::Text("W".into())],
        )
    }

    #[test]
    fn test_missing_takes_statistic() {
        let imp = imputer();
        assert_eq!(imp.impute(0, "amt", &RawValue::Missing).unwrap(), Cell::Number(12.5));
        assert_eq!(imp.impute(1, "kind", &RawValue::Missing).unwrap(), Cell::Text("W".into()));
    }

    #[test]
    fn test_text_in_numeric_column_fails() {
        let err = imputer()
            .impute(0, "amt", &RawValue::Text("lots".into()))
            .unwrap_err();
        assert_eq!(err.field(), Some("amt"));
    }

    #[test]
    fn test_unsupported_value_fails_with_field() {
        let err = imputer()
            .impute(1, "kind", &RawValue::Unsupported("array"))
            .unwrap_err();
        assert!(matches!(err, PreprocessingError::UnsupportedValue { found: "array", .. }));
        assert_eq!(err.field(), Some("kind"));
    }

    #[test]
    fn test_number_in_text_column_passes() {
        let cell = imputer().impute(1, "kind", &RawValue::Number(3.0)).unwrap();
        assert_eq!(cell.to_category(), "3.0");
    }

    #[test]
    fn test_category_text_forms() {
        assert_eq!(Cell::Number(150.0).to_category(), "150.0");
        assert_eq!(Cell::Number(0.25).to_category(), "0.25");
        assert_eq!(Cell::Text("visa".into()).to_category(), "visa");
    }

    #[test]
    fn test_deserialize_mixed_statistics() {
        let imp: SimpleImputer =
            serde_json::from_str(r#"{"strategy": "most_frequent", "statistics": [1.5, "C"]}"#).unwrap();
        assert_eq!(imp.width(), 2);
        assert_eq!(imp.statistics[1], FillValue::Text("C".into()));
        assert!(imp.columns.is_empty());
    }
}
