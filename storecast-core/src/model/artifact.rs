//! Model artifacts: pre-trained coefficients persisted as TOML.
//!
//! ```toml
//! name = "sarimax_office"
//! interface = "date_range"
//! origin = "2014-01-01"
//! intercept = 1200.0
//! slope = 12.5
//! seasonality = [0.0, -40.0, 35.0, 0.0, 0.0, 0.0, 0.0, 0.0, 120.0, 0.0, 210.0, 260.0]
//! floor = 0.0
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::LinearSeasonalModel;

/// Which call shape the model is served through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelInterface {
    /// Explicit list of target dates.
    DateList,
    /// Inclusive start/end month range.
    DateRange,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid model artifact '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub name: String,
    pub interface: ModelInterface,
    /// Month the trend term is anchored at.
    pub origin: NaiveDate,
    pub intercept: f64,
    /// Trend increment per month.
    pub slope: f64,
    /// Twelve additive monthly offsets, January first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<Vec<f64>>,
    /// Lower clamp for predictions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
}

impl ModelArtifact {
    /// Load and validate an artifact from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate an artifact from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = toml::from_str(content)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        let invalid = |reason: String| ArtifactError::Invalid {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }
        if !self.intercept.is_finite() || !self.slope.is_finite() {
            return Err(invalid("intercept and slope must be finite".into()));
        }
        if let Some(season) = &self.seasonality {
            if season.len() != 12 {
                return Err(invalid(format!(
                    "seasonality needs 12 monthly offsets, got {}",
                    season.len()
                )));
            }
            if season.iter().any(|v| !v.is_finite()) {
                return Err(invalid("seasonality offsets must be finite".into()));
            }
        }
        if matches!(self.floor, Some(f) if !f.is_finite()) {
            return Err(invalid("floor must be finite".into()));
        }
        Ok(())
    }

    /// Materialize the model described by this artifact.
    pub fn to_model(&self) -> Result<LinearSeasonalModel, ArtifactError> {
        self.validate()?;
        let mut model =
            LinearSeasonalModel::new(self.name.clone(), self.origin, self.intercept, self.slope);
        if let Some(season) = &self.seasonality {
            let mut offsets = [0.0; 12];
            offsets.copy_from_slice(season);
            model = model.with_seasonality(offsets);
        }
        if let Some(floor) = self.floor {
            model = model.with_floor(floor);
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFICE: &str = r#"
name = "sarimax_office"
interface = "date_range"
origin = "2024-01-01"
intercept = 90.0
slope = 5.0
floor = 0.0
"#;

    #[test]
    fn parses_minimal_artifact() {
        let a = ModelArtifact::from_toml(OFFICE).unwrap();
        assert_eq!(a.interface, ModelInterface::DateRange);
        assert_eq!(a.origin, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let m = a.to_model().unwrap();
        assert_eq!(m.value_at(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), 100.0);
    }

    #[test]
    fn rejects_short_seasonality() {
        let content = format!("{OFFICE}seasonality = [1.0, 2.0]\n");
        let err = ModelArtifact::from_toml(&content).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid { .. }));
    }

    #[test]
    fn rejects_unknown_interface() {
        let content = OFFICE.replace("date_range", "dataframe");
        assert!(matches!(
            ModelArtifact::from_toml(&content),
            Err(ArtifactError::Parse(_))
        ));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("office.toml");
        std::fs::write(&path, OFFICE).unwrap();
        let a = ModelArtifact::from_file(&path).unwrap();
        assert_eq!(a.name, "sarimax_office");

        let missing = ModelArtifact::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ArtifactError::Read { .. })));
    }
}
