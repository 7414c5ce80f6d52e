//! Pipeline configuration loaded from TOML.
//!
//! ```toml
//! [pipeline]
//! alignment = "union"
//! model_timeout_secs = 30
//! default_horizon = 6
//!
//! [columns]
//! date = "Order Date"
//! sales = "Sales"
//!
//! [categories.furniture]
//! history = "data/furniture_data.csv"
//! model = "models/furniture.toml"
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storecast_core::data::CsvColumns;
use storecast_core::model::ArtifactError;
use storecast_core::{AlignmentPolicy, Category};
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HORIZON: usize = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("model artifact for {category}: {source}")]
    Model {
        category: Category,
        #[source]
        source: ArtifactError,
    },
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Column names shared by every history file unless overridden.
    #[serde(default)]
    pub columns: CsvColumns,

    pub categories: CategorySources,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    #[serde(default)]
    pub alignment: AlignmentPolicy,
    #[serde(default = "default_timeout_secs")]
    pub model_timeout_secs: u64,
    #[serde(default = "default_horizon")]
    pub default_horizon: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            alignment: AlignmentPolicy::default(),
            model_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_horizon: DEFAULT_HORIZON,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

/// One entry per category; all three are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySources {
    pub furniture: CategorySource,
    pub office: CategorySource,
    pub technology: CategorySource,
}

impl CategorySources {
    pub fn get(&self, category: Category) -> &CategorySource {
        match category {
            Category::Furniture => &self.furniture,
            Category::Office => &self.office,
            Category::Technology => &self.technology,
        }
    }

    /// Entries in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategorySource)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Where one category's history and model live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySource {
    pub history: PathBuf,
    pub model: PathBuf,
    /// Per-file column names, overriding the top-level `[columns]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<CsvColumns>,
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    /// Parse and validate TOML. Relative paths resolve against the working directory.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.model_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.model_timeout_secs must be positive".into(),
            ));
        }
        if self.pipeline.default_horizon == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.default_horizon must be positive".into(),
            ));
        }
        for (category, source) in self.categories.iter() {
            let key = category.label().to_ascii_lowercase();
            if source.history.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "categories.{key}.history is empty"
                )));
            }
            if source.model.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "categories.{key}.model is empty"
                )));
            }
            let columns = self.columns_for(category);
            if columns.date.trim().is_empty() || columns.sales.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "column names for {category} must not be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.model_timeout_secs)
    }

    pub fn columns_for(&self, category: Category) -> &CsvColumns {
        self.categories
            .get(category)
            .columns
            .as_ref()
            .unwrap_or(&self.columns)
    }

    pub fn history_path(&self, category: Category) -> PathBuf {
        self.resolve_path(&self.categories.get(category).history)
    }

    pub fn model_path(&self, category: Category) -> PathBuf {
        self.resolve_path(&self.categories.get(category).model)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[categories.furniture]
history = "data/furniture.csv"
model = "models/furniture.toml"

[categories.office]
history = "data/office.csv"
model = "models/office.toml"

[categories.technology]
history = "/abs/technology.csv"
model = "models/technology.toml"
"#;

    #[test]
    fn defaults_apply_when_sections_are_missing() {
        let config = PipelineConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.pipeline.alignment, AlignmentPolicy::Union);
        assert_eq!(config.model_timeout(), Duration::from_secs(30));
        assert_eq!(config.pipeline.default_horizon, 6);
        assert_eq!(config.columns, CsvColumns::default());
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let config = PipelineConfig::from_toml(MINIMAL)
            .unwrap()
            .with_base_dir("/srv/storecast");
        assert_eq!(
            config.history_path(Category::Furniture),
            PathBuf::from("/srv/storecast/data/furniture.csv")
        );
        assert_eq!(
            config.history_path(Category::Technology),
            PathBuf::from("/abs/technology.csv")
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let content = format!("[pipeline]\nmodel_timeout_secs = 0\n{MINIMAL}");
        let err = PipelineConfig::from_toml(&content).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_category_is_a_parse_error() {
        let content = r#"
[categories.furniture]
history = "f.csv"
model = "f.toml"
"#;
        assert!(matches!(
            PipelineConfig::from_toml(content),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn per_category_columns_override_defaults() {
        let content = MINIMAL.replace(
            "model = \"models/office.toml\"",
            "model = \"models/office.toml\"\ncolumns = { date = \"ds\", sales = \"y\" }",
        );
        let config = PipelineConfig::from_toml(&content).unwrap();
        assert_eq!(config.columns_for(Category::Office).date, "ds");
        assert_eq!(config.columns_for(Category::Furniture).date, "Order Date");
    }

    #[test]
    fn intersection_alignment_parses() {
        let content = format!("[pipeline]\nalignment = \"intersection\"\n{MINIMAL}");
        let config = PipelineConfig::from_toml(&content).unwrap();
        assert_eq!(config.pipeline.alignment, AlignmentPolicy::Intersection);
    }
}
