//! Product categories: the three independently forecast product segments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Product category. Declaration order is the fixed column order of every
/// consolidated table and summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Furniture,
    Office,
    Technology,
}

impl Category {
    /// All categories in column order.
    pub const ALL: [Category; 3] = [Category::Furniture, Category::Office, Category::Technology];

    /// Column label used in tables and exports.
    pub fn label(self) -> &'static str {
        match self {
            Category::Furniture => "Furniture",
            Category::Office => "Office",
            Category::Technology => "Technology",
        }
    }

    /// Long human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Furniture => "Furniture",
            Category::Office => "Office Supplies",
            Category::Technology => "Technology",
        }
    }

    /// Column index in `ALL`.
    pub fn index(self) -> usize {
        match self {
            Category::Furniture => 0,
            Category::Office => 1,
            Category::Technology => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category '{0}' (expected furniture, office or technology)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "furniture" => Ok(Category::Furniture),
            "office" | "office supplies" => Ok(Category::Office),
            "technology" | "tech" => Ok(Category::Technology),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("Office Supplies".parse::<Category>(), Ok(Category::Office));
        assert_eq!("office_supplies".parse::<Category>(), Ok(Category::Office));
        assert_eq!("TECH".parse::<Category>(), Ok(Category::Technology));
        assert!("garden".parse::<Category>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::Technology).unwrap();
        assert_eq!(json, "\"technology\"");
    }
}
