//! Product categories.
//!
//! The catalog carries a fixed set of agricultural categories. Wire values
//! match the display labels stored on product documents (e.g. "Sunflower
//! Oil"), so the serde names use the human-readable spelling.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown category label.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct CategoryError(pub String);

/// A product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Rice,
    Groundnuts,
    #[serde(rename = "Sunflower Oil")]
    SunflowerOil,
    #[serde(rename = "Groundnut Oil")]
    GroundnutOil,
}

impl Category {
    /// All categories, in catalog display order.
    pub const ALL: [Self; 4] = [
        Self::Rice,
        Self::Groundnuts,
        Self::SunflowerOil,
        Self::GroundnutOil,
    ];

    /// The display label, as stored on product documents.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Rice => "Rice",
            Self::Groundnuts => "Groundnuts",
            Self::SunflowerOil => "Sunflower Oil",
            Self::GroundnutOil => "Groundnut Oil",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = CategoryError;

    /// Parse a category label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CategoryError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&Category::SunflowerOil).expect("serialize");
        assert_eq!(json, "\"Sunflower Oil\"");

        let back: Category = serde_json::from_str("\"Groundnut Oil\"").expect("deserialize");
        assert_eq!(back, Category::GroundnutOil);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("rice".parse::<Category>().expect("parse"), Category::Rice);
        assert_eq!(
            "SUNFLOWER OIL".parse::<Category>().expect("parse"),
            Category::SunflowerOil
        );
        assert!("Mangoes".parse::<Category>().is_err());
    }
}
