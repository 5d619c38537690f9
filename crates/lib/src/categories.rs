//! # Spot Categories
//!
//! Every spot belongs to exactly one of three categories, and the category
//! decides which slot of a trip it can fill (main destination, meal or rest).
//! Labels, icons, route caps and default stays live in [`CATEGORY_TABLE`],
//! which is read both by the prompt builders and by the `/api/categories`
//! endpoint that the front-end consumes.

use crate::errors::SpotError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The category of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A scenic stop, the main destination of a drive.
    Drive,
    /// A place to eat.
    Restaurant,
    /// A rest area or service station.
    Rest,
}

/// Static, client-facing metadata for a category.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryInfo {
    pub key: Category,
    pub label: &'static str,
    pub icon: &'static str,
    /// Heading for this category's section in the route planning prompt.
    pub route_heading: &'static str,
    /// How many candidates of this category are offered to the route planner.
    pub route_candidate_cap: usize,
    /// Stay used when the planner does not provide one.
    pub default_stay_min: i64,
}

pub static CATEGORY_TABLE: [CategoryInfo; 3] = [
    CategoryInfo {
        key: Category::Drive,
        label: "ドライブスポット",
        icon: "🚗",
        route_heading: "ドライブスポット",
        route_candidate_cap: 20,
        default_stay_min: 40,
    },
    CategoryInfo {
        key: Category::Restaurant,
        label: "食事",
        icon: "🍽️",
        route_heading: "食事スポット",
        route_candidate_cap: 15,
        default_stay_min: 50,
    },
    CategoryInfo {
        key: Category::Rest,
        label: "休憩所",
        icon: "☕",
        route_heading: "休憩スポット",
        route_candidate_cap: 15,
        default_stay_min: 20,
    },
];

impl Category {
    pub const ALL: [Category; 3] = [Category::Drive, Category::Restaurant, Category::Rest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Drive => "drive",
            Category::Restaurant => "restaurant",
            Category::Rest => "rest",
        }
    }

    pub fn info(&self) -> &'static CategoryInfo {
        match self {
            Category::Drive => &CATEGORY_TABLE[0],
            Category::Restaurant => &CATEGORY_TABLE[1],
            Category::Rest => &CATEGORY_TABLE[2],
        }
    }

    pub fn label(&self) -> &'static str {
        self.info().label
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SpotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drive" => Ok(Category::Drive),
            "restaurant" => Ok(Category::Restaurant),
            "rest" => Ok(Category::Rest),
            other => Err(SpotError::InvalidInput(format!(
                "unknown category '{other}', expected one of drive, restaurant, rest"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_category() {
        for category in Category::ALL {
            assert_eq!(category.info().key, category);
        }
    }

    #[test]
    fn parses_only_known_keys() {
        assert_eq!("rest".parse::<Category>().unwrap(), Category::Rest);
        assert!("Drive".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }
}
