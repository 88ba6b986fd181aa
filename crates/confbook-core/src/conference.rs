//! Conference data model

use crate::error::{ConfbookError, Result};
use crate::types::ConferenceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A conference that visitors can leave comments on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    /// Unique conference identifier
    pub id: ConferenceId,
    /// Host city
    pub city: String,
    /// Four-digit year
    pub year: String,
    /// URL slug, e.g. `amsterdam-2022`
    pub slug: String,
    /// Whether the conference is international
    pub is_international: bool,
}

impl Conference {
    /// Create a conference, computing its slug from city and year
    pub fn new(city: impl Into<String>, year: impl Into<String>, is_international: bool) -> Result<Self> {
        let city = city.into();
        let year = year.into();

        if city.trim().is_empty() {
            return Err(ConfbookError::Validation(
                "Conference city cannot be empty".to_string(),
            ));
        }
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfbookError::Validation(format!(
                "Conference year must have four digits: {}",
                year
            )));
        }

        let slug = slugify(&format!("{} {}", city, year));
        Ok(Self {
            id: ConferenceId::new(),
            city,
            year,
            slug,
            is_international,
        })
    }

    /// Override the computed slug
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.city, self.year)
    }
}

/// Lowercase ASCII slug with single dashes between words
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Sort conferences for listing: by year, then city
pub fn sort_for_listing(conferences: &mut [Conference]) {
    conferences.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.city.cmp(&b.city)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_computed_from_city_and_year() {
        let conf = Conference::new("Amsterdam", "2022", true).unwrap();
        assert_eq!(conf.slug, "amsterdam-2022");
        assert_eq!(conf.to_string(), "Amsterdam 2022");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  São  Paulo -- 2024 "), "s-o-paulo-2024");
        assert_eq!(slugify("New York 2021"), "new-york-2021");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_invalid_year() {
        assert!(Conference::new("Paris", "23", false).is_err());
        assert!(Conference::new("Paris", "20x3", false).is_err());
        assert!(Conference::new("  ", "2023", false).is_err());
    }

    #[test]
    fn test_sort_for_listing() {
        let mut confs = vec![
            Conference::new("Paris", "2023", false).unwrap(),
            Conference::new("Berlin", "2023", false).unwrap(),
            Conference::new("Amsterdam", "2022", true).unwrap(),
        ];
        sort_for_listing(&mut confs);
        let slugs: Vec<_> = confs.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["amsterdam-2022", "berlin-2023", "paris-2023"]);
    }
}
