use serde::{Deserialize, Serialize};

/// One catalog row (a movie or a show).
///
/// Every text field is optional in the source data and defaults to an empty
/// string; `release_year` is only carried for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogRecord {
    pub show_id: String,
    pub title: String,
    /// "Movie" or "TV Show" in the usual catalogs.
    #[serde(rename = "type")]
    pub kind: String,
    pub release_year: Option<i32>,
    pub rating: String,
    pub duration: String,
    /// Comma-separated genre list.
    pub listed_in: String,
    pub description: String,
    pub cast: String,
    pub director: String,
    pub country: String,
}

/// Descriptive fields that can feed a feature blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogField {
    Title,
    Description,
    ListedIn,
    Cast,
    Director,
    Country,
}

impl CatalogField {
    pub const ALL: [CatalogField; 6] = [
        CatalogField::Title,
        CatalogField::Description,
        CatalogField::ListedIn,
        CatalogField::Cast,
        CatalogField::Director,
        CatalogField::Country,
    ];
}

impl CatalogRecord {
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn with_genres(mut self, listed_in: impl Into<String>) -> Self {
        self.listed_in = listed_in.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_cast(mut self, cast: impl Into<String>) -> Self {
        self.cast = cast.into();
        self
    }

    #[must_use]
    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = director.into();
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    #[must_use]
    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn field(&self, field: CatalogField) -> &str {
        match field {
            CatalogField::Title => &self.title,
            CatalogField::Description => &self.description,
            CatalogField::ListedIn => &self.listed_in,
            CatalogField::Cast => &self.cast,
            CatalogField::Director => &self.director,
            CatalogField::Country => &self.country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let rec: CatalogRecord =
            serde_json::from_str(r#"{"title":"Dark","release_year":2017}"#).unwrap();
        assert_eq!(rec.release_year, Some(2017));
        assert_eq!(rec.description, "");
        assert_eq!(rec.field(CatalogField::Cast), "");
    }

    #[test]
    fn test_type_column_maps_to_kind() {
        let rec: CatalogRecord =
            serde_json::from_str(r#"{"title":"Dark","type":"TV Show"}"#).unwrap();
        assert_eq!(rec.kind, "TV Show");
    }

    #[test]
    fn test_builder_fills_named_fields() {
        let rec = CatalogRecord::new("Dark")
            .with_genres("Sci-Fi, Mystery")
            .with_country("Germany");
        assert_eq!(rec.field(CatalogField::ListedIn), "Sci-Fi, Mystery");
        assert_eq!(rec.field(CatalogField::Country), "Germany");
        assert_eq!(rec.field(CatalogField::Title), "Dark");
    }
}
