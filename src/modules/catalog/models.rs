use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::repository::CatalogError;

/// A product in the store catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub brand: String,
    pub price: f64,
}

impl Item {
    pub fn new(name: impl Into<String>, brand: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            brand: brand.into(),
            price,
        }
    }
}

/// Field a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Price,
}

impl FromStr for SortField {
    type Err = CatalogError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            other => Err(CatalogError::UnknownSortField(other.to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Name => f.write_str("name"),
            SortField::Price => f.write_str("price"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CatalogError::UnknownSortOrder(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// `GET items` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// `GET items/search` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

/// `GET items/sorted` query string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedQuery {
    pub sort_by: String,
    #[serde(default)]
    pub order: Option<String>,
}

/// Scroll position reported by the screen when asking for more rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreQuery {
    pub last_visible: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSearch {
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSort {
    pub sort_by: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_parse_from_query_strings() {
        assert_eq!("price".parse::<SortField>().unwrap(), SortField::Price);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!(
            "brand".parse::<SortField>(),
            Err(CatalogError::UnknownSortField("brand".to_string()))
        );
        assert_eq!(
            "up".parse::<SortOrder>(),
            Err(CatalogError::UnknownSortOrder("up".to_string()))
        );
    }

    #[test]
    fn sort_keys_display_as_they_parse() {
        for field in [SortField::Name, SortField::Price] {
            assert_eq!(field.to_string().parse::<SortField>().unwrap(), field);
        }
        assert_eq!(SortOrder::default().to_string(), "asc");
    }
}
