use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::data::ITEMS;
use super::models::{Item, SortField, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("page {0} is out of range; pages start at 1")]
    InvalidPage(usize),

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("unknown sort field '{0}'; expected name or price")]
    UnknownSortField(String),

    #[error("unknown sort order '{0}'; expected asc or desc")]
    UnknownSortOrder(String),

    /// The backing source could not answer.
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
}

/// Source of catalog items.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Every item, in source order.
    async fn all_items(&self) -> Result<Vec<Item>, CatalogError>;

    /// One 1-based page; empty once `page` starts past the end.
    async fn fetch_items(&self, page: usize, page_size: usize) -> Result<Vec<Item>, CatalogError>;

    /// Items whose name or brand contains `query`, ignoring case.
    async fn search_items(&self, query: &str) -> Result<Vec<Item>, CatalogError>;

    async fn sort_items(
        &self,
        items: Vec<Item>,
        sort_by: SortField,
        order: SortOrder,
    ) -> Result<Vec<Item>, CatalogError> {
        Ok(sort_items(items, sort_by, order))
    }
}

/// Repository over a fixed list held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryItemRepository {
    items: Arc<[Item]>,
}

impl InMemoryItemRepository {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Repository over the static seed list.
    pub fn seeded() -> Self {
        Self::new(ITEMS.clone())
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn all_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.items.to_vec())
    }

    async fn fetch_items(&self, page: usize, page_size: usize) -> Result<Vec<Item>, CatalogError> {
        let items = page_slice(&self.items[..], page, page_size)?;
        tracing::debug!(page, page_size, returned = items.len(), "fetched catalog page");
        Ok(items)
    }

    async fn search_items(&self, query: &str) -> Result<Vec<Item>, CatalogError> {
        let items = search(&self.items[..], query);
        tracing::debug!(query, matches = items.len(), "searched catalog");
        Ok(items)
    }
}

/// Copy out page `page` (1-based) of `items`.
pub fn page_slice<T: Clone>(items: &[T], page: usize, page_size: usize) -> Result<Vec<T>, CatalogError> {
    if page == 0 {
        return Err(CatalogError::InvalidPage(page));
    }
    if page_size == 0 {
        return Err(CatalogError::InvalidPageSize);
    }

    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return Ok(Vec::new());
    }
    let end = start.saturating_add(page_size).min(items.len());
    Ok(items[start..end].to_vec())
}

/// Case-insensitive substring match over name and brand, order preserved.
pub fn search(items: &[Item], query: &str) -> Vec<Item> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle) || item.brand.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Stable sort; equal keys keep their input order in both directions.
pub fn sort_items(mut items: Vec<Item>, sort_by: SortField, order: SortOrder) -> Vec<Item> {
    let compare = |a: &Item, b: &Item| -> Ordering {
        match sort_by {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Price => a.price.total_cmp(&b.price),
        }
    };

    match order {
        SortOrder::Asc => items.sort_by(compare),
        SortOrder::Desc => items.sort_by(|a, b| compare(b, a)),
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    fn sample() -> Vec<Item> {
        vec![
            Item::new("Tent", "Quechua", 70.0),
            Item::new("Ball", "Kipsta", 10.0),
            Item::new("Mat", "Kimjaly", 15.0),
            Item::new("Rope", "Domyos", 10.0),
            Item::new("Bag", "Quechua", 15.0),
        ]
    }

    #[tokio::test]
    async fn pages_are_one_based_and_clamped() {
        let repository = InMemoryItemRepository::seeded();

        let first = repository.fetch_items(1, 10).await.unwrap();
        assert_eq!(first, ITEMS[..10].to_vec());

        let last = repository.fetch_items(3, 10).await.unwrap();
        assert_eq!(last, ITEMS[20..].to_vec());

        assert!(repository.fetch_items(4, 10).await.unwrap().is_empty());
        assert!(repository.fetch_items(usize::MAX, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_zero_and_empty_pages_are_errors() {
        let repository = InMemoryItemRepository::seeded();
        assert_eq!(
            repository.fetch_items(0, 10).await,
            Err(CatalogError::InvalidPage(0))
        );
        assert_eq!(
            repository.fetch_items(1, 0).await,
            Err(CatalogError::InvalidPageSize)
        );
    }

    #[tokio::test]
    async fn search_matches_name_or_brand_ignoring_case() {
        let repository = InMemoryItemRepository::new(sample());

        let by_brand = repository.search_items("QUECHUA").await.unwrap();
        assert_eq!(names(&by_brand), vec!["Tent", "Bag"]);

        let by_name = repository.search_items("op").await.unwrap();
        assert_eq!(names(&by_name), vec!["Rope"]);

        let everything = repository.search_items("").await.unwrap();
        assert_eq!(everything.len(), 5);

        assert!(repository.search_items("kayak").await.unwrap().is_empty());
    }

    #[test]
    fn price_sort_keeps_ties_in_input_order() {
        let ascending = sort_items(sample(), SortField::Price, SortOrder::Asc);
        assert_eq!(names(&ascending), vec!["Ball", "Rope", "Mat", "Bag", "Tent"]);

        let descending = sort_items(sample(), SortField::Price, SortOrder::Desc);
        assert_eq!(names(&descending), vec!["Tent", "Mat", "Bag", "Ball", "Rope"]);
    }

    #[test]
    fn name_sort_both_directions() {
        let ascending = sort_items(sample(), SortField::Name, SortOrder::Asc);
        assert_eq!(names(&ascending), vec!["Bag", "Ball", "Mat", "Rope", "Tent"]);

        let descending = sort_items(sample(), SortField::Name, SortOrder::Desc);
        assert_eq!(names(&descending), vec!["Tent", "Rope", "Mat", "Ball", "Bag"]);
    }

    #[tokio::test]
    async fn repository_sort_uses_the_shared_sorter() {
        let repository = InMemoryItemRepository::new(Vec::new());
        let sorted = repository
            .sort_items(sample(), SortField::Price, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(sorted, sort_items(sample(), SortField::Price, SortOrder::Asc));
    }
}
