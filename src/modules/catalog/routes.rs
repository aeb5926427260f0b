use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use once_cell::sync::OnceCell;
use serde_json::json;
use stacks_http::error::AppError;

use super::models::{
    FeedSearch, FeedSort, Item, ItemsQuery, LoadMoreQuery, SearchQuery, SortField, SortOrder,
    SortedQuery,
};
use super::repository::{page_slice, sort_items, CatalogError, ItemRepository};
use super::view_model::{CatalogState, ProductViewModel};

/// State shared by every catalog handler.
#[derive(Clone)]
pub struct CatalogContext {
    pub repository: Arc<dyn ItemRepository>,
    pub page_size: usize,
    /// Product screen; set once the module is initialized.
    pub screen: Arc<OnceCell<ProductViewModel>>,
}

impl CatalogContext {
    fn screen(&self) -> Result<&ProductViewModel, AppError> {
        self.screen
            .get()
            .ok_or_else(|| anyhow::anyhow!("catalog module has not been initialized").into())
    }
}

impl From<CatalogError> for AppError {
    fn from(error: CatalogError) -> Self {
        let message = error.to_string();
        match error {
            CatalogError::InvalidPage(page) => AppError::validation(
                vec![json!({ "field": "page", "value": page, "error": "must be at least 1" })],
                message,
            ),
            CatalogError::InvalidPageSize => AppError::validation(
                vec![json!({ "field": "size", "error": "must be at least 1" })],
                message,
            ),
            CatalogError::UnknownSortField(_) => {
                AppError::bad_request(message).with_code("unknown_sort_field")
            }
            CatalogError::UnknownSortOrder(_) => {
                AppError::bad_request(message).with_code("unknown_sort_order")
            }
            CatalogError::Unavailable(_) => AppError::Internal(anyhow::Error::new(error)),
        }
    }
}

fn parse_order(order: Option<&str>) -> Result<SortOrder, CatalogError> {
    order.map(str::parse::<SortOrder>).transpose().map(Option::unwrap_or_default)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "catalog module is healthy"
}

/// `GET items`: one page, optionally sorted within the page
pub async fn list_items(
    State(ctx): State<CatalogContext>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let sort = match query.sort_by.as_deref() {
        Some(field) => Some((field.parse::<SortField>()?, parse_order(query.order.as_deref())?)),
        None => None,
    };

    let page = query.page.unwrap_or(1);
    let size = query.size.unwrap_or(ctx.page_size);
    let mut items = ctx.repository.fetch_items(page, size).await?;

    if let Some((sort_by, order)) = sort {
        items = ctx.repository.sort_items(items, sort_by, order).await?;
    }
    Ok(Json(items))
}

/// `GET items/search`: paginated matches on name or brand
pub async fn search_items(
    State(ctx): State<CatalogContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let matches = ctx.repository.search_items(&query.query).await?;
    let page = page_slice(
        &matches[..],
        query.page.unwrap_or(1),
        query.size.unwrap_or(ctx.page_size),
    )?;
    Ok(Json(page))
}

/// `GET items/sorted`: the whole catalog in the requested order
pub async fn sorted_items(
    State(ctx): State<CatalogContext>,
    Query(query): Query<SortedQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let sort_by = query.sort_by.parse::<SortField>()?;
    let order = parse_order(query.order.as_deref())?;
    let items = ctx.repository.all_items().await?;
    Ok(Json(sort_items(items, sort_by, order)))
}

pub async fn feed_state(State(ctx): State<CatalogContext>) -> Result<Json<CatalogState>, AppError> {
    Ok(Json(ctx.screen()?.state()))
}

pub async fn feed_fetch(State(ctx): State<CatalogContext>) -> Result<Json<CatalogState>, AppError> {
    let screen = ctx.screen()?;
    screen.fetch_items();
    screen.settle().await;
    Ok(Json(screen.state()))
}

/// Load the next page; with `lastVisible`, only when the screen is near the end
pub async fn feed_load_more(
    State(ctx): State<CatalogContext>,
    Query(query): Query<LoadMoreQuery>,
) -> Result<Json<CatalogState>, AppError> {
    let screen = ctx.screen()?;
    let wanted = query
        .last_visible
        .map_or(true, |index| screen.should_load_more(index));
    if wanted {
        screen.load_more_items();
        screen.settle().await;
    }
    Ok(Json(screen.state()))
}

pub async fn feed_search(
    State(ctx): State<CatalogContext>,
    Json(request): Json<FeedSearch>,
) -> Result<Json<CatalogState>, AppError> {
    let screen = ctx.screen()?;
    screen.search_items(request.query);
    screen.settle().await;
    Ok(Json(screen.state()))
}

pub async fn feed_sort(
    State(ctx): State<CatalogContext>,
    Json(request): Json<FeedSort>,
) -> Result<Json<CatalogState>, AppError> {
    let screen = ctx.screen()?;
    screen.sort_items(request.sort_by, request.order);
    screen.settle().await;
    Ok(Json(screen.state()))
}
