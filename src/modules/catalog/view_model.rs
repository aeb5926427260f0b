//! Screen state for the paginated product list.
//!
//! Every action runs as a task owned by the view model. Dropping the view
//! model aborts whatever is still in flight. Observers follow state through
//! [`ProductViewModel::subscribe`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use stacks_kernel::settings::CatalogSettings;
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::models::{Item, SortField, SortOrder};
use super::repository::ItemRepository;

/// Snapshot of everything the product screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogState {
    pub items: Vec<Item>,
    pub is_loading: bool,
    pub is_fetching_more: bool,
    /// Message from the last failed action; any later successful fetch,
    /// load-more, search or sort clears it.
    pub error_message: Option<String>,
    /// Next page to request, 1-based.
    pub current_page: usize,
    pub is_last_page: bool,
    /// Set while a fetch or load-more owns the page gate. Search and sort
    /// share `is_loading` but never touch this.
    #[serde(skip)]
    page_request: bool,
}

impl CatalogState {
    /// A page request is already running.
    pub fn page_in_flight(&self) -> bool {
        self.page_request
    }
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            is_fetching_more: false,
            error_message: None,
            current_page: 1,
            is_last_page: false,
            page_request: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewModelConfig {
    pub page_size: usize,
    pub load_more_delay: Duration,
    pub prefetch_distance: usize,
}

impl From<&CatalogSettings> for ViewModelConfig {
    fn from(settings: &CatalogSettings) -> Self {
        Self {
            page_size: settings.page_size,
            load_more_delay: Duration::from_millis(settings.load_more_delay_ms),
            prefetch_distance: settings.prefetch_distance,
        }
    }
}

impl Default for ViewModelConfig {
    fn default() -> Self {
        Self::from(&CatalogSettings::default())
    }
}

#[derive(Clone, Copy)]
enum PageTrigger {
    Fetch,
    LoadMore,
}

impl PageTrigger {
    fn error_prefix(self) -> &'static str {
        match self {
            PageTrigger::Fetch => "Failed to fetch items",
            PageTrigger::LoadMore => "Failed to load more items",
        }
    }

    fn set_flag(self, state: &mut CatalogState, value: bool) {
        match self {
            PageTrigger::Fetch => state.is_loading = value,
            PageTrigger::LoadMore => state.is_fetching_more = value,
        }
    }
}

struct Shared {
    repository: Arc<dyn ItemRepository>,
    config: ViewModelConfig,
    state: watch::Sender<CatalogState>,
    in_flight: watch::Sender<usize>,
}

impl Shared {
    async fn load_page(&self, trigger: PageTrigger) {
        let page = self.state.borrow().current_page;
        let result = self.repository.fetch_items(page, self.config.page_size).await;

        self.state.send_modify(|state| {
            match result {
                Ok(items) if items.is_empty() => {
                    tracing::info!(page, "catalog reached its last page");
                    state.is_last_page = true;
                }
                Ok(items) => {
                    state.items.extend(items);
                    state.current_page += 1;
                    state.error_message = None;
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "catalog page request failed");
                    state.error_message = Some(format!("{}: {}", trigger.error_prefix(), e));
                }
            }
            trigger.set_flag(state, false);
            state.page_request = false;
        });
    }

    /// Replace the displayed list with the outcome of `request`.
    async fn replace_items<F>(&self, request: F, error_prefix: &'static str)
    where
        F: Future<Output = Result<Vec<Item>, super::repository::CatalogError>>,
    {
        let result = request.await;
        self.state.send_modify(|state| {
            match result {
                Ok(items) => {
                    state.items = items;
                    state.error_message = None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "{}", error_prefix);
                    state.error_message = Some(format!("{}: {}", error_prefix, e));
                }
            }
            state.is_loading = false;
        });
    }
}

/// Decrements the in-flight count however the task ends.
struct InFlightGuard(Arc<Shared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.send_modify(|count| *count = count.saturating_sub(1));
    }
}

pub struct ProductViewModel {
    shared: Arc<Shared>,
    tasks: Mutex<JoinSet<()>>,
}

impl ProductViewModel {
    /// Create the view model and request the first page.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(repository: Arc<dyn ItemRepository>, config: ViewModelConfig) -> Self {
        let view_model = Self::idle(repository, config);
        view_model.fetch_items();
        view_model
    }

    /// Create the view model without requesting anything.
    pub fn idle(repository: Arc<dyn ItemRepository>, config: ViewModelConfig) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        let (in_flight, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                repository,
                config,
                state,
                in_flight,
            }),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> CatalogState {
        self.shared.state.borrow().clone()
    }

    /// Append the next page. Returns `false` when a page request is already
    /// running or the last page has been seen. A non-empty page clears any
    /// earlier error message.
    pub fn fetch_items(&self) -> bool {
        tracing::debug!("fetch_items called");
        if !self.claim_page(PageTrigger::Fetch) {
            return false;
        }

        let shared = Arc::clone(&self.shared);
        self.launch(async move { shared.load_page(PageTrigger::Fetch).await });
        true
    }

    /// Scroll-triggered variant of [`fetch_items`](Self::fetch_items); waits
    /// the configured delay before requesting.
    pub fn load_more_items(&self) -> bool {
        if !self.claim_page(PageTrigger::LoadMore) {
            return false;
        }

        let shared = Arc::clone(&self.shared);
        self.launch(async move {
            tokio::time::sleep(shared.config.load_more_delay).await;
            shared.load_page(PageTrigger::LoadMore).await
        });
        true
    }

    /// Whether a row at `last_visible_index` is close enough to the end of
    /// the list to warrant another page.
    pub fn should_load_more(&self, last_visible_index: usize) -> bool {
        let state = self.shared.state.borrow();
        if state.is_last_page || state.page_in_flight() || state.items.is_empty() {
            return false;
        }
        last_visible_index.saturating_add(self.shared.config.prefetch_distance) >= state.items.len()
    }

    /// Replace the displayed list with every match for `query`. Runs beside a
    /// pending page request without opening its gate.
    pub fn search_items(&self, query: impl Into<String>) {
        let query = query.into();
        self.shared.state.send_modify(|state| state.is_loading = true);

        let shared = Arc::clone(&self.shared);
        self.launch(async move {
            let request = shared.repository.search_items(&query);
            shared.replace_items(request, "Search failed").await
        });
    }

    /// Replace the displayed list with itself, sorted.
    pub fn sort_items(&self, sort_by: SortField, order: SortOrder) {
        let mut current = Vec::new();
        self.shared.state.send_modify(|state| {
            current = state.items.clone();
            state.is_loading = true;
        });

        let shared = Arc::clone(&self.shared);
        self.launch(async move {
            let request = shared.repository.sort_items(current, sort_by, order);
            shared.replace_items(request, "Sorting failed").await
        });
    }

    /// Wait until every launched action has finished.
    pub async fn settle(&self) {
        let mut in_flight = self.shared.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = in_flight.wait_for(|count| *count == 0).await;
    }

    /// Abort every in-flight action and drop the loading flags.
    pub fn clear(&self) {
        self.tasks.lock().abort_all();
        self.shared.state.send_modify(|state| {
            state.is_loading = false;
            state.is_fetching_more = false;
            state.page_request = false;
        });
    }

    /// Set the page flag for `trigger` unless a page request is running or
    /// paging has finished.
    fn claim_page(&self, trigger: PageTrigger) -> bool {
        self.shared.state.send_if_modified(|state| {
            if state.is_last_page || state.page_in_flight() {
                return false;
            }
            trigger.set_flag(state, true);
            state.page_request = true;
            true
        })
    }

    fn launch<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.shared.in_flight.send_modify(|count| *count += 1);
        let guard = InFlightGuard(Arc::clone(&self.shared));

        let mut tasks = self.tasks.lock();
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                if e.is_panic() {
                    tracing::error!(error = %e, "catalog action panicked");
                }
            }
        }
        tasks.spawn(async move {
            let _guard = guard;
            action.await
        });
    }
}
