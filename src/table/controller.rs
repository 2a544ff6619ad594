//! Remote list controller
//!
//! Owns the query state (page, page size, sort, date range, search text) of a
//! server-paginated collection and fetches pages through a
//! [`RequestController`]. Fetch failures never propagate: cancellations are
//! ignored, anything else raises one generic error flash, and the rows already
//! on screen are kept.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::RequestError;
use crate::flash::FlashQueue;
use crate::http::{HttpContext, Method, RequestController, RequestOptions, RequestState};
use crate::models::{DateRange, ListQueryParams, Page, Pagination, SortDirection, SortState};
use crate::table::actions::{resolve_actions, ResolvedAction, RowAction};
use crate::table::paginator::{page_window, ItemRange};
use crate::table::selection::Selection;
use crate::table::sort::toggle_sort;

/// Configuration for one list controller
#[derive(Debug, Clone)]
pub struct ListConfig {
    pub path: String,
    pub per_page: u32,
    pub default_sort: SortState,
    /// Filters in place before the first load
    pub date_range: DateRange,
    pub query: String,
    pub contact_email: String,
    pub options: RequestOptions,
}

impl ListConfig {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            per_page: 25,
            default_sort: SortState::default(),
            date_range: DateRange::default(),
            query: String::new(),
            contact_email: "support@example.com".to_string(),
            options: RequestOptions::new(),
        }
    }

    /// Page size and contact address from the application configuration
    pub fn from_config(config: &Config, path: &str) -> Self {
        Self {
            per_page: config.per_page,
            contact_email: config.contact_email.clone(),
            ..Self::new(path)
        }
    }

    pub fn with_sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.default_sort = SortState::new(field, direction);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.trim().to_string();
        self
    }

    pub fn with_contact_email(mut self, email: &str) -> Self {
        self.contact_email = email.to_string();
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Everything a renderer needs to draw the list
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub rows: Vec<T>,
    pub pagination: Pagination,
    pub sort: SortState,
    pub date_range: DateRange,
    pub query: String,
    /// Whether the collection is empty; only rechecked on load/reset so the
    /// empty branch does not flicker on every filter change. `None` before
    /// the first load.
    pub is_empty: Option<bool>,
    pub phase: ListPhase,
    pub selection: Selection,
}

impl<T> ListView<T> {
    fn new(config: &ListConfig) -> Self {
        Self {
            rows: Vec::new(),
            pagination: Pagination::new(config.per_page.max(1)),
            sort: config.default_sort.clone(),
            date_range: config.date_range,
            query: config.query.clone(),
            is_empty: None,
            phase: ListPhase::Idle,
            selection: Selection::new(),
        }
    }

    pub fn query_params(&self) -> ListQueryParams {
        ListQueryParams::build(&self.pagination, &self.sort, &self.date_range, Some(&self.query))
    }
}

/// Result of one fetch as seen by the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new page of rows was applied
    Loaded,
    /// A newer fetch was issued before this one settled; its response was dropped
    Stale,
    /// The fetch failed and an error flash was raised
    Failed,
    /// The fetch was cancelled
    Aborted,
    /// Nothing changed, so nothing was fetched
    Unchanged,
}

pub struct ListController<T> {
    request: RequestController<Page<T>>,
    flash: FlashQueue,
    contact_email: String,
    view: Arc<watch::Sender<ListView<T>>>,
    fetch_seq: Arc<AtomicU64>,
}

impl<T> Clone for ListController<T> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            flash: self.flash.clone(),
            contact_email: self.contact_email.clone(),
            view: self.view.clone(),
            fetch_seq: self.fetch_seq.clone(),
        }
    }
}

impl<T> ListController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(context: HttpContext, flash: FlashQueue, config: ListConfig) -> Self {
        let mut options = config.options.clone().unwrap_data();
        // Loading is driven by `load()`, not by construction.
        options.immediate = false;

        let (view, _rx) = watch::channel(ListView::new(&config));

        Self {
            request: RequestController::new(context, Method::Get, config.path.clone(), options),
            flash,
            contact_email: config.contact_email,
            view: Arc::new(view),
            fetch_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Initial load on mount
    pub async fn load(&self) -> FetchOutcome {
        self.reset().await
    }

    /// Refetch the current page with the current sort and filters
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch(false).await
    }

    /// Go back to page 1, refetch and recheck whether the collection is empty
    pub async fn reset(&self) -> FetchOutcome {
        self.view.send_modify(|view| view.pagination.page = 1);
        self.fetch(true).await
    }

    pub async fn reload(&self) -> FetchOutcome {
        self.reset().await
    }

    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        self.view.send_modify(|view| view.pagination.page = view.pagination.clamp_page(page));
        self.fetch(false).await
    }

    pub async fn set_per_page(&self, per_page: u32) -> FetchOutcome {
        self.view.send_modify(|view| view.pagination.per_page = per_page.max(1));
        self.fetch(false).await
    }

    /// Column header click; stays on the current page
    pub async fn sort_by(&self, field: &str) -> FetchOutcome {
        self.view.send_modify(|view| view.sort = toggle_sort(&view.sort, field));
        self.fetch(false).await
    }

    pub async fn set_default_sort(&self, field: &str, direction: SortDirection) -> FetchOutcome {
        self.view.send_modify(|view| {
            view.sort = SortState::new(field, direction);
            view.pagination.page = 1;
        });
        self.fetch(false).await
    }

    pub async fn set_date_range(&self, range: DateRange) -> FetchOutcome {
        let changed = self.view.send_if_modified(|view| {
            if view.date_range == range {
                return false;
            }
            view.date_range = range;
            view.pagination.page = 1;
            true
        });

        if !changed {
            return FetchOutcome::Unchanged;
        }
        self.fetch(false).await
    }

    /// Free-text search; an empty string clears it
    pub async fn set_query(&self, query: &str) -> FetchOutcome {
        self.view.send_modify(|view| {
            view.query = query.trim().to_string();
            view.pagination.page = 1;
        });
        self.fetch(false).await
    }

    pub fn abort(&self) {
        self.request.abort();
    }

    async fn fetch(&self, check_empty: bool) -> FetchOutcome {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;

        self.view.send_modify(|view| view.phase = ListPhase::Loading);
        let params = self.query_params();

        let result = match serde_json::to_value(&params) {
            Ok(payload) => self.request.execute(Some(payload), None).await,
            Err(e) => Err(RequestError::from(e)),
        };

        if self.fetch_seq.load(Ordering::SeqCst) != seq {
            debug!("List fetch #{} superseded, dropping response", seq);
            return FetchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                debug!(
                    "Loaded page {}/{} ({} items)",
                    page.page,
                    page.total_pages,
                    page.items.len()
                );
                self.view.send_modify(|view| {
                    view.pagination = Pagination {
                        page: page.page.max(1),
                        per_page: page.per_page,
                        total_items: page.total_items,
                        total_pages: page.total_pages,
                    };
                    if check_empty {
                        view.is_empty = Some(page.items.is_empty());
                    }
                    view.rows = page.items;
                    view.selection.clear();
                    view.phase = ListPhase::Loaded;
                });
                FetchOutcome::Loaded
            }
            Err(e) if e.is_aborted() => {
                debug!("List fetch #{} aborted", seq);
                self.view.send_modify(|view| {
                    view.phase = if view.is_empty.is_some() {
                        ListPhase::Loaded
                    } else {
                        ListPhase::Idle
                    };
                });
                FetchOutcome::Aborted
            }
            Err(e) => {
                warn!("Failed to load {}: {}", self.request.path(), e);
                self.flash.error(generic_error_message(&self.contact_email));
                self.view.send_modify(|view| view.phase = ListPhase::Error);
                FetchOutcome::Failed
            }
        }
    }

    /// Snapshot of the view state
    pub fn view(&self) -> ListView<T> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView<T>> {
        self.view.subscribe()
    }

    pub fn request_state(&self) -> RequestState<Page<T>> {
        self.request.state()
    }

    pub fn rows(&self) -> Vec<T> {
        self.view.borrow().rows.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.view.borrow().pagination
    }

    pub fn query_params(&self) -> ListQueryParams {
        self.view.borrow().query_params()
    }

    pub fn page_window(&self) -> Vec<u32> {
        let pagination = self.pagination();
        page_window(pagination.page, pagination.total_pages)
    }

    pub fn item_range(&self) -> ItemRange {
        ItemRange::of(&self.pagination())
    }

    /// Visible actions for the row at `index` on the current page
    pub fn row_actions(&self, actions: &[RowAction<T>], index: usize) -> Vec<ResolvedAction> {
        let view = self.view.borrow();
        match view.rows.get(index) {
            Some(row) => resolve_actions(actions, row, index),
            None => Vec::new(),
        }
    }

    /// Returns whether the row is selected afterwards; out-of-range rows are ignored
    pub fn toggle_selected(&self, index: usize) -> bool {
        let mut selected = false;
        self.view.send_if_modified(|view| {
            if index >= view.rows.len() {
                return false;
            }
            selected = view.selection.toggle(index);
            true
        });
        selected
    }

    pub fn select_all(&self) {
        self.view.send_modify(|view| {
            let count = view.rows.len();
            view.selection.select_all(count);
        });
    }

    pub fn clear_selection(&self) {
        self.view.send_modify(|view| view.selection.clear());
    }

    pub fn selected_rows(&self) -> Vec<T> {
        let view = self.view.borrow();
        view.selection
            .indices()
            .filter_map(|index| view.rows.get(index).cloned())
            .collect()
    }
}

fn generic_error_message(contact_email: &str) -> String {
    format!(
        "Something went wrong, please contact <a href=\"mailto:{0}\">{0}</a>",
        contact_email
    )
}
