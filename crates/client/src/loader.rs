//! Incremental "load more" controller for paginated collections.
//!
//! Every list surface (messages, statuses, notifications, enrollments,
//! courses) goes through the same flow: fill the view once, then append
//! pages on demand, with a wholesale refresh after local mutations. The
//! page-fetch function is injected, so the loader neither knows nor cares
//! which endpoint or pagination flavor backs it.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use studyhall_shared::{try_problem_detail, ApiError, PageCursor, PagedResponse};

use crate::log_debug;

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the page after this one, `None` when exhausted.
    pub next: Option<PageCursor>,
}

impl<T> From<PagedResponse<T>> for Page<T> {
    fn from(resp: PagedResponse<T>) -> Self {
        let next = resp.next_cursor();
        Page {
            items: resp.results,
            next,
        }
    }
}

/// What the injected page-fetch capability is asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// `None` asks for page one.
    pub cursor: Option<PageCursor>,
    /// Whether this is the view's first fill.
    pub initial: bool,
}

/// A page load failure, reduced to something a view can render. Not
/// retried automatically; the consumer decides whether to offer a retry
/// affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        let message = match &err {
            ApiError::Http { status, body } => try_problem_detail(body)
                .unwrap_or_else(|| format!("request failed with status {status}")),
            other => other.to_string(),
        };
        Self { message }
    }
}

/// Observable list state; the single source of truth a view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub cursor: Option<PageCursor>,
    pub error: Option<FetchError>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            cursor: None,
            error: None,
        }
    }
}

impl<T> ListState<T> {
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }
}

pub type PageFuture<T> = LocalBoxFuture<'static, Result<Page<T>, FetchError>>;

/// Cursor-driven pagination controller.
///
/// At most one fetch is in flight per loader; a competing call is ignored,
/// not queued, and callers may re-trigger after completion. A loader whose
/// view has unmounted is `detach`ed, after which in-flight completions are
/// dropped instead of mutating state.
pub struct IncrementalListLoader<T> {
    state: Rc<RefCell<ListState<T>>>,
    fetcher: Rc<dyn Fn(FetchRequest) -> PageFuture<T>>,
    detached: Rc<Cell<bool>>,
}

impl<T> IncrementalListLoader<T> {
    pub fn new(fetcher: impl Fn(FetchRequest) -> PageFuture<T> + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(ListState::default())),
            fetcher: Rc::new(fetcher),
            detached: Rc::new(Cell::new(false)),
        }
    }

    /// Read-only view of the current list state.
    pub fn state(&self) -> Ref<'_, ListState<T>> {
        self.state.borrow()
    }

    /// Stop applying fetch results; called when the owning view unmounts.
    pub fn detach(&self) {
        self.detached.set(true);
    }

    /// First fill of an empty view.
    pub async fn initial_load(&self) {
        self.replace_from(FetchRequest {
            cursor: None,
            initial: true,
        })
        .await;
    }

    /// Refetch page one and replace the collection wholesale; used after a
    /// local mutation to resynchronize with the server's ordering.
    pub async fn refresh(&self) {
        self.replace_from(FetchRequest {
            cursor: None,
            initial: false,
        })
        .await;
    }

    /// Fetch the next page and append it. No-op while a fetch is in flight
    /// or when the collection is exhausted.
    pub async fn load_more(&self) {
        let request = {
            let mut state = self.state.borrow_mut();
            if state.is_loading {
                log_debug!("load_more ignored: a fetch is already in flight");
                return;
            }
            let Some(cursor) = state.cursor.clone() else {
                return;
            };
            state.is_loading = true;
            FetchRequest {
                cursor: Some(cursor),
                initial: false,
            }
        };

        let result = (self.fetcher)(request).await;
        if self.detached.get() {
            return;
        }
        let mut state = self.state.borrow_mut();
        state.is_loading = false;
        match result {
            Ok(page) => {
                state.items.extend(page.items);
                state.cursor = page.next;
                state.error = None;
            }
            // cursor is untouched, so a manual retry refetches this page
            Err(err) => state.error = Some(err),
        }
    }

    async fn replace_from(&self, request: FetchRequest) {
        {
            let mut state = self.state.borrow_mut();
            if state.is_loading {
                log_debug!("refresh ignored: a fetch is already in flight");
                return;
            }
            state.is_loading = true;
        }

        let result = (self.fetcher)(request).await;
        if self.detached.get() {
            return;
        }
        let mut state = self.state.borrow_mut();
        state.is_loading = false;
        match result {
            Ok(page) => {
                state.items = page.items;
                state.cursor = page.next;
                state.error = None;
            }
            Err(err) => state.error = Some(err),
        }
    }
}
