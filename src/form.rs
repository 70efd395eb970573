//! The search box: owns the query text and loading state and runs the first search.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::client::{SearchClient, Transport};
use crate::models::User;

/// Receives the outcome of a search started by [`SearchForm`].
pub trait SearchFormListener {
    fn results_ready(&self, items: Vec<User>);
    fn query_changed(&self, query: &str);
    fn total_changed(&self, total: u64);
    /// The page the settled search was issued for.
    fn page_changed(&self, _page: i64) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub query_text: String,
    pub is_loading: bool,
    /// Set on the first submit attempt; only drives validation hints.
    pub has_submitted: bool,
    pub current_page: i64,
    pub page_size: i64,
}

impl SearchState {
    fn new(page_size: i64) -> Self {
        Self {
            query_text: String::new(),
            is_loading: false,
            has_submitted: false,
            current_page: 1,
            page_size,
        }
    }
}

pub struct SearchForm<T> {
    client: Rc<SearchClient<T>>,
    listener: Rc<dyn SearchFormListener>,
    state: RefCell<SearchState>,
}

impl<T: Transport + 'static> SearchForm<T> {
    pub fn new(
        client: Rc<SearchClient<T>>,
        listener: Rc<dyn SearchFormListener>,
        page_size: i64,
    ) -> Rc<Self> {
        Rc::new(Self {
            client,
            listener,
            state: RefCell::new(SearchState::new(page_size)),
        })
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn set_query(&self, text: impl Into<String>) {
        self.state.borrow_mut().query_text = text.into();
    }

    /// Whether a submit would start a search. `form_valid` is the host form's own verdict.
    pub fn is_submit_enabled(&self, form_valid: bool) -> bool {
        form_valid && !self.state.borrow().query_text.trim().is_empty()
    }

    /// Starts a search if the form is valid and the query is not blank.
    ///
    /// The state change happens immediately; the returned future performs the
    /// request and must be spawned by the caller. `None` means nothing was started.
    pub fn submit(self: &Rc<Self>, form_valid: bool) -> Option<impl Future<Output = ()> + 'static> {
        self.state.borrow_mut().has_submitted = true;

        if !self.is_submit_enabled(form_valid) {
            debug!("Submit ignored: form invalid or query blank");
            return None;
        }

        Some(self.start_search())
    }

    /// Moves to `page` and searches again with the current query text.
    /// Pages below 1 are ignored and leave the state untouched.
    pub fn change_page(self: &Rc<Self>, page: i64) -> Option<impl Future<Output = ()> + 'static> {
        if page < 1 {
            debug!(page, "Page change ignored: page must be at least 1");
            return None;
        }
        self.state.borrow_mut().current_page = page;
        self.submit(true)
    }

    fn start_search(self: &Rc<Self>) -> impl Future<Output = ()> + 'static {
        let (query, page, page_size) = {
            let mut state = self.state.borrow_mut();
            state.is_loading = true;
            (state.query_text.clone(), state.current_page, state.page_size)
        };

        let form = Rc::clone(self);
        async move {
            match form.client.search(&query, page, page_size).await {
                Ok(result) => {
                    form.listener.results_ready(result.items);
                    form.listener.query_changed(&query);
                    form.listener.total_changed(result.total_count);
                    form.listener.page_changed(page);
                }
                Err(e) => {
                    warn!(error = %e, query = %query, "Search failed, showing no results");
                    form.listener.results_ready(Vec::new());
                }
            }
            form.state.borrow_mut().is_loading = false;
        }
    }
}
