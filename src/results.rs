//! The result table and its pagination.
//!
//! State is seeded by the host from the first search and afterwards driven by
//! [`ResultsView::load_page`]. Completions are applied in the order they
//! settle; a slow response for an older page can overwrite a newer one.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::client::{SearchClient, Transport};
use crate::error::SearchError;
use crate::models::User;

/// Renders results and surfaces user-visible errors.
pub trait ResultsObserver {
    fn results_changed(&self, state: &ResultsState);
    fn notify_error(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsState {
    pub query: String,
    pub items: Vec<User>,
    pub total_count: u64,
    pub current_page: i64,
    pub page_size: i64,
}

impl ResultsState {
    fn new(page_size: i64) -> Self {
        Self {
            query: String::new(),
            items: Vec::new(),
            total_count: 0,
            current_page: 1,
            page_size,
        }
    }

    /// Number of pages implied by `total_count`; never less than one.
    pub fn page_count(&self) -> i64 {
        let size = self.page_size.max(1) as u64;
        let pages = self.total_count.div_ceil(size).max(1);
        i64::try_from(pages).unwrap_or(i64::MAX)
    }
}

pub struct ResultsView<T> {
    client: Rc<SearchClient<T>>,
    observer: Rc<dyn ResultsObserver>,
    state: RefCell<ResultsState>,
}

impl<T: Transport + 'static> ResultsView<T> {
    pub fn new(
        client: Rc<SearchClient<T>>,
        observer: Rc<dyn ResultsObserver>,
        page_size: i64,
    ) -> Rc<Self> {
        Rc::new(Self {
            client,
            observer,
            state: RefCell::new(ResultsState::new(page_size)),
        })
    }

    pub fn state(&self) -> ResultsState {
        self.state.borrow().clone()
    }

    pub fn set_query(&self, query: &str) {
        self.update(|state| state.query = query.to_string());
    }

    pub fn set_results(&self, items: Vec<User>) {
        self.update(|state| state.items = items);
    }

    pub fn set_total_results(&self, total: u64) {
        self.update(|state| state.total_count = total);
    }

    pub fn set_current_page(&self, page: i64) {
        self.update(|state| state.current_page = page);
    }

    /// Fetches `page` for the stored query.
    ///
    /// On success the items, total and current page are replaced. A 422 shows
    /// GitHub's message through the observer; any other failure is only logged
    /// and the state is left as it was.
    pub fn load_page(self: &Rc<Self>, page: i64) -> impl Future<Output = ()> + 'static {
        let (query, page_size) = {
            let state = self.state.borrow();
            (state.query.clone(), state.page_size)
        };

        let view = Rc::clone(self);
        async move {
            match view.client.search(&query, page, page_size).await {
                Ok(result) => {
                    debug!(page, total = result.total_count, "Page loaded");
                    view.update(|state| {
                        state.items = result.items;
                        state.total_count = result.total_count;
                        state.current_page = page;
                    });
                }
                Err(e) if e.is_validation() => view.observer.notify_error(&e.message()),
                Err(e) => {
                    let body = match &e {
                        SearchError::Api { body, .. } => body.as_str(),
                        _ => "",
                    };
                    warn!(error = %e, body, page, "Failed to load page");
                }
            }
        }
    }

    pub fn on_page_change(self: &Rc<Self>, page: i64) -> impl Future<Output = ()> + 'static {
        self.load_page(page)
    }

    fn update(&self, apply: impl FnOnce(&mut ResultsState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        self.observer.results_changed(&snapshot);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::testing::*;

    #[derive(Default)]
    pub struct RecordingObserver {
        pub renders: RefCell<Vec<ResultsState>>,
        pub errors: RefCell<Vec<String>>,
    }

    impl ResultsObserver for RecordingObserver {
        fn results_changed(&self, state: &ResultsState) {
            self.renders.borrow_mut().push(state.clone());
        }

        fn notify_error(&self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }
    }

    fn view(transport: FakeTransport) -> (Rc<ResultsView<FakeTransport>>, Rc<RecordingObserver>) {
        let observer = Rc::new(RecordingObserver::default());
        let view = ResultsView::new(Rc::new(client(transport)), observer.clone(), 9);
        (view, observer)
    }

    fn logins(state: &ResultsState) -> Vec<&str> {
        state.items.iter().map(|u| u.login.as_str()).collect()
    }

    #[test]
    fn test_no_load_on_construction() {
        let (view, observer) = view(FakeTransport::default());

        assert_eq!(view.client.recorded_requests().len(), 0);
        assert!(observer.renders.borrow().is_empty());

        let state = view.state();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.page_size, 9);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_inputs_update_state_and_render() {
        let (view, observer) = view(FakeTransport::default());

        view.set_query("octo");
        view.set_total_results(30);
        view.set_current_page(1);

        let state = view.state();
        assert_eq!(state.query, "octo");
        assert_eq!(state.total_count, 30);
        assert_eq!(state.page_count(), 4);
        assert_eq!(observer.renders.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_load_page_replaces_results() {
        let (view, observer) = view(FakeTransport::default().reply(200, users_body(100, &["user10", "user11"])));
        view.set_query("user");
        view.set_results(vec![]);
        view.set_total_results(100);

        view.load_page(2).await;

        let state = view.state();
        assert_eq!(state.current_page, 2);
        assert_eq!(state.total_count, 100);
        assert_eq!(logins(&state), ["user10", "user11"]);
        assert_eq!(observer.renders.borrow().last(), Some(&state));

        let requests = view.client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].page, 2);
        assert_eq!(requests[0].per_page, 9);
        assert!(requests[0].query_expression.starts_with("user in:login"));
    }

    #[tokio::test]
    async fn test_load_first_page() {
        let (view, _) = view(FakeTransport::default().reply(200, users_body(100, &["user1"])));

        view.load_page(1).await;

        let state = view.state();
        assert_eq!(state.current_page, 1);
        assert_eq!(state.total_count, 100);
        assert_eq!(logins(&state), ["user1"]);
    }

    #[tokio::test]
    async fn test_validation_error_is_notified() {
        let (view, observer) = view(FakeTransport::default().reply(422, r#"{"message":"Error message"}"#));
        view.set_query("bad");

        view.load_page(1).await;

        assert_eq!(*observer.errors.borrow(), vec!["Error message".to_string()]);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_surfaced() {
        let (view, observer) = view(
            FakeTransport::default()
                .reply(500, r#"{"message":"Server Error"}"#)
                .fail(SearchError::network("offline")),
        );
        view.set_query("octo");
        view.set_total_results(20);
        let before = view.state();

        view.load_page(2).await;
        view.load_page(3).await;
        view.load_page(0).await;

        assert!(observer.errors.borrow().is_empty());
        assert_eq!(view.state(), before);
        assert_eq!(view.client.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_on_page_change_loads_that_page() {
        let (view, _) = view(FakeTransport::default().reply(200, users_body(20, &["b"])));
        view.set_query("b");

        view.on_page_change(2).await;

        assert_eq!(view.client.recorded_requests()[0].page, 2);
        assert_eq!(view.state().current_page, 2);
    }

    /// Responses are applied in settle order with no sequence check.
    #[tokio::test]
    async fn test_slow_older_page_overwrites_newer_page() {
        let (view, observer) = view(
            FakeTransport::default()
                .reply_after(3, 200, users_body(30, &["page1"]))
                .reply(200, users_body(30, &["page2"])),
        );
        view.set_query("p");
        observer.renders.borrow_mut().clear();

        let older = view.load_page(1);
        let newer = view.load_page(2);
        tokio::join!(older, newer);

        let settled: Vec<i64> = observer
            .renders
            .borrow()
            .iter()
            .map(|state| state.current_page)
            .collect();
        assert_eq!(settled, [2, 1]);

        let state = view.state();
        assert_eq!(state.current_page, 1);
        assert_eq!(logins(&state), ["page1"]);
    }

    #[test]
    fn test_page_count() {
        let mut state = ResultsState::new(9);
        assert_eq!(state.page_count(), 1);

        state.total_count = 9;
        assert_eq!(state.page_count(), 1);

        state.total_count = 10;
        assert_eq!(state.page_count(), 2);

        state.total_count = 1000;
        assert_eq!(state.page_count(), 112);
    }
}
