use std::rc::Rc;

use tracing::debug;

use crate::client::Transport;
use crate::form::SearchFormListener;
use crate::models::User;
use crate::results::ResultsView;

/// Page container: turns search form emissions into result view inputs.
pub struct SearchPage<T> {
    results: Rc<ResultsView<T>>,
}

impl<T: Transport + 'static> SearchPage<T> {
    pub fn new(results: Rc<ResultsView<T>>) -> Rc<Self> {
        Rc::new(Self { results })
    }

    #[cfg(test)]
    pub fn results(&self) -> &Rc<ResultsView<T>> {
        &self.results
    }
}

impl<T: Transport + 'static> SearchFormListener for SearchPage<T> {
    fn results_ready(&self, items: Vec<User>) {
        debug!(count = items.len(), "Search results received");
        self.results.set_results(items);
    }

    fn query_changed(&self, query: &str) {
        self.results.set_query(query);
    }

    fn total_changed(&self, total: u64) {
        self.results.set_total_results(total);
    }

    fn page_changed(&self, page: i64) {
        self.results.set_current_page(page);
    }
}
