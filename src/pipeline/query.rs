use crate::presenter::{render, Screen};
use crate::search::ResultRecord;

/// Mutable per-query state driving presentation
#[derive(Debug, Clone, Default)]
pub struct QuerySession {
    query: String,
    loading: bool,
    results: Vec<ResultRecord>,
    /// Token of the most recently issued query
    latest_token: u64,
}

impl QuerySession {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// Start a new query, discarding the previous results.
    /// Returns the token identifying this query.
    pub fn begin(&mut self, query: &str) -> u64 {
        self.latest_token += 1;
        self.query = query.to_string();
        self.loading = true;
        self.results.clear();
        self.latest_token
    }

    /// Whether `token` belongs to the most recent query
    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest_token
    }

    /// Replace the results and end the loading state
    pub fn complete(&mut self, results: Vec<ResultRecord>) {
        self.results = results;
        self.loading = false;
    }

    /// Forget everything; outstanding tokens become stale
    pub fn reset(&mut self) {
        self.query.clear();
        self.loading = false;
        self.results.clear();
        self.latest_token += 1;
    }

    pub fn screen(&self) -> Screen {
        render(&self.query, self.loading, &self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::View;
    use crate::search::{ResultKind, ResultRecord};

    #[test]
    fn test_begin_issues_increasing_tokens() {
        let mut session = QuerySession::default();
        let first = session.begin("weather");
        let second = session.begin("time");
        assert!(second > first);
        assert!(session.is_current(second));
        assert!(!session.is_current(first));
        assert_eq!(session.query(), "time");
    }

    #[test]
    fn test_begin_discards_previous_results() {
        let mut session = QuerySession::default();
        session.begin("weather");
        session.complete(vec![ResultRecord::new(ResultKind::Knowledge, "a", "b")]);
        assert_eq!(session.results().len(), 1);

        session.begin("time");
        assert!(session.results().is_empty());
        assert!(session.is_loading());
        assert_eq!(session.screen().view, View::Loading);
    }

    #[test]
    fn test_reset_invalidates_tokens() {
        let mut session = QuerySession::default();
        let token = session.begin("weather");
        session.reset();
        assert!(!session.is_current(token));
        assert_eq!(session.screen().view, View::Prompt);
    }
}
