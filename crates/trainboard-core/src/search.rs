// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Debounced station search
//
// Each keystroke cancels the pending search and restarts the quiet-period
// timer. Blank input never reaches the schedule source.

use crate::api::ScheduleSource;
use crate::models::StationSchedule;
use crate::types::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What the search screen renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Query the current results belong to
    pub query: String,
    pub results: Vec<StationSchedule>,
    pub is_loading: bool,
    pub error: Option<AppError>,
}

/// Search box state with a cancel-and-restart debounce
pub struct StationSearch<C> {
    client: Arc<C>,
    debounce: Duration,
    input: String,
    pending: Option<CancellationToken>,
    state: Arc<watch::Sender<SearchState>>,
}

impl<C: ScheduleSource> StationSearch<C> {
    pub fn new(client: Arc<C>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            client,
            debounce,
            input: String::new(),
            pending: None,
            state: Arc::new(state),
        }
    }

    /// Text changed; search once the input has been quiet for the debounce period
    pub fn input(&mut self, text: &str) {
        self.input = text.to_string();
        self.start(self.debounce);
    }

    /// Search the current input right away
    pub fn submit(&mut self) {
        self.start(Duration::ZERO);
    }

    pub fn current_input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    fn start(&mut self, delay: Duration) {
        self.cancel_pending();

        let query = self.input.trim().to_string();
        if query.is_empty() {
            self.state.send_modify(|state| *state = SearchState::default());
            return;
        }

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let client = self.client.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            tracing::debug!("Searching stations for {:?}", query);
            state.send_modify(|state| state.is_loading = true);

            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = client.search(&query) => result,
            };

            state.send_modify(move |state| {
                match result {
                    Ok(results) => {
                        state.results = results;
                        state.error = None;
                    }
                    Err(e) => {
                        tracing::warn!("Station search failed: {}", e);
                        state.error = Some(e);
                    }
                }
                state.query = query;
                state.is_loading = false;
            });
        });
    }
}

impl<C> Drop for StationSearch<C> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
