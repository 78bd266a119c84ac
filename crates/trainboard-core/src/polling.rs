// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Schedule polling
//
// Each subscription runs one task that refetches its query on a fixed
// interval, when its screen regains focus and when the app returns to the
// foreground. A subscription never has two fetches in flight; triggers that
// arrive meanwhile are folded into the running fetch.

use crate::api::{ScheduleQuery, ScheduleSource};
use crate::focus::{AppStatus, FocusManager};
use crate::models::StationSchedule;
use crate::online::OnlineManager;
use crate::query_cache::QueryCache;
use crate::types::AppError;
use async_channel::{Receiver, Sender};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Out-of-cycle refresh triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    /// The subscribing screen gained focus
    Focus,
    /// Pull-to-refresh or another explicit user request
    UserRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Observable state of one subscription
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub status: QueryStatus,
    /// Last successful result, kept while reloading and after errors
    pub data: Option<Vec<StationSchedule>>,
    pub error: Option<AppError>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueryState {
    fn initial(cached: Option<crate::query_cache::CachedResult>) -> Self {
        match cached {
            Some(cached) => Self {
                status: QueryStatus::Success,
                data: Some(cached.data),
                error: None,
                updated_at: Some(cached.fetched_at),
            },
            None => Self {
                status: QueryStatus::Idle,
                data: None,
                error: None,
                updated_at: None,
            },
        }
    }

    /// First load, nothing to show yet
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    /// Reloading while older data is on screen
    pub fn is_refetching(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_some()
    }
}

/// Creates polling subscriptions against one schedule source
pub struct Poller<C> {
    client: Arc<C>,
    cache: QueryCache,
    online: OnlineManager,
    focus: FocusManager,
    interval: Duration,
}

impl<C: ScheduleSource> Poller<C> {
    pub fn new(
        client: Arc<C>,
        cache: QueryCache,
        online: OnlineManager,
        focus: FocusManager,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            online,
            focus,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Point `handle` at `query`, stopping the old subscription
    ///
    /// The old query's cached result is dropped unless the key is unchanged.
    pub fn resubscribe(&self, handle: &mut PollHandle, query: ScheduleQuery) {
        let previous = std::mem::replace(handle, self.subscribe(query));
        let key = previous.key.clone();
        drop(previous);
        if key != handle.key {
            self.cache.invalidate(&key);
        }
    }

    /// Start polling `query` until the returned handle is dropped
    ///
    /// The first fetch happens immediately. Must be called inside a Tokio runtime.
    pub fn subscribe(&self, query: ScheduleQuery) -> PollHandle {
        let key = query.key();
        let (event_tx, event_rx) = async_channel::unbounded();
        let (state_tx, state_rx) = watch::channel(QueryState::initial(self.cache.get(&key)));
        let cancel = CancellationToken::new();

        tracing::debug!("Polling {} every {:?}", key, self.interval);

        let task = PollTask {
            query,
            client: self.client.clone(),
            cache: self.cache.clone(),
            online: self.online.clone(),
            focus: self.focus.clone(),
            interval: self.interval,
            events: event_rx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run());

        PollHandle {
            key,
            events: event_tx,
            state: state_rx,
            cancel,
        }
    }
}

/// Live subscription; dropping it stops polling and aborts any in-flight fetch
pub struct PollHandle {
    key: String,
    events: Sender<RefreshEvent>,
    state: watch::Receiver<QueryState>,
    cancel: CancellationToken,
}

impl PollHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn focus(&self) {
        self.send(RefreshEvent::Focus);
    }

    pub fn refresh(&self) {
        self.send(RefreshEvent::UserRefresh);
    }

    pub fn send(&self, event: RefreshEvent) {
        if self.events.try_send(event).is_err() {
            tracing::debug!("Poller for {} is gone, dropping {:?}", self.key, event);
        }
    }

    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Wait for the next state change
    pub async fn changed(&mut self) -> Result<QueryState, AppError> {
        self.state
            .changed()
            .await
            .map_err(|_| AppError::Network(format!("Poller for {} stopped", self.key)))?;
        Ok(self.state.borrow_and_update().clone())
    }

    pub fn watch(&self) -> watch::Receiver<QueryState> {
        self.state.clone()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PollTask<C> {
    query: ScheduleQuery,
    client: Arc<C>,
    cache: QueryCache,
    online: OnlineManager,
    focus: FocusManager,
    interval: Duration,
    events: Receiver<RefreshEvent>,
    state: watch::Sender<QueryState>,
    cancel: CancellationToken,
}

/// Focus and app-state bookkeeping for one subscription
struct Triggers {
    seen_focus: bool,
    app_status: AppStatus,
}

impl Triggers {
    /// Whether `event` should start a fetch
    fn accept(&mut self, event: RefreshEvent) -> bool {
        match event {
            RefreshEvent::Focus => {
                // The first focus arrives together with the mount fetch
                let refetch = self.seen_focus;
                self.seen_focus = true;
                refetch
            }
            RefreshEvent::UserRefresh => true,
        }
    }

    /// Whether the shared app state moved into the foreground
    fn app_status(&mut self, next: AppStatus) -> bool {
        let resumed = self.app_status != AppStatus::Active && next == AppStatus::Active;
        self.app_status = next;
        resumed
    }
}

impl<C: ScheduleSource> PollTask<C> {
    async fn run(self) {
        let key = self.query.key();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut online_rx = self.online.subscribe();
        let mut focus_rx = self.focus.subscribe();
        let mut triggers = Triggers {
            seen_focus: false,
            app_status: *focus_rx.borrow_and_update(),
        };
        let mut pending = false;

        loop {
            let trigger = tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => triggers.app_status == AppStatus::Active,
                event = self.events.recv() => match event {
                    Ok(event) => triggers.accept(event),
                    Err(_) => break,
                },
                changed = online_rx.changed() => {
                    let online = changed.is_ok() && *online_rx.borrow_and_update();
                    online && pending
                }
                changed = focus_rx.changed() => {
                    let status = if changed.is_ok() {
                        *focus_rx.borrow_and_update()
                    } else {
                        triggers.app_status
                    };
                    triggers.app_status(status)
                }
            };

            if !trigger {
                continue;
            }
            if !self.online.is_online() {
                tracing::debug!("Offline, deferring fetch of {}", key);
                pending = true;
                continue;
            }
            pending = false;

            self.state.send_modify(|state| state.status = QueryStatus::Loading);

            let result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.query.run(self.client.as_ref()) => result,
            };

            match result {
                Ok(data) => {
                    self.cache.insert(&key, data.clone());
                    self.state.send_modify(|state| {
                        state.status = QueryStatus::Success;
                        state.data = Some(data);
                        state.error = None;
                        state.updated_at = Some(Utc::now());
                    });
                }
                Err(e) => {
                    tracing::warn!("Fetching {} failed: {}", key, e);
                    self.state.send_modify(|state| {
                        state.status = QueryStatus::Error;
                        state.error = Some(e);
                    });
                }
            }

            while let Ok(event) = self.events.try_recv() {
                triggers.accept(event);
            }
            let status = *focus_rx.borrow_and_update();
            triggers.app_status(status);
        }

        tracing::debug!("Stopped polling {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::FakeSource;
    use std::sync::atomic::Ordering;
    use tokio::time::sleep;

    const INTERVAL: Duration = Duration::from_secs(10);

    fn poller(source: Arc<FakeSource>) -> (Poller<FakeSource>, QueryCache, OnlineManager) {
        let (poller, cache, online, _) = poller_with_focus(source);
        (poller, cache, online)
    }

    fn poller_with_focus(
        source: Arc<FakeSource>,
    ) -> (Poller<FakeSource>, QueryCache, OnlineManager, FocusManager) {
        let cache = QueryCache::new();
        let online = OnlineManager::default();
        let focus = FocusManager::default();
        let poller = Poller::new(source, cache.clone(), online.clone(), focus.clone(), INTERVAL);
        (poller, cache, online, focus)
    }

    fn ids() -> ScheduleQuery {
        ScheduleQuery::Stations(vec!["52ed".to_string(), "289d".to_string()])
    }

    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_fetch_per_interval() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, _) = poller(source.clone());
        let mut handle = poller.subscribe(ids());

        while handle.changed().await.unwrap().status != QueryStatus::Success {}
        settle().await;
        assert_eq!(source.calls(), 1);

        sleep(INTERVAL).await;
        assert_eq!(source.calls(), 2);
        sleep(INTERVAL).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_regain_fetches_once_but_not_on_mount() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, _) = poller(source.clone());
        let handle = poller.subscribe(ids());

        handle.focus();
        settle().await;
        assert_eq!(source.calls(), 1);

        sleep(Duration::from_secs(3)).await;
        handle.focus();
        settle().await;
        assert_eq!(source.calls(), 2);

        // Interval cadence is unaffected by the extra fetch
        sleep(Duration::from_secs(7)).await;
        assert_eq!(source.calls(), 3);

        handle.focus();
        settle().await;
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_transition_fetches() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, _, focus) = poller_with_focus(source.clone());
        let _handle = poller.subscribe(ids());
        settle().await;

        focus.set_status(AppStatus::Active);
        settle().await;
        assert_eq!(source.calls(), 1);

        focus.set_status(AppStatus::Background);
        // No interval polling while backgrounded
        sleep(Duration::from_secs(25)).await;
        assert_eq!(source.calls(), 1);

        focus.set_status(AppStatus::Active);
        settle().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_created_in_background_stays_idle() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, _, focus) = poller_with_focus(source.clone());
        let first = poller.subscribe(ScheduleQuery::Station("52ed".to_string()));
        settle().await;
        assert_eq!(source.calls(), 1);

        focus.set_status(AppStatus::Background);
        let second = poller.subscribe(ids());
        drop(first);

        sleep(Duration::from_secs(35)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(second.state().status, QueryStatus::Idle);

        focus.set_status(AppStatus::Active);
        settle().await;
        assert_eq!(source.calls(), 2);
        assert_eq!(second.state().status, QueryStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_during_fetch_are_coalesced() {
        let source = Arc::new(FakeSource::default());
        *source.delay.lock().unwrap() = Some(Duration::from_secs(3));
        let (poller, _, _) = poller(source.clone());
        let handle = poller.subscribe(ids());

        settle().await;
        assert!(handle.state().is_loading());
        handle.refresh();
        handle.refresh();
        handle.focus();
        handle.focus();

        sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.state().status, QueryStatus::Success);
        assert_eq!(source.calls(), 1);

        // Next interval tick starts a refetch with the old data still visible
        sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 2);
        assert!(handle.state().is_refetching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_defers_until_reconnect() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, online) = poller(source.clone());
        online.set_online(false);
        let handle = poller.subscribe(ids());

        sleep(Duration::from_secs(25)).await;
        assert_eq!(source.calls(), 0);
        assert_eq!(handle.state().status, QueryStatus::Idle);

        online.set_online(true);
        settle().await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_keep_previous_data() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, _) = poller(source.clone());
        let handle = poller.subscribe(ids());
        settle().await;

        source.fail.store(true, Ordering::SeqCst);
        handle.refresh();
        settle().await;

        let state = handle.state();
        assert_eq!(state.status, QueryStatus::Error);
        assert!(matches!(state.error, Some(AppError::Network(_))));
        assert_eq!(state.data.unwrap().len(), 2);

        source.fail.store(false, Ordering::SeqCst);
        handle.refresh();
        settle().await;
        assert_eq!(handle.state().status, QueryStatus::Success);
        assert_eq!(handle.state().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_in_flight_fetch() {
        let source = Arc::new(FakeSource::default());
        *source.delay.lock().unwrap() = Some(Duration::from_secs(5));
        let (poller, cache, _) = poller(source.clone());
        let handle = poller.subscribe(ids());

        settle().await;
        assert_eq!(source.calls(), 1);
        drop(handle);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);
        assert!(cache.get(&ids().key()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribe_forgets_previous_result() {
        let source = Arc::new(FakeSource::default());
        let (poller, cache, _) = poller(source.clone());
        let mut handle = poller.subscribe(ids());
        settle().await;
        assert!(cache.get(&ids().key()).is_some());

        let narrowed = ScheduleQuery::Stations(vec!["52ed".to_string()]);
        poller.resubscribe(&mut handle, narrowed.clone());
        settle().await;

        assert_eq!(handle.key(), narrowed.key());
        assert!(cache.get(&ids().key()).is_none());
        assert!(cache.get(&narrowed.key()).is_some());
        assert_eq!(cache.len(), 1);

        // Same key keeps its entry
        poller.resubscribe(&mut handle, narrowed.clone());
        assert!(cache.get(&narrowed.key()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_subscription_starts_from_cache() {
        let source = Arc::new(FakeSource::default());
        let (poller, _, _) = poller(source.clone());
        let first = poller.subscribe(ids());
        settle().await;
        drop(first);

        let second = poller.subscribe(ids());
        let state = second.state();
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.data.unwrap()[0].id, "52ed");
    }
}
