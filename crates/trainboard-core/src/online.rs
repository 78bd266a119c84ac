// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Connectivity tracking

use std::sync::Arc;
use tokio::sync::watch;

/// Shared online/offline flag fed by the platform's network monitor
#[derive(Debug, Clone)]
pub struct OnlineManager {
    state: Arc<watch::Sender<bool>>,
}

impl Default for OnlineManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OnlineManager {
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a connectivity report; reachable only when both flags hold
    pub fn report(&self, connected: bool, internet_reachable: bool) {
        self.set_online(connected && internet_reachable);
    }

    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!("Connectivity changed: {}", if online { "online" } else { "offline" });
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
