// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Application state tracking

use std::sync::Arc;
use tokio::sync::watch;

/// OS-level application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Active,
    Inactive,
    Background,
}

/// Shared foreground/background state fed by the platform's app-state events
///
/// Every poll subscription reads the same value, so one created while the
/// app is in the background stays idle until the app is active again.
#[derive(Debug, Clone)]
pub struct FocusManager {
    state: Arc<watch::Sender<AppStatus>>,
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new(AppStatus::Active)
    }
}

impl FocusManager {
    pub fn new(status: AppStatus) -> Self {
        let (state, _) = watch::channel(status);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn status(&self) -> AppStatus {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.status() == AppStatus::Active
    }

    pub fn set_status(&self, status: AppStatus) {
        let changed = self.state.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::info!("App state changed: {:?}", status);
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AppStatus> {
        self.state.subscribe()
    }
}
