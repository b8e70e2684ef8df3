//! Session store implementation

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::events::{Notification, NotificationSink};

use super::profile::UserProfile;
use super::storage::ProfileStorage;

/// Key the profile is persisted under
pub const STORAGE_KEY: &str = "user";

/// Holds at most one authenticated profile
pub struct SessionStore {
    storage: Box<dyn ProfileStorage>,
    profile: Option<UserProfile>,
    notifier: Arc<dyn NotificationSink>,
}

impl SessionStore {
    /// Open the store and rehydrate any persisted profile.
    ///
    /// A stored value that cannot be read back is discarded and the store
    /// starts empty; the only trace is a log line.
    pub fn open(storage: Box<dyn ProfileStorage>, notifier: Arc<dyn NotificationSink>) -> Self {
        let mut store = Self {
            storage,
            profile: None,
            notifier,
        };
        store.rehydrate();
        store
    }

    fn rehydrate(&mut self) {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no persisted profile");
                return;
            }
            Err(e) => {
                warn!(?e, "failed to read persisted profile");
                return;
            }
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => {
                info!(id = %profile.id, "profile restored");
                self.profile = Some(profile);
            }
            Err(e) => {
                let e = StorageError::from(e);
                warn!(%e, "discarding persisted profile");
                if let Err(e) = self.storage.remove(STORAGE_KEY) {
                    warn!(?e, "failed to remove corrupt profile");
                }
            }
        }
    }

    /// The resident profile, if any
    pub fn current_profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    /// Store `profile`, replacing whatever was resident
    pub fn sign_in(&mut self, profile: UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&profile)?;
        self.storage.set(STORAGE_KEY, &raw)?;

        info!(id = %profile.id, "signed in");
        self.notifier.notify(Notification::signed_in(&profile.name));
        self.profile = Some(profile);
        Ok(())
    }

    /// Clear the profile from durable storage and memory. Safe to repeat.
    ///
    /// If the durable copy cannot be removed the resident profile is kept,
    /// so memory never disagrees with what a restart would restore.
    pub fn sign_out(&mut self) -> Result<(), StorageError> {
        self.storage.remove(STORAGE_KEY)?;
        self.profile = None;

        info!("signed out");
        self.notifier.notify(Notification::signed_out());
        Ok(())
    }
}
