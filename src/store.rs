//! Durable client state: the auth credential and the active-session pointer.
//!
//! Both entries live in one JSON document but are set and cleared
//! independently. Every mutation is flushed before returning, so the pointer
//! written when a session starts survives a crash.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::models::{Credential, UserProfile};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth: Option<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_session: Option<String>,
}

pub struct StateStore {
    path: PathBuf,
    data: RwLock<PersistedState>,
}

impl StateStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create state directory {}", parent.display())
            })?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unreadable state file {}: {}",
                    path.display(),
                    err
                );
                PersistedState::default()
            })
        } else {
            PersistedState::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn credential(&self) -> Option<Credential> {
        self.read().auth.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().auth.as_ref().map(|auth| auth.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().auth.as_ref().and_then(|auth| auth.user.clone())
    }

    pub fn set_credential(&self, credential: Credential) -> Result<()> {
        let mut guard = self.write();
        guard.auth = Some(credential);
        self.persist(&guard)
    }

    pub fn clear_credential(&self) -> Result<()> {
        let mut guard = self.write();
        if guard.auth.take().is_none() {
            return Ok(());
        }
        self.persist(&guard)
    }

    pub fn session_pointer(&self) -> Option<String> {
        self.read().active_session.clone()
    }

    pub fn set_session_pointer(&self, session_id: &str) -> Result<()> {
        let mut guard = self.write();
        if guard.active_session.as_deref() == Some(session_id) {
            return Ok(());
        }
        guard.active_session = Some(session_id.to_string());
        self.persist(&guard)
    }

    pub fn clear_session_pointer(&self) -> Result<()> {
        let mut guard = self.write();
        if guard.active_session.take().is_none() {
            return Ok(());
        }
        self.persist(&guard)
    }

    // A poisoned lock only means another thread panicked mid-update; the
    // in-memory copy is still a valid document.
    fn read(&self) -> RwLockReadGuard<'_, PersistedState> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, PersistedState> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &PersistedState) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("Failed to write state to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace state file {}", self.path.display()))
    }
}
