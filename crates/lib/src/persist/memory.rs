//! In-memory settings store
//!
//! Mutex-guarded implementation of [`SettingsStore`] holding everything in
//! process memory. Used by tests and by embedders that have not wired a disk
//! store yet.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{PersistError, SettingsStore};
use crate::{config::ServerConfig, store::UserState};

#[derive(Debug, Default)]
struct MemoryMaps {
    user_state: Option<UserState>,
    server_config: Option<ServerConfig>,
    user_keys: HashMap<String, String>,
    private_keys: HashMap<String, String>,
    remembered_email: Option<String>,
    device_id: Option<String>,
}

/// An in-memory [`SettingsStore`].
#[derive(Debug, Default)]
pub struct InMemory {
    maps: Mutex<MemoryMaps>,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, MemoryMaps>, PersistError> {
        self.maps.lock().map_err(|_| PersistError::Backend {
            reason: "settings store mutex poisoned".to_string(),
        })
    }
}

impl SettingsStore for InMemory {
    fn user_state(&self) -> Result<Option<UserState>, PersistError> {
        Ok(self.guard()?.user_state.clone())
    }

    fn set_user_state(&self, state: Option<&UserState>) -> Result<(), PersistError> {
        self.guard()?.user_state = state.cloned();
        Ok(())
    }

    fn server_config(&self) -> Result<Option<ServerConfig>, PersistError> {
        Ok(self.guard()?.server_config.clone())
    }

    fn set_server_config(&self, config: Option<&ServerConfig>) -> Result<(), PersistError> {
        self.guard()?.server_config = config.cloned();
        Ok(())
    }

    fn user_key(&self, user_id: &str) -> Result<Option<String>, PersistError> {
        Ok(self.guard()?.user_keys.get(user_id).cloned())
    }

    fn set_user_key(&self, user_id: &str, key: Option<&str>) -> Result<(), PersistError> {
        let mut maps = self.guard()?;
        match key {
            Some(key) => {
                maps.user_keys.insert(user_id.to_string(), key.to_string());
            }
            None => {
                maps.user_keys.remove(user_id);
            }
        }
        Ok(())
    }

    fn private_key(&self, user_id: &str) -> Result<Option<String>, PersistError> {
        Ok(self.guard()?.private_keys.get(user_id).cloned())
    }

    fn set_private_key(&self, user_id: &str, key: Option<&str>) -> Result<(), PersistError> {
        let mut maps = self.guard()?;
        match key {
            Some(key) => {
                maps.private_keys.insert(user_id.to_string(), key.to_string());
            }
            None => {
                maps.private_keys.remove(user_id);
            }
        }
        Ok(())
    }

    fn remembered_email(&self) -> Result<Option<String>, PersistError> {
        Ok(self.guard()?.remembered_email.clone())
    }

    fn set_remembered_email(&self, email: Option<&str>) -> Result<(), PersistError> {
        self.guard()?.remembered_email = email.map(str::to_string);
        Ok(())
    }

    fn device_id(&self) -> Result<Option<String>, PersistError> {
        Ok(self.guard()?.device_id.clone())
    }

    fn set_device_id(&self, device_id: &str) -> Result<(), PersistError> {
        self.guard()?.device_id = Some(device_id.to_string());
        Ok(())
    }
}
