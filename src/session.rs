//! Client-side authenticated-user state.
//!
//! A [`SessionStore`] is an explicit context object handed to whatever needs
//! the current user. It caches the profile through a [`KeyValueStore`] so a
//! restart picks up where the last run left off.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::models::UserProfile;

/// Fixed key under which the profile is cached.
pub const SESSION_KEY: &str = "user";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One JSON file per key inside `dir`.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::write(self.path(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    fn entries(&self) -> io::Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "session store lock poisoned"))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// What the client keeps about the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub profile: UserProfile,
    pub token: String,
}

pub struct SessionStore<S: KeyValueStore> {
    store: S,
    current: Option<SessionUser>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Restores the cached user. An unreadable entry is dropped.
    pub fn init(&mut self) -> io::Result<Option<&SessionUser>> {
        self.current = match self.store.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<SessionUser>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    log::warn!("⚠️  Discarding corrupt cached session: {}", e);
                    self.store.remove(SESSION_KEY)?;
                    None
                }
            },
            None => None,
        };
        Ok(self.current.as_ref())
    }

    pub fn current(&self) -> Option<&SessionUser> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Login and profile updates go through here.
    pub fn set_user(&mut self, user: SessionUser) -> io::Result<()> {
        let raw = serde_json::to_string(&user).map_err(io::Error::other)?;
        self.store.set(SESSION_KEY, &raw)?;
        self.current = Some(user);
        Ok(())
    }

    pub fn clear(&mut self) -> io::Result<()> {
        self.store.remove(SESSION_KEY)?;
        self.current = None;
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
