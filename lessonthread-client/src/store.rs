use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use crate::api::{CommentId, CourseId};

/// Key/value persistence the interaction store is built on. The page
/// environment injects whatever it has (browser local storage, a file, a
/// test map); the engine never touches ambient global state.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory backend; the default for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryBackend(Mutex<HashMap<String, String>>);

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Per-course client-persisted state: like toggles and anonymous deletion
/// credentials. All operations are synchronous and idempotent; a corrupt
/// or absent backing value reads as an empty store.
pub struct InteractionStore {
    course: CourseId,
    backend: Box<dyn StorageBackend>,
}

impl InteractionStore {
    pub fn new(course: CourseId, backend: Box<dyn StorageBackend>) -> InteractionStore {
        InteractionStore { course, backend }
    }

    pub fn course(&self) -> &CourseId {
        &self.course
    }

    fn likes_key(&self) -> String {
        format!("c_likes_{}", self.course)
    }

    fn credential_key(id: &CommentId) -> String {
        format!("c_del_{id}")
    }

    fn likes(&self) -> HashMap<String, u8> {
        self.backend
            .get(&self.likes_key())
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Flips the per-device like toggle and returns the new state.
    /// A "like" is a local preference, not a server-tracked count.
    pub fn toggle_like(&self, id: &CommentId) -> u8 {
        let mut likes = self.likes();
        let state = likes.entry(id.0.clone()).or_insert(0);
        *state = if *state == 0 { 1 } else { 0 };
        let new_state = *state;
        match serde_json::to_string(&likes) {
            Ok(raw) => self.backend.set(&self.likes_key(), &raw),
            Err(err) => tracing::warn!(?err, "failed serializing like map"),
        }
        new_state
    }

    pub fn like_count(&self, id: &CommentId) -> u8 {
        self.likes().get(id.as_str()).copied().unwrap_or(0)
    }

    /// Overwrites any prior credential for this id. Only the create path
    /// calls this, and only when the server issued a token.
    pub fn remember_deletion_credential(&self, id: &CommentId, token: &str) {
        self.backend.set(&Self::credential_key(id), token);
    }

    pub fn deletion_credential(&self, id: &CommentId) -> Option<String> {
        self.backend.get(&Self::credential_key(id))
    }

    pub fn forget_deletion_credential(&self, id: &CommentId) {
        self.backend.remove(&Self::credential_key(id));
    }
}
