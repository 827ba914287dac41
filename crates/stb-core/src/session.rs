//! Per-chat memory of the last search result.
//!
//! Lets `/download` with no argument pick up whatever `/search` found last in
//! the same chat. Entries expire after a fixed TTL.

use std::{collections::HashMap, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::domain::{ChatId, Track};

#[derive(Debug)]
struct Entry {
    track: Track,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<ChatId, Entry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Remember `track` as this chat's last search result. Purges expired
    /// entries of other chats while holding the lock.
    pub async fn remember(&self, chat_id: ChatId, track: Track) {
        let now = Instant::now();
        let mut map = self.inner.lock().await;
        map.retain(|_, e| now.duration_since(e.stored_at) < self.ttl);
        map.insert(
            chat_id,
            Entry {
                track,
                stored_at: now,
            },
        );
    }

    /// Last search result for the chat, unless it expired.
    pub async fn last_track(&self, chat_id: ChatId) -> Option<Track> {
        let map = self.inner.lock().await;
        map.get(&chat_id)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.track.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
