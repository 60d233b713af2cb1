use serenity::model::id::ChannelId;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::sources::Track;

/// A queued track together with the channel that asked for it.
///
/// Notices about this track (now playing, retries, failures) go back to
/// `reply_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub track: Track,
    pub reply_to: ChannelId,
}

impl QueueEntry {
    pub fn new(track: Track, reply_to: ChannelId) -> Self {
        Self { track, reply_to }
    }
}

/// FIFO play queue with head insertion for "play next" requests.
///
/// Unbounded; duplicates are allowed.
#[derive(Debug, Default)]
pub struct TrackQueue {
    items: VecDeque<QueueEntry>,
}

impl TrackQueue {
    /// Appends to the tail and returns the 1-based position.
    pub fn push_back(&mut self, entry: QueueEntry) -> usize {
        info!("➕ Agregado a la cola: {}", entry.track.title());
        self.items.push_back(entry);
        self.items.len()
    }

    /// Puts the entry first in line.
    pub fn push_front(&mut self, entry: QueueEntry) {
        info!("⏫ Agregado al frente de la cola: {}", entry.track.title());
        self.items.push_front(entry);
    }

    /// Takes the head of the queue (strict FIFO).
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        let next = self.items.pop_front();
        match &next {
            Some(entry) => debug!("➡️ Siguiente en cola: {}", entry.track.title()),
            None => debug!("📭 Cola vacía, no hay siguiente track"),
        }
        next
    }

    /// Drops every pending entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        if removed > 0 {
            info!("🗑️ Cola limpiada ({} canciones)", removed);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of the pending tracks in play order.
    pub fn tracks(&self) -> Vec<Track> {
        self.items.iter().map(|entry| entry.track.clone()).collect()
    }
}
