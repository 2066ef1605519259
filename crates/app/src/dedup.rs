//! Bounded memory of recently processed command ids.

use std::collections::{HashSet, VecDeque};

use chrono::TimeDelta;
use growhub_domain::command::CommandOrigin;
use growhub_domain::id::CommandId;
use growhub_domain::time::Timestamp;

pub const DEFAULT_WINDOW: TimeDelta = TimeDelta::minutes(10);
pub const DEFAULT_CAPACITY: usize = 1024;

/// Ids are only unique per origin.
type Key = (CommandOrigin, CommandId);

/// Origin-scoped ids seen within `window`, capped at `capacity` entries
/// (oldest evicted first).
#[derive(Debug)]
pub struct RecentCommands {
    window: TimeDelta,
    capacity: usize,
    order: VecDeque<(Key, Timestamp)>,
    seen: HashSet<Key>,
}

impl Default for RecentCommands {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_CAPACITY)
    }
}

impl RecentCommands {
    #[must_use]
    pub fn new(window: TimeDelta, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window,
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Whether `id` from `origin` was processed within the window ending at
    /// `now`.
    pub fn contains(&mut self, origin: CommandOrigin, id: &CommandId, now: Timestamp) -> bool {
        self.expire(now);
        self.seen.contains(&(origin, id.clone()))
    }

    /// Remember `id` from `origin` as processed at `now`.
    pub fn insert(&mut self, origin: CommandOrigin, id: CommandId, now: Timestamp) {
        self.expire(now);
        let key = (origin, id);
        if !self.seen.insert(key.clone()) {
            return;
        }
        self.order.push_back((key, now));
        while self.order.len() > self.capacity {
            if let Some((evicted, _)) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn expire(&mut self, now: Timestamp) {
        while let Some((key, at)) = self.order.front() {
            if now - *at < self.window {
                break;
            }
            self.seen.remove(key);
            self.order.pop_front();
        }
    }
}
