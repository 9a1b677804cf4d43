//! Result table shared by the worker and readers
//!
//! One entry per distinct source text. An entry is created pending at
//! submission, filled exactly once by the worker, and removed by the first
//! read that sees it filled. Readers wait on a `watch` channel owned by the
//! entry, so they wake as soon as the outcome lands or the entry goes away.
//!
//! Fragments translated while the user kept typing are published but never
//! read. Only the [`MAX_UNREAD`] most recently filled entries are kept; older
//! ones are evicted on publication.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::broker::request::Outcome;

/// Filled entries kept for readers that have not come yet
pub const MAX_UNREAD: usize = 32;

#[derive(Debug)]
struct Entry {
    /// Distinguishes an entry from a later one created for the same text
    id: u64,
    tx: watch::Sender<Option<Outcome>>,
}

impl Entry {
    fn is_pending(&self) -> bool {
        self.tx.borrow().is_none()
    }
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<String, Entry>,
    /// Filled entries as (text, id), oldest first
    filled: VecDeque<(String, u64)>,
    next_id: u64,
}

impl Table {
    fn is_filled(&self, text: &str, id: u64) -> bool {
        self.entries
            .get(text)
            .is_some_and(|entry| entry.id == id && !entry.is_pending())
    }

    fn evict_unread(&mut self) {
        let mut filled = std::mem::take(&mut self.filled);
        filled.retain(|(text, id)| self.is_filled(text, *id));

        while filled.len() > MAX_UNREAD {
            if let Some((text, _)) = filled.pop_front() {
                self.entries.remove(&text);
            }
        }
        self.filled = filled;
    }
}

#[derive(Debug, Default)]
pub struct ResultTable {
    table: Mutex<Table>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a pending entry for `text`, replacing any previous one
    ///
    /// Readers still waiting on the replaced entry move over to the new one.
    pub fn insert_pending(&self, text: &str) {
        let mut table = self.lock();
        let id = table.next_id;
        table.next_id += 1;
        let (tx, _) = watch::channel(None);
        table.entries.insert(text.to_string(), Entry { id, tx });
    }

    /// Fill the entry for `text` with its outcome
    ///
    /// Only a pending entry is filled. Returns `false` when there is no entry
    /// or it already holds an outcome. Readers already waiting on the entry
    /// receive the outcome even if it is evicted right away.
    pub fn publish(&self, text: &str, outcome: Outcome) -> bool {
        let mut table = self.lock();
        let id = match table.entries.get(text) {
            Some(entry) if entry.is_pending() => {
                entry.tx.send_replace(Some(outcome));
                entry.id
            }
            _ => return false,
        };

        table.filled.push_back((text.to_string(), id));
        table.evict_unread();
        true
    }

    /// Remove the entry for `text` if it is still pending
    ///
    /// Waiting readers wake up and see the text as not found.
    pub fn discard(&self, text: &str) -> bool {
        let mut table = self.lock();
        let pending = table.entries.get(text).is_some_and(Entry::is_pending);
        if pending {
            table.entries.remove(text);
        }
        pending
    }

    /// Wait for the outcome of `text` and clear its entry
    ///
    /// Returns `None` for text with no entry: never submitted, already read,
    /// or superseded in the queue.
    pub async fn take(&self, text: &str) -> Option<Outcome> {
        loop {
            let (id, mut rx) = {
                let mut table = self.lock();
                let Some(entry) = table.entries.get(text) else {
                    return None;
                };
                let current = entry.tx.borrow().clone();
                if let Some(outcome) = current {
                    table.entries.remove(text);
                    return Some(outcome);
                }
                (entry.id, entry.tx.subscribe())
            };

            let filled = match rx.wait_for(Option::is_some).await {
                Ok(value) => value.clone(),
                // Entry was replaced or discarded, look again
                Err(_) => continue,
            };

            if let Some(outcome) = filled {
                self.remove_entry(text, id);
                return Some(outcome);
            }
        }
    }

    fn remove_entry(&self, text: &str, id: u64) {
        let mut table = self.lock();
        if table.entries.get(text).is_some_and(|entry| entry.id == id) {
            table.entries.remove(text);
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lock().entries.contains_key(text)
    }

    pub fn is_pending(&self, text: &str) -> bool {
        self.lock().entries.get(text).is_some_and(Entry::is_pending)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
