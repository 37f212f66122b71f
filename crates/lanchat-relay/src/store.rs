//! Append-only message store.
//!
//! Two ordered sequences live here: global records (replayed to every
//! newcomer) and private records (kept for the life of the process but
//! never replayed). Nothing is ever removed or reordered, and nothing is
//! persisted across restarts.

use crate::{Destination, Record};

/// In-memory history of every accepted record.
#[derive(Debug, Default)]
pub struct MessageStore {
    global: Vec<Record>,
    private: Vec<Record>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a global record and returns the stored copy.
    pub fn append_global(&mut self, record: Record) -> &Record {
        debug_assert!(record.is_global(), "global store got a private record");
        self.global.push(record);
        &self.global[self.global.len() - 1]
    }

    /// Appends a private record and returns the stored copy.
    pub fn append_private(&mut self, record: Record) -> &Record {
        debug_assert!(!record.is_global(), "private store got a global record");
        self.private.push(record);
        &self.private[self.private.len() - 1]
    }

    /// Global records in the order they were accepted.
    pub fn global_history(&self) -> &[Record] {
        &self.global
    }

    /// The most recent private record from `sender` to `destination`.
    pub fn latest_private_for(&self, sender: &str, destination: &str) -> Option<&Record> {
        self.private.iter().rev().find(|r| {
            r.sender == sender
                && matches!(&r.destination, Destination::User(name) if name == destination)
        })
    }

    pub fn global_len(&self) -> usize {
        self.global.len()
    }

    pub fn private_len(&self) -> usize {
        self.private.len()
    }

    /// Total records held, global and private.
    pub fn total_len(&self) -> usize {
        self.global.len() + self.private.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private(sender: &str, to: &str, text: &str) -> Record {
        Record::text(sender, Destination::User(to.into()), text)
    }

    #[test]
    fn test_append_global_preserves_order() {
        let mut store = MessageStore::new();
        store.append_global(Record::text("alice", Destination::All, "one"));
        store.append_global(Record::text("bob", Destination::All, "two"));

        let texts: Vec<_> = store
            .global_history()
            .iter()
            .map(|r| r.content.as_str())
            .collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[test]
    fn test_append_returns_stored_record() {
        let mut store = MessageStore::new();

        let stored = store.append_private(private("alice", "bob", "psst"));

        assert_eq!(stored.content, "psst");
        assert_eq!(store.private_len(), 1);
        assert_eq!(store.global_len(), 0);
    }

    #[test]
    fn test_private_records_are_not_in_global_history() {
        let mut store = MessageStore::new();
        store.append_private(private("alice", "bob", "psst"));
        store.append_global(Record::text("alice", Destination::All, "hi"));

        assert_eq!(store.global_history().len(), 1);
        assert_eq!(store.total_len(), 2);
    }

    #[test]
    fn test_latest_private_for_returns_newest_match() {
        let mut store = MessageStore::new();
        store.append_private(private("alice", "bob", "first"));
        store.append_private(private("alice", "carol", "other"));
        store.append_private(private("alice", "bob", "second"));

        let latest = store.latest_private_for("alice", "bob").unwrap();

        assert_eq!(latest.content, "second");
        assert!(store.latest_private_for("bob", "alice").is_none());
    }
}
