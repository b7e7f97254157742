//! Message Store
//!
//! Single source of truth for the ordered message list of the open
//! conversation. History fetches, optimistic sends and channel pushes all
//! land here; de-duplication and ordering live in [`MessageStore::merge`].
//!
//! Ordering invariant: non-decreasing `created_at`, ties broken by arrival
//! order. Reconciliation replaces a provisional entry in place and never
//! reorders already-rendered entries.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::types::{ChatEntry, Delivery, Message, MessageId};

#[derive(Debug, Default)]
pub struct MessageStore {
    entries: Vec<ChatEntry>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load history for a newly opened conversation, fully replacing prior
    /// content. Stable sort, so equal timestamps keep the service's order.
    pub fn replace_all(&mut self, messages: &[Message]) {
        let mut entries: Vec<ChatEntry> = messages.iter().map(ChatEntry::from_message).collect();
        entries.sort_by_key(|e| e.created_at);
        self.entries = entries;
    }

    /// Merge one authoritative message. Idempotent under re-delivery.
    ///
    /// 1. Same id already present: replace that entry in place (covers the
    ///    echo of a known message and re-delivered push events).
    /// 2. Operator-authored and an unreconciled provisional entry has equal
    ///    content: reconcile that entry in place, oldest first. Content
    ///    equality is the only correlation the protocol offers — the
    ///    provisional entry has no authoritative id to match against.
    /// 3. Otherwise insert after the last entry with `created_at` not
    ///    greater than the incoming one.
    pub fn merge(&mut self, incoming: &Message) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| matches!(&e.id, MessageId::Assigned(id) if *id == incoming.id))
        {
            *entry = ChatEntry::from_message(incoming);
            return;
        }

        if incoming.from_operator {
            if let Some(entry) = self
                .entries
                .iter_mut()
                .find(|e| e.is_provisional() && e.from_operator && e.content == incoming.content)
            {
                *entry = ChatEntry::from_message(incoming);
                return;
            }
        }

        let pos = self
            .entries
            .iter()
            .rposition(|e| e.created_at <= incoming.created_at)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.entries.insert(pos, ChatEntry::from_message(incoming));
    }

    /// Append an optimistic operator entry and return its temporary id for
    /// later reconciliation or failure marking.
    pub fn append_provisional(&mut self, content: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push(ChatEntry {
            id: MessageId::Provisional(id),
            content: content.to_string(),
            from_operator: true,
            created_at: Utc::now(),
            delivery: Delivery::Pending,
        });
        id
    }

    /// Flag a provisional entry as failed. The entry stays visible: content
    /// typed by an operator never vanishes without an explicit failure
    /// indication. Returns false when the entry is gone (e.g. the store was
    /// reloaded for another conversation in the meantime).
    pub fn mark_failed(&mut self, provisional_id: Uuid) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.id == MessageId::Provisional(provisional_id))
        {
            Some(entry) => {
                entry.delivery = Delivery::Failed;
                true
            }
            None => {
                debug!(%provisional_id, "provisional entry no longer present");
                false
            }
        }
    }
}
