//! Ordered, duplicate-free timelines.
//!
//! Two write paths feed the same displayed collection: paginated history
//! fetches and realtime push events, which arrive in no particular order
//! relative to each other. The timeline recovers the domain order from the
//! creation timestamp (ties broken by id) and applies each item at most
//! once, so a push event racing the page fetch that also contains it can
//! never produce a duplicate row.

use chrono::{DateTime, Utc};
use studyhall_shared::{ChatEvent, ChatMessage, Notification, NotificationEvent, StatusPost};

/// An item that can live in a timeline.
pub trait TimelineEntry {
    fn entry_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

impl TimelineEntry for ChatMessage {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TimelineEntry for StatusPost {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TimelineEntry for Notification {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered collection of unique items, sorted by creation time ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline<T> {
    entries: Vec<T>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: TimelineEntry> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.entry_id() == id)
    }

    /// Merge one fetched page in. Sort order, not position, decides where
    /// the page lands, so callers need not know whether they fetched older
    /// or newer history. Items already present are skipped.
    pub fn merge_page(&mut self, page: Vec<T>) {
        for item in page {
            if !self.contains(item.entry_id()) {
                self.entries.push(item);
            }
        }
        self.entries
            .sort_by(|a, b| (a.created_at(), a.entry_id()).cmp(&(b.created_at(), b.entry_id())));
    }

    /// Insert a pushed item at its sorted position. Duplicate delivery is a
    /// no-op; returns whether the item was inserted.
    pub fn apply_create(&mut self, item: T) -> bool {
        if self.contains(item.entry_id()) {
            return false;
        }
        let pos = self
            .entries
            .binary_search_by(|e| {
                (e.created_at(), e.entry_id()).cmp(&(item.created_at(), item.entry_id()))
            })
            .unwrap_or_else(|pos| pos);
        self.entries.insert(pos, item);
        true
    }

    /// Replace the item with the matching id. An update for an item not in
    /// view is dropped; returns whether anything changed.
    pub fn apply_update(&mut self, item: T) -> bool {
        let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.entry_id() == item.entry_id())
        else {
            return false;
        };
        if self.entries[pos].created_at() == item.created_at() {
            self.entries[pos] = item;
        } else {
            // sort key moved; re-place the entry
            self.entries.remove(pos);
            self.apply_create(item);
        }
        true
    }

    /// Remove the item with the matching id; a repeat delete is a no-op.
    pub fn apply_delete(&mut self, id: &str) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.entry_id() == id) else {
            return false;
        };
        self.entries.remove(pos);
        true
    }
}

/// Route a chat push event into a message timeline.
pub fn apply_chat_event(timeline: &mut Timeline<ChatMessage>, event: ChatEvent) {
    match event {
        ChatEvent::MessageCreated { message } => {
            timeline.apply_create(message);
        }
        ChatEvent::MessageUpdated { message } => {
            timeline.apply_update(message);
        }
        ChatEvent::MessageDeleted { id } => {
            timeline.apply_delete(&id);
        }
    }
}

/// Route a notification push event into a notification timeline.
pub fn apply_notification_event(timeline: &mut Timeline<Notification>, event: NotificationEvent) {
    match event {
        NotificationEvent::Notification { notification } => {
            timeline.apply_create(notification);
        }
    }
}
