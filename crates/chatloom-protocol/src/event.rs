use crate::item::ThreadItem;
use crate::update::ThreadItemUpdate;
use serde::{Deserialize, Serialize};

/// Severity of an out-of-band notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transport-level notification: an item's creation, partial mutation,
/// or completion, or an out-of-band signal.
///
/// For any item id, the event sequence referencing it is either a single
/// `item_done` (atomic emission) or exactly one `item_added`, zero or more
/// `item_updated`, and one final `item_done` whose snapshot equals the
/// cumulative fold of the updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadStreamEvent {
    /// A new item was announced; carries the full initial snapshot.
    ItemAdded { item: ThreadItem },

    /// A partial mutation to a previously added item.
    ItemUpdated {
        item_id: String,
        update: ThreadItemUpdate,
    },

    /// An item reached its final state; carries the full final snapshot.
    ItemDone { item: ThreadItem },

    /// Out-of-band notice. Not tied to an item.
    Notice {
        level: NoticeLevel,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        message: String,
    },

    /// Out-of-band progress hint. Not tied to an item.
    ProgressUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// Terminal failure. No further events follow.
    Error { message: String, allow_retry: bool },
}

impl ThreadStreamEvent {
    /// Create an item-added event.
    pub fn item_added(item: ThreadItem) -> Self {
        Self::ItemAdded { item }
    }

    /// Create an item-updated event.
    pub fn item_updated(item_id: impl Into<String>, update: ThreadItemUpdate) -> Self {
        Self::ItemUpdated {
            item_id: item_id.into(),
            update,
        }
    }

    /// Create an item-done event.
    pub fn item_done(item: ThreadItem) -> Self {
        Self::ItemDone { item }
    }

    /// Create a notice event.
    pub fn notice(
        level: NoticeLevel,
        title: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Notice {
            level,
            title,
            message: message.into(),
        }
    }

    /// Create a progress-update event.
    pub fn progress(text: impl Into<String>) -> Self {
        Self::ProgressUpdate {
            icon: None,
            text: Some(text.into()),
        }
    }

    /// Create a terminal error event.
    pub fn error(message: impl Into<String>, allow_retry: bool) -> Self {
        Self::Error {
            message: message.into(),
            allow_retry,
        }
    }

    /// The id of the item this event references, if any.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::ItemAdded { item } | Self::ItemDone { item } => Some(item.id()),
            Self::ItemUpdated { item_id, .. } => Some(item_id),
            Self::Notice { .. } | Self::ProgressUpdate { .. } | Self::Error { .. } => None,
        }
    }
}
