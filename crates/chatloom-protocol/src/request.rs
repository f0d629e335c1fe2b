use crate::item::{gen_id, now_millis, UserContent, UserMessageItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// User feedback on one or more items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Positive,
    Negative,
}

/// A structured action raised by a client widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub payload: Value,
}

/// The user content of a turn request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMessageInput {
    pub content: Vec<UserContent>,
}

/// Malformed inbound request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("user message content cannot be empty")]
    EmptyContent,

    #[error("thread_id cannot be empty")]
    EmptyThreadId,
}

impl UserMessageInput {
    /// Reject inputs with no content parts.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.content.is_empty() {
            return Err(RequestError::EmptyContent);
        }
        Ok(())
    }

    /// The first text part, if any. Used for thread titling.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            UserContent::InputText { text } => Some(text.as_str()),
            UserContent::Attachment { .. } => None,
        })
    }

    /// Convert the wire input into a persistable user message item.
    pub fn into_item(self, thread_id: impl Into<String>) -> UserMessageItem {
        UserMessageItem {
            id: gen_id("message"),
            thread_id: thread_id.into(),
            created_at: now_millis(),
            content: self.content,
        }
    }
}

/// Decoded inbound protocol request. The `type` field discriminates
/// turn requests (answered with an event stream) from management
/// requests (answered with a single JSON object).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Start a new thread and run a turn for the given user input.
    #[serde(rename = "threads.create")]
    ThreadsCreate { input: UserMessageInput },

    /// Append a user message to an existing thread and run a turn.
    #[serde(rename = "threads.add_user_message")]
    ThreadsAddUserMessage {
        thread_id: String,
        input: UserMessageInput,
    },

    /// Run an action turn triggered by a widget.
    #[serde(rename = "threads.custom_action")]
    ThreadsCustomAction {
        thread_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
        action: ClientAction,
    },

    /// Load one thread.
    #[serde(rename = "threads.retrieve")]
    ThreadsRetrieve { thread_id: String },

    /// List threads, cursor-paginated.
    #[serde(rename = "threads.list")]
    ThreadsList {
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        order: Option<String>,
    },

    /// List a thread's items, cursor-paginated.
    #[serde(rename = "items.list")]
    ItemsList {
        thread_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        order: Option<String>,
    },

    /// Delete a thread and everything in it.
    #[serde(rename = "threads.delete")]
    ThreadsDelete { thread_id: String },

    /// Record feedback on items. Fire-and-forget.
    #[serde(rename = "threads.add_feedback")]
    ThreadsAddFeedback {
        thread_id: String,
        item_ids: Vec<String>,
        kind: FeedbackKind,
    },
}
