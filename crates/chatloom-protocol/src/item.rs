use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generate a prefixed identifier, e.g. `message_6f9619ff8b86d011`.
pub fn gen_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Current time in milliseconds since the unix epoch.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ============================================================================
// Thread
// ============================================================================

/// A conversation thread. Owned by the store; created on first save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    /// Unique thread identifier.
    pub id: String,
    /// Creation timestamp (unix millis).
    pub created_at: u64,
    /// Optional display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Custom metadata.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}

impl Thread {
    /// Create a new thread with a generated id.
    pub fn new() -> Self {
        Self {
            id: gen_id("thread"),
            created_at: now_millis(),
            title: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Annotation Sources
// ============================================================================

/// Source referenced by an annotation. Descriptive metadata only; the
/// backend never fetches these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    Url {
        title: String,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    File {
        title: String,
        filename: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// An inline citation attached to assistant text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub source: Source,
    /// Position of the citation marker within the text.
    pub index: usize,
}

// ============================================================================
// Item payloads
// ============================================================================

/// One content part of a user message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserContent {
    InputText { text: String },
    Attachment { attachment_id: String },
}

/// One content part of an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl AssistantContent {
    /// A plain text part with no annotations.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Vec::new(),
        }
    }
}

/// Lifecycle status of a client-executed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Pending,
    Completed,
    Failed,
}

/// Progress state of a workflow task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIndicator {
    Loading,
    Complete,
}

/// A generic workflow task with an icon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub status_indicator: StatusIndicator,
}

/// A web-search workflow task with queries and result sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    pub status_indicator: StatusIndicator,
}

/// A reasoning workflow task with free-form content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thought {
    pub title: String,
    pub content: String,
    pub status_indicator: StatusIndicator,
}

/// One step of a multi-task workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowTask {
    Custom(CustomTask),
    Search(SearchTask),
    Thought(Thought),
}

impl WorkflowTask {
    /// The task's progress indicator.
    pub fn status_indicator(&self) -> StatusIndicator {
        match self {
            WorkflowTask::Custom(t) => t.status_indicator,
            WorkflowTask::Search(t) => t.status_indicator,
            WorkflowTask::Thought(t) => t.status_indicator,
        }
    }
}

/// A multi-step progress indicator composed of ordered tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    #[serde(rename = "type")]
    pub workflow_type: String,
    pub tasks: Vec<WorkflowTask>,
}

// ============================================================================
// Thread items
// ============================================================================

/// A message sent by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMessageItem {
    pub id: String,
    pub thread_id: String,
    pub created_at: u64,
    pub content: Vec<UserContent>,
}

impl UserMessageItem {
    /// Plain text of the message: all text parts joined with a space.
    pub fn plain_text(&self) -> String {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|c| match c {
                UserContent::InputText { text } => Some(text.as_str()),
                UserContent::Attachment { .. } => None,
            })
            .collect();
        parts.join(" ").trim().to_string()
    }
}

/// A message produced by the assistant, as an ordered list of content parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessageItem {
    pub id: String,
    pub thread_id: String,
    pub created_at: u64,
    pub content: Vec<AssistantContent>,
}

impl AssistantMessageItem {
    /// Create an empty assistant message for a thread.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            id: gen_id("message"),
            thread_id: thread_id.into(),
            created_at: now_millis(),
            content: Vec::new(),
        }
    }
}

/// An opaque UI tree rendered by the client, with a plain-text fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetItem {
    pub id: String,
    pub thread_id: String,
    pub created_at: u64,
    pub widget: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_text: Option<String>,
}

/// A tool invocation to be executed by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientToolCallItem {
    pub id: String,
    pub thread_id: String,
    pub created_at: u64,
    pub status: ToolCallStatus,
    pub call_id: String,
    pub name: String,
    pub arguments: Value,
}

/// A workflow item wrapping staged tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowItem {
    pub id: String,
    pub thread_id: String,
    pub created_at: u64,
    pub workflow: Workflow,
}

/// Marker item signaling the turn boundary. No payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndOfTurnItem {
    pub id: String,
    pub thread_id: String,
    pub created_at: u64,
}

impl EndOfTurnItem {
    /// Mint a new end-of-turn marker for a thread.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            id: gen_id("message"),
            thread_id: thread_id.into(),
            created_at: now_millis(),
        }
    }
}

/// A persisted unit of conversation content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadItem {
    UserMessage(UserMessageItem),
    AssistantMessage(AssistantMessageItem),
    Widget(WidgetItem),
    ClientToolCall(ClientToolCallItem),
    Workflow(WorkflowItem),
    EndOfTurn(EndOfTurnItem),
}

impl ThreadItem {
    /// The item's id, unique within its thread.
    pub fn id(&self) -> &str {
        match self {
            ThreadItem::UserMessage(i) => &i.id,
            ThreadItem::AssistantMessage(i) => &i.id,
            ThreadItem::Widget(i) => &i.id,
            ThreadItem::ClientToolCall(i) => &i.id,
            ThreadItem::Workflow(i) => &i.id,
            ThreadItem::EndOfTurn(i) => &i.id,
        }
    }

    /// The owning thread's id.
    pub fn thread_id(&self) -> &str {
        match self {
            ThreadItem::UserMessage(i) => &i.thread_id,
            ThreadItem::AssistantMessage(i) => &i.thread_id,
            ThreadItem::Widget(i) => &i.thread_id,
            ThreadItem::ClientToolCall(i) => &i.thread_id,
            ThreadItem::Workflow(i) => &i.thread_id,
            ThreadItem::EndOfTurn(i) => &i.thread_id,
        }
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// An uploaded attachment, keyed independently of threads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}
