//! Wire protocol types for the chatloom backend.
//!
//! Thread items, stream events, and incremental item updates are closed
//! tagged unions, so every consumer (the serializer, the folding logic,
//! the dispatch layer) matches exhaustively and a new variant cannot be
//! silently mishandled.

mod event;
mod item;
mod request;
mod update;

pub use event::{NoticeLevel, ThreadStreamEvent};
pub use item::{
    gen_id, now_millis, Annotation, AssistantContent, AssistantMessageItem, Attachment,
    ClientToolCallItem, CustomTask, EndOfTurnItem, SearchTask, Source, StatusIndicator, Thought,
    Thread, ThreadItem, ToolCallStatus, UserContent, UserMessageItem, WidgetItem, Workflow,
    WorkflowItem, WorkflowTask,
};
pub use request::{ClientAction, ClientRequest, FeedbackKind, RequestError, UserMessageInput};
pub use update::{ThreadItemUpdate, UpdateError};
