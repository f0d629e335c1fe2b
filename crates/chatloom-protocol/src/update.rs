use crate::item::{AssistantContent, ThreadItem, WorkflowTask};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A partial mutation to apply to the item identified by an
/// `item_updated` event's `item_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadItemUpdate {
    /// A new (empty) content part was announced at `content_index`.
    ContentPartAdded {
        content_index: usize,
        content: AssistantContent,
    },
    /// Incremental text appended to the part at `content_index`.
    ContentPartTextDelta { content_index: usize, delta: String },
    /// The part at `content_index` is final; `content` is its full value.
    ContentPartDone {
        content_index: usize,
        content: AssistantContent,
    },
    /// A new task appended at `task_index`.
    WorkflowTaskAdded {
        task_index: usize,
        task: WorkflowTask,
    },
    /// The task at `task_index` replaced in place.
    WorkflowTaskUpdated {
        task_index: usize,
        task: WorkflowTask,
    },
}

/// Failure to fold an update into an item snapshot.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("update does not apply to a {0} item")]
    KindMismatch(&'static str),

    #[error("update index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl ThreadItemUpdate {
    /// Fold this update into an item snapshot.
    ///
    /// This is the single source of truth for the protocol invariant:
    /// applying every `item_updated` payload, in emission order, to the
    /// `item_added` snapshot must reproduce the `item_done` snapshot.
    pub fn apply_to(&self, item: &mut ThreadItem) -> Result<(), UpdateError> {
        match self {
            ThreadItemUpdate::ContentPartAdded {
                content_index,
                content,
            } => {
                let parts = assistant_content(item)?;
                if *content_index != parts.len() {
                    return Err(UpdateError::IndexOutOfRange {
                        index: *content_index,
                        len: parts.len(),
                    });
                }
                parts.push(content.clone());
                Ok(())
            }
            ThreadItemUpdate::ContentPartTextDelta {
                content_index,
                delta,
            } => {
                let parts = assistant_content(item)?;
                let len = parts.len();
                let part = parts
                    .get_mut(*content_index)
                    .ok_or(UpdateError::IndexOutOfRange {
                        index: *content_index,
                        len,
                    })?;
                part.text.push_str(delta);
                Ok(())
            }
            ThreadItemUpdate::ContentPartDone {
                content_index,
                content,
            } => {
                let parts = assistant_content(item)?;
                let len = parts.len();
                let part = parts
                    .get_mut(*content_index)
                    .ok_or(UpdateError::IndexOutOfRange {
                        index: *content_index,
                        len,
                    })?;
                *part = content.clone();
                Ok(())
            }
            ThreadItemUpdate::WorkflowTaskAdded { task_index, task } => {
                let tasks = workflow_tasks(item)?;
                if *task_index != tasks.len() {
                    return Err(UpdateError::IndexOutOfRange {
                        index: *task_index,
                        len: tasks.len(),
                    });
                }
                tasks.push(task.clone());
                Ok(())
            }
            ThreadItemUpdate::WorkflowTaskUpdated { task_index, task } => {
                let tasks = workflow_tasks(item)?;
                let len = tasks.len();
                let slot = tasks
                    .get_mut(*task_index)
                    .ok_or(UpdateError::IndexOutOfRange {
                        index: *task_index,
                        len,
                    })?;
                *slot = task.clone();
                Ok(())
            }
        }
    }
}

fn assistant_content(item: &mut ThreadItem) -> Result<&mut Vec<AssistantContent>, UpdateError> {
    match item {
        ThreadItem::AssistantMessage(msg) => Ok(&mut msg.content),
        ThreadItem::UserMessage(_) => Err(UpdateError::KindMismatch("user_message")),
        ThreadItem::Widget(_) => Err(UpdateError::KindMismatch("widget")),
        ThreadItem::ClientToolCall(_) => Err(UpdateError::KindMismatch("client_tool_call")),
        ThreadItem::Workflow(_) => Err(UpdateError::KindMismatch("workflow")),
        ThreadItem::EndOfTurn(_) => Err(UpdateError::KindMismatch("end_of_turn")),
    }
}

fn workflow_tasks(item: &mut ThreadItem) -> Result<&mut Vec<WorkflowTask>, UpdateError> {
    match item {
        ThreadItem::Workflow(wf) => Ok(&mut wf.workflow.tasks),
        ThreadItem::UserMessage(_) => Err(UpdateError::KindMismatch("user_message")),
        ThreadItem::AssistantMessage(_) => Err(UpdateError::KindMismatch("assistant_message")),
        ThreadItem::Widget(_) => Err(UpdateError::KindMismatch("widget")),
        ThreadItem::ClientToolCall(_) => Err(UpdateError::KindMismatch("client_tool_call")),
        ThreadItem::EndOfTurn(_) => Err(UpdateError::KindMismatch("end_of_turn")),
    }
}
