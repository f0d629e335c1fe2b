use crate::http::{ApiError, AppState};
use chatloom_engine::EventStream;
use chatloom_protocol::{ClientRequest, Thread, ThreadItem, UserMessageInput};
use chatloom_store::{PageQuery, RequestContext, SortOrder, Store};
use serde_json::{json, Value};

/// What a decoded request resolves to: a turn's event sequence or a
/// single terminal JSON object.
pub enum Outcome {
    Stream(EventStream),
    Json(Value),
}

fn page_query(limit: Option<usize>, after: Option<String>, order: Option<String>) -> PageQuery {
    PageQuery {
        after,
        limit: limit.unwrap_or(50).clamp(1, 200),
        order: match order.as_deref() {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        },
    }
}

/// Thread title derived from the first text part, truncated to 80 chars.
fn derive_title(input: &UserMessageInput) -> Option<String> {
    input.first_text().map(|text| {
        let trimmed = text.trim();
        trimmed.chars().take(80).collect()
    })
}

/// Route a decoded request. Streaming variants persist the thread and
/// the inbound user item before handing the turn to the engine.
pub async fn process(
    state: &AppState,
    request: ClientRequest,
    context: &RequestContext,
) -> Result<Outcome, ApiError> {
    match request {
        ClientRequest::ThreadsCreate { input } => {
            input
                .validate()
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            let mut thread = Thread::new();
            thread.title = derive_title(&input);
            state.store.save_thread(&thread, context).await?;

            let user_item = input.into_item(&thread.id);
            state
                .store
                .add_thread_item(&thread.id, &ThreadItem::UserMessage(user_item.clone()), context)
                .await?;

            Ok(Outcome::Stream(state.engine.run_turn(
                &thread,
                Some(&user_item),
                context,
            )))
        }

        ClientRequest::ThreadsAddUserMessage { thread_id, input } => {
            input
                .validate()
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            let thread = state.store.load_thread(&thread_id, context).await?;

            let user_item = input.into_item(&thread.id);
            state
                .store
                .add_thread_item(&thread.id, &ThreadItem::UserMessage(user_item.clone()), context)
                .await?;

            Ok(Outcome::Stream(state.engine.run_turn(
                &thread,
                Some(&user_item),
                context,
            )))
        }

        ClientRequest::ThreadsCustomAction {
            thread_id,
            item_id,
            action,
        } => {
            let thread = state.store.load_thread(&thread_id, context).await?;
            let sender = match item_id {
                Some(item_id) => {
                    match state.store.load_item(&thread_id, &item_id, context).await? {
                        ThreadItem::Widget(widget) => Some(widget),
                        _ => None,
                    }
                }
                None => None,
            };
            Ok(Outcome::Stream(state.engine.run_action(
                &thread,
                &action,
                sender.as_ref(),
                context,
            )))
        }

        ClientRequest::ThreadsRetrieve { thread_id } => {
            let thread = state.store.load_thread(&thread_id, context).await?;
            Ok(Outcome::Json(to_json(&thread)?))
        }

        ClientRequest::ThreadsList {
            limit,
            after,
            order,
        } => {
            let page = state
                .store
                .load_threads(&page_query(limit, after, order), context)
                .await?;
            Ok(Outcome::Json(to_json(&page)?))
        }

        ClientRequest::ItemsList {
            thread_id,
            limit,
            after,
            order,
        } => {
            let page = state
                .store
                .load_thread_items(&thread_id, &page_query(limit, after, order), context)
                .await?;
            Ok(Outcome::Json(to_json(&page)?))
        }

        ClientRequest::ThreadsDelete { thread_id } => {
            state.store.delete_thread(&thread_id, context).await?;
            Ok(Outcome::Json(json!({ "deleted": true })))
        }

        ClientRequest::ThreadsAddFeedback {
            thread_id,
            item_ids,
            kind,
        } => {
            state.engine.add_feedback(&thread_id, &item_ids, kind);
            Ok(Outcome::Json(json!({})))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}
