use crate::error::TurnError;
use crate::scenario::{
    default_text, long_text, Scenario, ERROR_TEXT, NOTICE_FOLLOWUP, SLOW_TEXT, WORKFLOW_NARRATION,
};
use async_stream::{stream, try_stream};
use chatloom_protocol::{
    gen_id, now_millis, Annotation, AssistantContent, AssistantMessageItem, ClientAction,
    ClientToolCallItem, CustomTask, EndOfTurnItem, FeedbackKind, NoticeLevel, SearchTask, Source,
    StatusIndicator, Thought, Thread, ThreadItem, ThreadItemUpdate, ThreadStreamEvent,
    ToolCallStatus, UserMessageItem, WidgetItem, Workflow, WorkflowItem, WorkflowTask,
};
use chatloom_store::{RequestContext, Store};
use futures::{Stream, StreamExt};
use serde_json::json;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The ordered event sequence of one turn.
pub type EventStream = Pin<Box<dyn Stream<Item = ThreadStreamEvent> + Send>>;

/// Internal production stream; the first error terminates the turn.
type StepStream = Pin<Box<dyn Stream<Item = Result<ThreadStreamEvent, TurnError>> + Send>>;

/// Streaming pacing knobs. The delays are a scheduling contract (each
/// one is a suspension point), not a performance requirement.
#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    /// Characters per text delta.
    pub chunk_size: usize,
    /// Pause between text deltas.
    pub chunk_delay: Duration,
    /// Pause between text deltas in the slow scenario.
    pub slow_chunk_delay: Duration,
    /// Base pause between workflow task stages.
    pub task_delay: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size: 12,
            chunk_delay: Duration::from_millis(30),
            slow_chunk_delay: Duration::from_millis(500),
            task_delay: Duration::from_millis(500),
        }
    }
}

/// Produces the ordered event sequence for a turn and commits item
/// snapshots into the store as it goes.
///
/// One engine instance serves all turns; each turn is an independent
/// cooperative producer. Writes to a single thread are assumed to come
/// from one turn at a time (not enforced).
pub struct TurnEngine {
    store: Arc<dyn Store>,
    opts: StreamOptions,
}

impl TurnEngine {
    /// Create an engine over a store with explicit pacing options.
    pub fn new(store: Arc<dyn Store>, opts: StreamOptions) -> Self {
        Self { store, opts }
    }

    /// Create an engine with default pacing.
    pub fn with_defaults(store: Arc<dyn Store>) -> Self {
        Self::new(store, StreamOptions::default())
    }

    /// Run a turn for an inbound user message.
    ///
    /// The caller is expected to have persisted the thread and the user
    /// item already; the engine persists everything it emits.
    pub fn run_turn(
        &self,
        thread: &Thread,
        input: Option<&UserMessageItem>,
        context: &RequestContext,
    ) -> EventStream {
        let user_text = input
            .map(|item| item.plain_text().to_lowercase())
            .unwrap_or_default();
        let scenario = Scenario::select(&user_text);
        debug!(thread_id = %thread.id, ?scenario, "starting turn");

        let steps = self.scenario_steps(scenario, thread.id.clone(), user_text, context.clone());
        terminal_guard(steps)
    }

    /// Run an action turn raised by a client widget.
    ///
    /// The action is answered with its own event sequence; the sender
    /// widget is never mutated.
    pub fn run_action(
        &self,
        thread: &Thread,
        action: &ClientAction,
        sender: Option<&WidgetItem>,
        context: &RequestContext,
    ) -> EventStream {
        info!(
            thread_id = %thread.id,
            action_type = %action.action_type,
            sender_id = sender.map(|widget| widget.id.as_str()),
            "client action",
        );
        let text = format!(
            "Received action: type=`{}`, payload=`{}`",
            action.action_type, action.payload,
        );
        terminal_guard(stream_text(
            Arc::clone(&self.store),
            context.clone(),
            thread.id.clone(),
            text,
            self.opts.chunk_size,
            self.opts.chunk_delay,
        ))
    }

    /// Record feedback. Fire-and-forget: an audit hook, nothing more.
    pub fn add_feedback(&self, thread_id: &str, item_ids: &[String], kind: FeedbackKind) {
        info!(thread_id, ?item_ids, ?kind, "feedback received");
    }

    fn scenario_steps(
        &self,
        scenario: Scenario,
        thread_id: String,
        user_text: String,
        context: RequestContext,
    ) -> StepStream {
        let store = Arc::clone(&self.store);
        let opts = self.opts;
        match scenario {
            Scenario::Default => stream_text(
                store,
                context,
                thread_id,
                default_text(&user_text),
                opts.chunk_size,
                opts.chunk_delay,
            ),
            Scenario::Error => scenario_error(),
            Scenario::Widget => scenario_widget(store, context, thread_id),
            Scenario::Tool => scenario_tool(store, context, thread_id),
            Scenario::Workflow => scenario_workflow(store, opts, context, thread_id),
            Scenario::Notice => scenario_notice(store, opts, context, thread_id),
            Scenario::Slow => stream_text(
                store,
                context,
                thread_id,
                SLOW_TEXT.to_string(),
                opts.chunk_size,
                opts.slow_chunk_delay,
            ),
            Scenario::Long => stream_text(
                store,
                context,
                thread_id,
                long_text(),
                opts.chunk_size,
                opts.chunk_delay,
            ),
            Scenario::Annotations => scenario_annotations(store, context, thread_id),
        }
    }
}

/// Map the first production error to a single terminal `error` event and
/// stop. Partially streamed items keep whatever state their last
/// persisted update left them in.
fn terminal_guard(mut steps: StepStream) -> EventStream {
    Box::pin(stream! {
        while let Some(step) = steps.next().await {
            match step {
                Ok(event) => yield event,
                Err(err) => {
                    warn!(error = %err, "turn production failed");
                    yield err.into_event();
                    return;
                }
            }
        }
    })
}

/// The text-streaming sub-protocol: announce an empty assistant message,
/// open content part 0, stream fixed-size deltas, close the part, emit
/// the final snapshot, then mint an end-of-turn marker.
///
/// Every update is folded into the local snapshot and persisted before
/// its event is yielded, so the store always reflects the streamed
/// prefix, and delta concatenation reproduces `full_text` exactly.
fn stream_text(
    store: Arc<dyn Store>,
    context: RequestContext,
    thread_id: String,
    full_text: String,
    chunk_size: usize,
    chunk_delay: Duration,
) -> StepStream {
    Box::pin(try_stream! {
        let mut item = ThreadItem::AssistantMessage(AssistantMessageItem::new(&thread_id));
        let item_id = item.id().to_string();

        store.add_thread_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_added(item.clone());

        let update = ThreadItemUpdate::ContentPartAdded {
            content_index: 0,
            content: AssistantContent::text(""),
        };
        update.apply_to(&mut item)?;
        store.save_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_updated(item_id.clone(), update);

        let chars: Vec<char> = full_text.chars().collect();
        for chunk in chars.chunks(chunk_size.max(1)) {
            let update = ThreadItemUpdate::ContentPartTextDelta {
                content_index: 0,
                delta: chunk.iter().collect(),
            };
            update.apply_to(&mut item)?;
            store.save_item(&thread_id, &item, &context).await?;
            yield ThreadStreamEvent::item_updated(item_id.clone(), update);
            tokio::time::sleep(chunk_delay).await;
        }

        let update = ThreadItemUpdate::ContentPartDone {
            content_index: 0,
            content: AssistantContent::text(full_text.clone()),
        };
        update.apply_to(&mut item)?;
        store.save_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_updated(item_id.clone(), update);

        store.save_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_done(item.clone());

        let marker = ThreadItem::EndOfTurn(EndOfTurnItem::new(&thread_id));
        store.add_thread_item(&thread_id, &marker, &context).await?;
        yield ThreadStreamEvent::item_done(marker);
    })
}

fn scenario_error() -> StepStream {
    Box::pin(stream! {
        yield Err(TurnError::Stream {
            message: ERROR_TEXT.to_string(),
            allow_retry: true,
        });
    })
}

fn scenario_widget(store: Arc<dyn Store>, context: RequestContext, thread_id: String) -> StepStream {
    Box::pin(try_stream! {
        // Opaque UI tree; the backend attaches it without interpreting it.
        let widget = json!({
            "type": "card",
            "size": "md",
            "children": [
                { "type": "title", "value": "Test Widget Form", "size": "lg" },
                {
                    "type": "text",
                    "id": "desc",
                    "value": "This is a test widget rendered by the dev backend.",
                    "streaming": false
                },
                {
                    "type": "input",
                    "name": "user_name",
                    "placeholder": "Enter your name",
                    "input_type": "text"
                },
                {
                    "type": "input",
                    "name": "email",
                    "placeholder": "Enter your email",
                    "input_type": "email"
                },
                {
                    "type": "button",
                    "label": "Submit",
                    "style": "primary",
                    "on_click_action": { "type": "form.submit", "payload": {} }
                }
            ]
        });

        let item = ThreadItem::Widget(WidgetItem {
            id: gen_id("widget"),
            thread_id: thread_id.clone(),
            created_at: now_millis(),
            widget,
            copy_text: Some("Test widget form".to_string()),
        });
        store.add_thread_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_done(item);
    })
}

fn scenario_tool(store: Arc<dyn Store>, context: RequestContext, thread_id: String) -> StepStream {
    Box::pin(try_stream! {
        let id = gen_id("tool_call");
        let item = ThreadItem::ClientToolCall(ClientToolCallItem {
            call_id: format!("call_{id}"),
            id,
            thread_id: thread_id.clone(),
            created_at: now_millis(),
            status: ToolCallStatus::Pending,
            name: "get_weather".to_string(),
            arguments: json!({ "city": "San Francisco", "units": "fahrenheit" }),
        });
        store.add_thread_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_done(item);
    })
}

fn analysis_task(status: StatusIndicator) -> WorkflowTask {
    WorkflowTask::Custom(CustomTask {
        title: "Analyzing request".to_string(),
        icon: Some("sparkle".to_string()),
        status_indicator: status,
    })
}

fn search_task(status: StatusIndicator) -> WorkflowTask {
    WorkflowTask::Search(SearchTask {
        title: "Searching the web".to_string(),
        title_query: Some("chat streaming".to_string()),
        queries: vec![
            "incremental chat streaming".to_string(),
            "thread item event protocol".to_string(),
        ],
        sources: vec![Source::Url {
            title: "Streaming Backends in Practice".to_string(),
            url: "https://example.com/docs/streaming-backends".to_string(),
            attribution: Some("chatloom".to_string()),
            description: None,
        }],
        status_indicator: status,
    })
}

fn synthesis_task(status: StatusIndicator) -> WorkflowTask {
    WorkflowTask::Thought(Thought {
        title: "Synthesizing results".to_string(),
        content: "Combining search results with user context...".to_string(),
        status_indicator: status,
    })
}

/// The staged workflow sub-protocol: one loading task at a time, each
/// flipped to complete before the next is appended, then a final
/// snapshot and a narration turn. One turn, two items.
fn scenario_workflow(
    store: Arc<dyn Store>,
    opts: StreamOptions,
    context: RequestContext,
    thread_id: String,
) -> StepStream {
    Box::pin(try_stream! {
        yield ThreadStreamEvent::progress("Working through the request");

        let created_at = now_millis();
        let item_id = gen_id("workflow");
        let mut item = ThreadItem::Workflow(WorkflowItem {
            id: item_id.clone(),
            thread_id: thread_id.clone(),
            created_at,
            workflow: Workflow {
                workflow_type: "custom".to_string(),
                tasks: vec![analysis_task(StatusIndicator::Loading)],
            },
        });
        store.add_thread_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_added(item.clone());

        tokio::time::sleep(opts.task_delay).await;

        let stage_one = [
            ThreadItemUpdate::WorkflowTaskUpdated {
                task_index: 0,
                task: analysis_task(StatusIndicator::Complete),
            },
            ThreadItemUpdate::WorkflowTaskAdded {
                task_index: 1,
                task: search_task(StatusIndicator::Loading),
            },
        ];
        for update in stage_one {
            update.apply_to(&mut item)?;
            store.save_item(&thread_id, &item, &context).await?;
            yield ThreadStreamEvent::item_updated(item_id.clone(), update);
        }

        tokio::time::sleep(opts.task_delay * 8 / 5).await;

        let stage_two = [
            ThreadItemUpdate::WorkflowTaskUpdated {
                task_index: 1,
                task: search_task(StatusIndicator::Complete),
            },
            ThreadItemUpdate::WorkflowTaskAdded {
                task_index: 2,
                task: synthesis_task(StatusIndicator::Loading),
            },
        ];
        for update in stage_two {
            update.apply_to(&mut item)?;
            store.save_item(&thread_id, &item, &context).await?;
            yield ThreadStreamEvent::item_updated(item_id.clone(), update);
        }

        tokio::time::sleep(opts.task_delay).await;

        let update = ThreadItemUpdate::WorkflowTaskUpdated {
            task_index: 2,
            task: synthesis_task(StatusIndicator::Complete),
        };
        update.apply_to(&mut item)?;
        store.save_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_updated(item_id.clone(), update);

        // Final snapshot is rebuilt literally, independent of the folded
        // copy; it must equal the cumulative effect of the updates above.
        let done = ThreadItem::Workflow(WorkflowItem {
            id: item_id,
            thread_id: thread_id.clone(),
            created_at,
            workflow: Workflow {
                workflow_type: "custom".to_string(),
                tasks: vec![
                    analysis_task(StatusIndicator::Complete),
                    search_task(StatusIndicator::Complete),
                    synthesis_task(StatusIndicator::Complete),
                ],
            },
        });
        store.save_item(&thread_id, &done, &context).await?;
        yield ThreadStreamEvent::item_done(done);

        let mut narration = stream_text(
            Arc::clone(&store),
            context.clone(),
            thread_id.clone(),
            WORKFLOW_NARRATION.to_string(),
            opts.chunk_size,
            opts.chunk_delay,
        );
        while let Some(step) = narration.next().await {
            yield step?;
        }
    })
}

fn scenario_notice(
    store: Arc<dyn Store>,
    opts: StreamOptions,
    context: RequestContext,
    thread_id: String,
) -> StepStream {
    Box::pin(try_stream! {
        yield ThreadStreamEvent::notice(
            NoticeLevel::Info,
            Some("Information".to_string()),
            "This is an **info** notice from the dev backend.",
        );
        yield ThreadStreamEvent::notice(
            NoticeLevel::Warning,
            Some("Warning".to_string()),
            "This is a **warning** notice. Something might need attention.",
        );

        let mut followup = stream_text(
            Arc::clone(&store),
            context.clone(),
            thread_id.clone(),
            NOTICE_FOLLOWUP.to_string(),
            opts.chunk_size,
            opts.chunk_delay,
        );
        while let Some(step) = followup.next().await {
            yield step?;
        }
    })
}

fn scenario_annotations(
    store: Arc<dyn Store>,
    context: RequestContext,
    thread_id: String,
) -> StepStream {
    Box::pin(try_stream! {
        let annotations = vec![
            Annotation {
                source: Source::Url {
                    title: "Streaming Backend Guide".to_string(),
                    url: "https://example.com/docs/streaming-backends".to_string(),
                    attribution: Some("chatloom".to_string()),
                    description: Some(
                        "How turns are streamed as incremental item events.".to_string(),
                    ),
                },
                index: 0,
            },
            Annotation {
                source: Source::File {
                    title: "Protocol Types Reference".to_string(),
                    filename: "protocol.md".to_string(),
                    description: Some("Canonical wire type definitions.".to_string()),
                },
                index: 1,
            },
        ];

        let text = "Here is a response with source annotations. \
                    The streaming protocol is described in the backend guide[0]. \
                    The item model is defined in the protocol reference[1].";

        let item = ThreadItem::AssistantMessage(AssistantMessageItem {
            id: gen_id("message"),
            thread_id: thread_id.clone(),
            created_at: now_millis(),
            content: vec![AssistantContent {
                text: text.to_string(),
                annotations,
            }],
        });
        store.add_thread_item(&thread_id, &item, &context).await?;
        yield ThreadStreamEvent::item_done(item);
    })
}
