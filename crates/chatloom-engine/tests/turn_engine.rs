use chatloom_engine::{StreamOptions, TurnEngine};
use chatloom_protocol::{
    ClientAction, StatusIndicator, Thread, ThreadItem, ThreadStreamEvent, ToolCallStatus,
    UserContent, UserMessageItem,
};
use chatloom_store::{MemoryStore, PageQuery, RequestContext, Store};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn instant_options() -> StreamOptions {
    StreamOptions {
        chunk_size: 12,
        chunk_delay: Duration::ZERO,
        slow_chunk_delay: Duration::ZERO,
        task_delay: Duration::ZERO,
    }
}

fn make_engine() -> (Arc<MemoryStore>, TurnEngine, RequestContext) {
    let store = Arc::new(MemoryStore::new());
    let engine = TurnEngine::new(store.clone(), instant_options());
    (store, engine, RequestContext::default())
}

async fn seed_thread(
    store: &MemoryStore,
    context: &RequestContext,
    text: &str,
) -> (Thread, UserMessageItem) {
    let thread = Thread::new();
    store.save_thread(&thread, context).await.unwrap();
    let user = UserMessageItem {
        id: "user_1".to_string(),
        thread_id: thread.id.clone(),
        created_at: 0,
        content: vec![UserContent::InputText {
            text: text.to_string(),
        }],
    };
    store
        .add_thread_item(&thread.id, &ThreadItem::UserMessage(user.clone()), context)
        .await
        .unwrap();
    (thread, user)
}

/// Fold item events the way a client would: `item_added` seeds a
/// snapshot, `item_updated` mutates it in place.
fn fold_item_events(events: &[ThreadStreamEvent]) -> HashMap<String, ThreadItem> {
    let mut folded: HashMap<String, ThreadItem> = HashMap::new();
    for event in events {
        match event {
            ThreadStreamEvent::ItemAdded { item } => {
                folded.insert(item.id().to_string(), item.clone());
            }
            ThreadStreamEvent::ItemUpdated { item_id, update } => {
                let item = folded.get_mut(item_id).expect("update before added");
                update.apply_to(item).unwrap();
            }
            _ => {}
        }
    }
    folded
}

fn concat_deltas(events: &[ThreadStreamEvent], target_id: &str) -> String {
    let mut text = String::new();
    for event in events {
        if let ThreadStreamEvent::ItemUpdated { item_id, update } = event {
            if item_id == target_id {
                if let chatloom_protocol::ThreadItemUpdate::ContentPartTextDelta {
                    delta, ..
                } = update
                {
                    text.push_str(delta);
                }
            }
        }
    }
    text
}

fn done_items(events: &[ThreadStreamEvent]) -> Vec<&ThreadItem> {
    events
        .iter()
        .filter_map(|event| match event {
            ThreadStreamEvent::ItemDone { item } => Some(item),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn default_turn_streams_folds_and_persists() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "hello").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    // First event announces an empty assistant message.
    let ThreadStreamEvent::ItemAdded { item } = &events[0] else {
        panic!("expected item_added first, got {:?}", events[0]);
    };
    let ThreadItem::AssistantMessage(first) = item else {
        panic!("expected assistant message");
    };
    assert!(first.content.is_empty());
    let message_id = first.id.clone();

    // Deltas concatenate to the final text, which echoes the input.
    let done = done_items(&events);
    assert_eq!(done.len(), 2);
    let ThreadItem::AssistantMessage(final_msg) = done[0] else {
        panic!("expected assistant message done");
    };
    let full_text = &final_msg.content[0].text;
    assert!(full_text.starts_with("You said: *hello*"));
    assert_eq!(&concat_deltas(&events, &message_id), full_text);

    // Folding added + updates equals the done snapshot.
    let folded = fold_item_events(&events);
    assert_eq!(folded.get(&message_id).unwrap(), done[0]);

    // The turn ends with an end-of-turn marker.
    assert!(matches!(done[1], ThreadItem::EndOfTurn(_)));
    let ThreadStreamEvent::ItemDone { item: last } = events.last().unwrap() else {
        panic!("expected item_done last");
    };
    assert!(matches!(last, ThreadItem::EndOfTurn(_)));

    // The store reflects the completed turn: user message, assistant
    // message, end-of-turn, in insertion order.
    let page = store
        .load_thread_items(&thread.id, &PageQuery::default(), &context)
        .await
        .unwrap();
    assert_eq!(page.data.len(), 3);
    assert_eq!(page.data[1].id(), message_id);
    assert_eq!(&page.data[1], done[0]);
}

#[tokio::test]
async fn delta_concatenation_survives_chunk_size_and_multibyte_text() {
    for chunk_size in [1, 5, 64] {
        let store = Arc::new(MemoryStore::new());
        let engine = TurnEngine::new(
            store.clone(),
            StreamOptions {
                chunk_size,
                ..instant_options()
            },
        );
        let context = RequestContext::default();
        let (thread, user) = seed_thread(&store, &context, "héllo wörld ✨").await;

        let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

        let done = done_items(&events);
        let ThreadItem::AssistantMessage(final_msg) = done[0] else {
            panic!("expected assistant message");
        };
        let full_text = &final_msg.content[0].text;
        let message_id = final_msg.id.clone();
        assert_eq!(&concat_deltas(&events, &message_id), full_text);
    }
}

#[tokio::test]
async fn workflow_turn_stages_three_tasks_and_narrates() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "workflow").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    // An out-of-band progress hint precedes the workflow item.
    assert!(matches!(
        events[0],
        ThreadStreamEvent::ProgressUpdate { .. }
    ));

    // The workflow starts with a single loading task.
    let ThreadStreamEvent::ItemAdded { item } = &events[1] else {
        panic!("expected workflow item_added");
    };
    let ThreadItem::Workflow(initial) = item else {
        panic!("expected workflow item");
    };
    assert_eq!(initial.workflow.tasks.len(), 1);
    assert_eq!(
        initial.workflow.tasks[0].status_indicator(),
        StatusIndicator::Loading
    );
    let workflow_id = initial.id.clone();

    // Final snapshot: three tasks, all complete, identical to the fold
    // of the incremental updates.
    let done = done_items(&events);
    let ThreadItem::Workflow(final_wf) = done[0] else {
        panic!("expected workflow done first");
    };
    assert_eq!(final_wf.workflow.tasks.len(), 3);
    assert!(final_wf
        .workflow
        .tasks
        .iter()
        .all(|task| task.status_indicator() == StatusIndicator::Complete));

    let folded = fold_item_events(&events);
    assert_eq!(folded.get(&workflow_id).unwrap(), done[0]);

    // The narration follows as a second item in the same turn, then the
    // end-of-turn marker.
    assert_eq!(done.len(), 3);
    let ThreadItem::AssistantMessage(narration) = done[1] else {
        panic!("expected narration message");
    };
    assert!(narration.content[0].text.contains("3 tasks"));
    assert!(matches!(done[2], ThreadItem::EndOfTurn(_)));

    // The store holds the final workflow snapshot.
    let stored = store
        .load_item(&thread.id, &workflow_id, &context)
        .await
        .unwrap();
    assert_eq!(&stored, done[0]);
}

#[tokio::test]
async fn error_scenario_emits_single_terminal_error() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "error").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    assert_eq!(events.len(), 1);
    let ThreadStreamEvent::Error {
        message,
        allow_retry,
    } = &events[0]
    else {
        panic!("expected terminal error, got {:?}", events[0]);
    };
    assert!(*allow_retry);
    assert!(message.contains("intentional failure"));

    // No assistant items were announced or persisted.
    let page = store
        .load_thread_items(&thread.id, &PageQuery::default(), &context)
        .await
        .unwrap();
    assert_eq!(page.data.len(), 1); // just the seeded user message
}

#[tokio::test]
async fn widget_turn_is_a_single_done_event() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "widget").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    assert_eq!(events.len(), 1);
    let ThreadStreamEvent::ItemDone { item } = &events[0] else {
        panic!("expected single item_done");
    };
    let ThreadItem::Widget(widget) = item else {
        panic!("expected widget item");
    };
    assert_eq!(widget.copy_text.as_deref(), Some("Test widget form"));
    assert_eq!(widget.widget["type"], "card");

    let stored = store.load_item(&thread.id, &widget.id, &context).await.unwrap();
    assert_eq!(&stored, item);
}

#[tokio::test]
async fn tool_turn_emits_pending_client_tool_call() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "tool").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    assert_eq!(events.len(), 1);
    let ThreadStreamEvent::ItemDone { item } = &events[0] else {
        panic!("expected single item_done");
    };
    let ThreadItem::ClientToolCall(call) = item else {
        panic!("expected client tool call");
    };
    assert_eq!(call.status, ToolCallStatus::Pending);
    assert_eq!(call.name, "get_weather");
    assert_eq!(call.call_id, format!("call_{}", call.id));
    assert_eq!(call.arguments["city"], "San Francisco");
}

#[tokio::test]
async fn annotations_turn_carries_sources() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "annotations").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    assert_eq!(events.len(), 1);
    let ThreadStreamEvent::ItemDone { item } = &events[0] else {
        panic!("expected single item_done");
    };
    let ThreadItem::AssistantMessage(msg) = item else {
        panic!("expected assistant message");
    };
    let annotations = &msg.content[0].annotations;
    assert_eq!(annotations.len(), 2);
    assert!(matches!(
        annotations[0].source,
        chatloom_protocol::Source::Url { .. }
    ));
    assert!(matches!(
        annotations[1].source,
        chatloom_protocol::Source::File { .. }
    ));
}

#[tokio::test]
async fn notice_turn_interleaves_out_of_band_events() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "notice").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    let ThreadStreamEvent::Notice { level, .. } = &events[0] else {
        panic!("expected info notice first");
    };
    assert_eq!(*level, chatloom_protocol::NoticeLevel::Info);
    let ThreadStreamEvent::Notice { level, .. } = &events[1] else {
        panic!("expected warning notice second");
    };
    assert_eq!(*level, chatloom_protocol::NoticeLevel::Warning);

    // A normal text turn follows the notices.
    assert!(matches!(events[2], ThreadStreamEvent::ItemAdded { .. }));
    let done = done_items(&events);
    assert_eq!(done.len(), 2);
}

#[tokio::test]
async fn dropped_consumer_leaves_store_at_streamed_prefix() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "hello").await;

    let mut stream = engine.run_turn(&thread, Some(&user), &context);
    let mut prefix = Vec::new();
    for _ in 0..5 {
        prefix.push(stream.next().await.unwrap());
    }
    drop(stream);

    // The store holds exactly the fold of the consumed prefix: no
    // completion happened behind the consumer's back.
    let folded = fold_item_events(&prefix);
    let (message_id, expected) = folded.iter().next().unwrap();
    let stored = store.load_item(&thread.id, message_id, &context).await.unwrap();
    assert_eq!(&stored, expected);

    // No end-of-turn marker was persisted.
    let page = store
        .load_thread_items(&thread.id, &PageQuery::default(), &context)
        .await
        .unwrap();
    assert!(page
        .data
        .iter()
        .all(|item| !matches!(item, ThreadItem::EndOfTurn(_))));
}

#[tokio::test]
async fn action_turn_streams_acknowledgment() {
    let (store, engine, context) = make_engine();
    let (thread, _) = seed_thread(&store, &context, "").await;

    let action = ClientAction {
        action_type: "form.submit".to_string(),
        payload: serde_json::json!({ "user_name": "ada" }),
    };
    let events: Vec<_> = engine
        .run_action(&thread, &action, None, &context)
        .collect()
        .await;

    let done = done_items(&events);
    assert_eq!(done.len(), 2);
    let ThreadItem::AssistantMessage(msg) = done[0] else {
        panic!("expected assistant message");
    };
    assert!(msg.content[0].text.contains("form.submit"));
    assert!(matches!(done[1], ThreadItem::EndOfTurn(_)));
}

#[tokio::test]
async fn slow_turn_uses_override_text() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "slow").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    let done = done_items(&events);
    let ThreadItem::AssistantMessage(msg) = done[0] else {
        panic!("expected assistant message");
    };
    assert!(msg.content[0].text.contains("artificial delays"));
}

#[tokio::test]
async fn long_turn_streams_seventeen_paragraphs() {
    let (store, engine, context) = make_engine();
    let (thread, user) = seed_thread(&store, &context, "long").await;

    let events: Vec<_> = engine.run_turn(&thread, Some(&user), &context).collect().await;

    let done = done_items(&events);
    let ThreadItem::AssistantMessage(msg) = done[0] else {
        panic!("expected assistant message");
    };
    assert_eq!(msg.content[0].text.split("\n\n").count(), 17);
}
