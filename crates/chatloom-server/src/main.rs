use chatloom_engine::{StreamOptions, TurnEngine};
use chatloom_server::http::{self, AppState};
use chatloom_store::MemoryStore;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "chatloom-server")]
struct Args {
    #[arg(long, env = "CHATLOOM_HTTP_ADDR", default_value = "127.0.0.1:8000")]
    http_addr: String,

    /// Characters per streamed text delta.
    #[arg(long, env = "CHATLOOM_CHUNK_SIZE", default_value_t = 12)]
    chunk_size: usize,

    /// Pause between streamed text deltas, in milliseconds.
    #[arg(long, env = "CHATLOOM_CHUNK_DELAY_MS", default_value_t = 30)]
    chunk_delay_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let opts = StreamOptions {
        chunk_size: args.chunk_size.max(1),
        chunk_delay: Duration::from_millis(args.chunk_delay_ms),
        ..StreamOptions::default()
    };

    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(TurnEngine::new(store.clone(), opts));

    let app = http::router(AppState {
        store,
        engine,
    });

    eprintln!("chatloom dev backend on http://{}", args.http_addr);
    eprintln!("POST /chat   — protocol endpoint (JSON or SSE)");
    eprintln!("GET  /health — liveness check");
    eprintln!();
    eprintln!("Scenario keywords (send as user message text): widget, error,");
    eprintln!("long, tool, workflow, notice, slow, annotations; anything else");
    eprintln!("echoes the message and streams a canned response.");

    let listener = tokio::net::TcpListener::bind(&args.http_addr)
        .await
        .expect("failed to bind http listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("http server crashed");
}
