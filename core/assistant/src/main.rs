use anyhow::Result;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use clap::Parser;
use fraudgraph_assistant::{run_turn, Session};
use fraudgraph_assistant::prompts::QUICK_QUERIES;
use fraudgraph_llm::{LanguageModel, LlmConfig, UsageMeter};
use fraudgraph_schemas::SessionId;
use fraudgraph_store::{GraphStore, HttpGraphStore, StoreConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fraudgraph-assistant")]
#[command(about = "Investigation assistant service for the insurance fraud knowledge graph")]
struct Args {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port
    #[arg(long, default_value_t = 8090)]
    port: u16,
}

/// One chat session: its conversational state plus its own provider client,
/// so usage counters stay session-scoped.
struct SessionSlot {
    session: Session,
    model: Arc<dyn LanguageModel>,
}

/// Each slot carries its own lock. The map mutex is only ever held for
/// lookup and insert; a running turn locks just its own session, so one
/// slow pipeline never blocks other sessions.
type SessionMap = HashMap<String, Arc<Mutex<SessionSlot>>>;

#[derive(Clone)]
struct AppState {
    store: Arc<HttpGraphStore>,
    llm_config: LlmConfig,
    sessions: Arc<Mutex<SessionMap>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Fraudgraph Assistant Service v0.1.0");

    let store_config = StoreConfig::from_env()?;
    let store = Arc::new(HttpGraphStore::new(store_config)?);
    info!("Graph store client ready");

    let llm_config = LlmConfig::from_env()?;
    info!("LLM provider: {}", llm_config.provider_name());

    let state = AppState {
        store,
        llm_config,
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/quick-queries", get(quick_queries))
        .route("/sessions/:id/ask", post(ask))
        .route("/sessions/:id/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", args.host, args.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "assistant",
        "status": "healthy",
        "version": "0.1.0"
    }))
}

async fn quick_queries() -> impl IntoResponse {
    Json(serde_json::json!({ "quick_queries": QUICK_QUERIES }))
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

async fn ask(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "question cannot be empty".into()));
    }

    let slot = {
        let mut sessions = state.sessions.lock().await;
        get_or_create(&mut sessions, &session_id, &state.llm_config)?
    };

    // Only this session is locked while the pipeline runs.
    let mut slot = slot.lock().await;
    let model = slot.model.clone();
    let store: &dyn GraphStore = state.store.as_ref();
    let outcome = run_turn(store, model.as_ref(), &mut slot.session, &question).await;

    Ok(Json(outcome))
}

async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let slot = {
        let sessions = state.sessions.lock().await;
        sessions.get(&session_id).cloned()
    };

    if let Some(slot) = slot {
        slot.lock().await.session.reset();
        info!("Session {} reset", session_id);
    }
    Ok(Json(serde_json::json!({ "session": session_id, "reset": true })))
}

fn get_or_create(
    sessions: &mut SessionMap,
    session_id: &str,
    llm_config: &LlmConfig,
) -> Result<Arc<Mutex<SessionSlot>>, (StatusCode, String)> {
    if let Some(slot) = sessions.get(session_id) {
        return Ok(slot.clone());
    }

    let meter = UsageMeter::new();
    let model = llm_config
        .clone()
        .build(meter.clone())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let session = Session::new(
        SessionId(session_id.to_string()),
        llm_config.provider_name(),
        meter,
    );
    let slot = Arc::new(Mutex::new(SessionSlot { session, model }));
    sessions.insert(session_id.to_string(), slot.clone());
    info!("Session {} created", session_id);
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudgraph_llm::LlmProvider;

    fn test_config() -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Groq,
            api_key: "gsk_test".to_string(),
            base_url: "http://localhost:9".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_version: String::new(),
            timeout_secs: 5,
        }
    }

    /// One session holding its lock (as a running turn does) must not block
    /// the map or any other session.
    #[tokio::test]
    async fn test_busy_session_does_not_block_others() {
        let config = test_config();
        let sessions: Arc<Mutex<SessionMap>> = Arc::new(Mutex::new(HashMap::new()));

        let (slot_a, slot_b) = {
            let mut map = sessions.lock().await;
            let a = get_or_create(&mut map, "session-a", &config).unwrap();
            let b = get_or_create(&mut map, "session-b", &config).unwrap();
            (a, b)
        };

        // Session A is mid-turn.
        let _turn_a = slot_a.lock().await;

        // The map stays available for lookups and new sessions...
        let slot_c = {
            let mut map = sessions.lock().await;
            assert_eq!(map.len(), 2);
            get_or_create(&mut map, "session-c", &config).unwrap()
        };

        // ...and other sessions can start their own turns immediately.
        assert!(slot_b.try_lock().is_ok());
        assert!(slot_c.try_lock().is_ok());
        // A itself stays exclusively held.
        assert!(slot_a.try_lock().is_err());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing_slot() {
        let config = test_config();
        let mut map: SessionMap = HashMap::new();

        let first = get_or_create(&mut map, "session-a", &config).unwrap();
        let second = get_or_create(&mut map, "session-a", &config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(map.len(), 1);
    }
}
