//! Web API（axum）
//!
//! 每个对局是独立会话（session id = UUID），路由层只负责解析请求、加锁会话并把错误映射为 HTTP 状态。
//! - POST /api/games                  新建对局
//! - GET  /api/games/:id              局面状态
//! - POST /api/games/:id/move         人类走子；轮到 Agent 时紧接着跑一个 Agent 回合
//! - POST /api/games/:id/agent-move   直接请求 Agent 走子（如 Agent 执白开局）
//! - POST /api/games/:id/reset        重置对局
//! - GET  /api/games/:id/memory       对局记忆
//! - DELETE /api/games/:id            结束并删除对局

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::agent::{request_agent_move, AgentComponents, AgentMove};
use crate::config::WebSection;
use crate::core::{AgentError, GameView, SessionRegistry};
use crate::memory::MoveRecord;

pub struct WebState {
    pub components: Arc<AgentComponents>,
    pub sessions: SessionRegistry,
    pub static_dir: Option<PathBuf>,
}

impl WebState {
    pub fn new(components: AgentComponents, web: &WebSection) -> Self {
        let sessions = SessionRegistry::with_capacity(components.agent_color, web.max_sessions);
        Self {
            components: Arc::new(components),
            sessions,
            static_dir: web.static_dir.clone(),
        }
    }
}

/// 按 session_ttl_secs 定期淘汰过期会话；ttl 为 0 时不启动
pub fn spawn_session_reaper(
    state: Arc<WebState>,
    ttl_secs: u64,
) -> Option<tokio::task::JoinHandle<()>> {
    if ttl_secs == 0 {
        return None;
    }
    // chrono::Duration::seconds 的上限远大于十年，先截断
    let max_age = chrono::Duration::seconds(ttl_secs.min(315_360_000) as i64);
    let period = std::time::Duration::from_secs(ttl_secs.clamp(1, 300));
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            state.sessions.evict_older_than(max_age).await;
        }
    }))
}

pub fn router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/games", post(api_games_create))
        .route("/api/games/:id", get(api_game_get).delete(api_game_delete))
        .route("/api/games/:id/move", post(api_game_move))
        .route("/api/games/:id/agent-move", post(api_game_agent_move))
        .route("/api/games/:id/reset", post(api_game_reset))
        .route("/api/games/:id/memory", get(api_game_memory))
        .with_state(state)
}

/// AgentError -> HTTP：会话不存在 404，轮次 / 终局 409，人类非法走子 400，Agent 记谱错误 422，其余 500
pub struct ApiError {
    status: StatusCode,
    error: AgentError,
}

impl ApiError {
    fn human(error: AgentError) -> Self {
        let status = match &error {
            AgentError::Notation(_) => StatusCode::BAD_REQUEST,
            _ => status_for(&error),
        };
        Self { status, error }
    }
}

fn status_for(error: &AgentError) -> StatusCode {
    match error {
        AgentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AgentError::GameOver | AgentError::NotAgentTurn => StatusCode::CONFLICT,
        AgentError::Notation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AgentError> for ApiError {
    fn from(error: AgentError) -> Self {
        Self {
            status: status_for(&error),
            error,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notation_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offending_text: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("request failed: {}", self.error);
        }
        let (notation_kind, offending_text) = match &self.error {
            AgentError::Notation(n) => (Some(n.kind()), Some(n.offending_text().to_string())),
            _ => (None, None),
        };
        let body = ErrorBody {
            error: self.error.to_string(),
            notation_kind,
            offending_text,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    #[serde(flatten)]
    pub game: GameView,
    pub agent_move: Option<AgentMove>,
}

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub session_id: String,
    pub game_moves: Vec<MoveRecord>,
    pub recent_window: Vec<MoveRecord>,
}

const INDEX_HTML: &str = include_str!("../../static/index.html");

async fn index(State(state): State<Arc<WebState>>) -> Html<String> {
    let page = state
        .static_dir
        .as_ref()
        .and_then(|dir| std::fs::read_to_string(dir.join("index.html")).ok())
        .unwrap_or_else(|| INDEX_HTML.to_string());
    Html(page)
}

async fn api_games_create(State(state): State<Arc<WebState>>) -> Json<GameView> {
    let (_, session) = state.sessions.create().await;
    let view = session.lock().await.view();
    Json(view)
}

async fn api_game_get(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

async fn api_game_delete(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_game_move(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;

    let promotion = req.promotion.as_deref().and_then(|p| p.chars().next());
    session
        .apply_human_move(&req.from, &req.to, promotion)
        .map_err(ApiError::human)?;

    let agent_move = if session.is_agent_turn() && !session.game.is_game_over() {
        Some(request_agent_move(&state.components.engine, &mut session, None).await?)
    } else {
        None
    };

    Ok(Json(MoveResponse {
        game: session.view(),
        agent_move,
    }))
}

async fn api_game_agent_move(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> Result<Json<MoveResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    let agent_move = request_agent_move(&state.components.engine, &mut session, None).await?;
    Ok(Json(MoveResponse {
        game: session.view(),
        agent_move: Some(agent_move),
    }))
}

async fn api_game_reset(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let mut session = session.lock().await;
    session.reset();
    Ok(Json(session.view()))
}

async fn api_game_memory(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> Result<Json<MemoryResponse>, ApiError> {
    let session = state.sessions.get(&id).await?;
    let session = session.lock().await;
    let window = state.components.engine.limits().recent_moves_window;
    Ok(Json(MemoryResponse {
        session_id: session.id.clone(),
        game_moves: session.memory.game_moves().to_vec(),
        recent_window: session.memory.recent_game_moves(window).to_vec(),
    }))
}
