//! 对局会话：每个会话独立持有局面、记忆与最近一次 AI 理由
//!
//! SessionRegistry 按 session id 管理会话；单个会话由 Mutex 保护，保证同一时刻最多一个回合在修改它。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shakmaty::Color;
use tokio::sync::{Mutex, RwLock};

use crate::chess::{color_name, finalize, BoardStatus, GameState};
use crate::core::{AgentError, NotationError};
use crate::memory::MemoryStore;

/// 会话对外视图（局面状态 + AI 理由）
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub session_id: String,
    pub agent_color: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: BoardStatus,
    pub ai_reasoning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub agent_color: Color,
    pub game: GameState,
    pub memory: MemoryStore,
    pub last_reasoning: Option<String>,
}

impl GameSession {
    pub fn new(agent_color: Color) -> Self {
        Self::with_game(agent_color, GameState::new())
    }

    pub fn with_game(agent_color: Color, game: GameState) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            agent_color,
            game,
            memory: MemoryStore::new(),
            last_reasoning: None,
        }
    }

    /// 回到初始局面并丢弃全部记忆（id 不变）
    pub fn reset(&mut self) {
        self.game = GameState::new();
        self.memory = MemoryStore::new();
        self.last_reasoning = None;
    }

    pub fn is_agent_turn(&self) -> bool {
        self.game.turn() == self.agent_color
    }

    fn check_human_turn(&self) -> Result<(), AgentError> {
        if self.game.is_game_over() {
            return Err(AgentError::GameOver);
        }
        if self.is_agent_turn() {
            return Err(AgentError::NotAgentTurn);
        }
        Ok(())
    }

    /// 人类按起止格走子（UI 拖拽）
    pub fn apply_human_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> Result<(), AgentError> {
        self.check_human_turn()?;
        let m = self
            .game
            .find_move(from, to, promotion)
            .ok_or_else(|| NotationError::IllegalMove(format!("{}{}", from, to)))?;
        self.game.apply_move(&m)?;
        Ok(())
    }

    /// 人类以 SAN 走子（控制台）
    pub fn apply_human_san(&mut self, san: &str) -> Result<(), AgentError> {
        self.check_human_turn()?;
        let m = finalize(self.game.position(), san)?;
        self.game.apply_move(&m)?;
        Ok(())
    }

    pub fn view(&self) -> GameView {
        GameView {
            session_id: self.id.clone(),
            agent_color: color_name(self.agent_color).to_string(),
            created_at: self.created_at,
            status: self.game.status(),
            ai_reasoning: self.last_reasoning.clone(),
        }
    }
}

pub type SharedSession = Arc<Mutex<GameSession>>;

/// 注册表条目：创建时间冗余在锁外，淘汰时不必逐个锁会话
#[derive(Debug)]
struct SessionEntry {
    created_at: DateTime<Utc>,
    session: SharedSession,
}

/// 会话注册表：session id -> 会话（不跨会话共享可变状态）
///
/// 会话数达到 max_sessions 时，新建会话会先淘汰最早创建的会话；
/// evict_older_than 由 Web 服务定期调用，清理超过存活时间的会话。
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    agent_color: Color,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(agent_color: Color) -> Self {
        Self::with_capacity(agent_color, DEFAULT_MAX_SESSIONS)
    }

    /// max_sessions 最小为 1
    pub fn with_capacity(agent_color: Color, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            agent_color,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn create(&self) -> (String, SharedSession) {
        let session = GameSession::new(self.agent_color);
        let id = session.id.clone();
        let entry = SessionEntry {
            created_at: session.created_at,
            session: Arc::new(Mutex::new(session)),
        };
        let shared = entry.session.clone();

        let mut sessions = self.sessions.write().await;
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(old) => {
                    sessions.remove(&old);
                    tracing::info!(session = %old, "session cap reached, evicted oldest session");
                }
                None => break,
            }
        }
        sessions.insert(id.clone(), entry);
        tracing::info!(session = %id, "game session created");
        (id, shared)
    }

    pub async fn get(&self, id: &str) -> Result<SharedSession, AgentError> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|e| e.session.clone())
            .ok_or_else(|| AgentError::SessionNotFound(id.to_string()))
    }

    pub async fn remove(&self, id: &str) -> Result<(), AgentError> {
        match self.sessions.write().await.remove(id) {
            Some(_) => {
                tracing::info!(session = %id, "game session removed");
                Ok(())
            }
            None => Err(AgentError::SessionNotFound(id.to_string())),
        }
    }

    /// 删除创建时间早于 now - max_age 的会话，返回删除数
    pub async fn evict_older_than(&self, max_age: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, e| e.created_at >= cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "expired game sessions evicted");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_move_by_squares() {
        let mut session = GameSession::new(Color::Black);
        session.apply_human_move("e2", "e4", None).unwrap();
        assert!(session.is_agent_turn());
        assert_eq!(session.game.history().len(), 1);
    }

    #[test]
    fn test_human_cannot_move_on_agent_turn() {
        let mut session = GameSession::new(Color::White);
        let err = session.apply_human_move("e2", "e4", None).unwrap_err();
        assert!(matches!(err, AgentError::NotAgentTurn));
    }

    #[test]
    fn test_illegal_human_move_leaves_board_unchanged() {
        let mut session = GameSession::new(Color::Black);
        let before = session.game.fen();
        let err = session.apply_human_move("e2", "e5", None).unwrap_err();
        assert!(matches!(err, AgentError::Notation(NotationError::IllegalMove(ref t)) if t == "e2e5"));
        assert_eq!(session.game.fen(), before);
    }

    #[test]
    fn test_reset_clears_memory() {
        let mut session = GameSession::new(Color::Black);
        session.apply_human_san("e4").unwrap();
        session
            .memory
            .append_game_move(crate::memory::MoveRecord::new("e5", "mirror"));
        session.last_reasoning = Some("mirror".to_string());
        session.reset();
        assert_eq!(session.memory.game_len(), 0);
        assert!(session.last_reasoning.is_none());
        assert!(session.game.history().is_empty());
    }

    #[tokio::test]
    async fn test_registry_isolates_sessions() {
        let registry = SessionRegistry::new(Color::Black);
        let (a, session_a) = registry.create().await;
        let (b, _) = registry.create().await;
        assert_ne!(a, b);
        session_a.lock().await.apply_human_san("d4").unwrap();
        let session_b = registry.get(&b).await.unwrap();
        assert!(session_b.lock().await.game.history().is_empty());
        assert!(matches!(
            registry.get("missing").await,
            Err(AgentError::SessionNotFound(_))
        ));
        registry.remove(&a).await.unwrap();
        assert_eq!(registry.len().await, 1);
        assert!(matches!(
            registry.remove(&a).await,
            Err(AgentError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_registry_cap_evicts_oldest() {
        let registry = SessionRegistry::with_capacity(Color::Black, 2);
        let (first, _) = registry.create().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (second, _) = registry.create().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (third, _) = registry.create().await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(&first).await.is_err());
        assert!(registry.get(&second).await.is_ok());
        assert!(registry.get(&third).await.is_ok());
    }

    #[tokio::test]
    async fn test_evict_older_than_keeps_fresh_sessions() {
        let registry = SessionRegistry::new(Color::Black);
        registry.create().await;
        registry.create().await;
        assert_eq!(registry.evict_older_than(chrono::Duration::hours(1)).await, 0);
        assert_eq!(registry.len().await, 2);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(registry.evict_older_than(chrono::Duration::zero()).await, 2);
        assert!(registry.is_empty().await);
    }

    #[test]
    fn test_view_carries_created_at() {
        let session = GameSession::new(Color::Black);
        let json = serde_json::to_value(session.view()).unwrap();
        assert_eq!(
            json["created_at"],
            serde_json::to_value(session.created_at).unwrap()
        );
    }
}
