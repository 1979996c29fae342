//! Mock LLM 客户端（无需 API）
//!
//! - MockLlmClient：离线兜底。从 prompt 中的 FEN 行还原局面，总是「立即定稿」并给出第一个合法走法，
//!   便于本地无 Key 时跑通完整回合。
//! - ScriptedLlmClient：按顺序返回预置回复并记录每次调用的消息，用于测试。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Position};

use crate::llm::{LlmClient, LlmError, Message, Role};

/// 离线 Mock：回复同时满足决策与候选走法两种结构（多余字段被忽略）
#[derive(Debug, Default)]
pub struct MockLlmClient;

impl MockLlmClient {
    fn first_legal_san(prompt: &str) -> Option<String> {
        let fen_line = prompt
            .lines()
            .find_map(|l| l.trim().strip_prefix("FEN:"))?
            .trim();
        let fen: Fen = fen_line.parse().ok()?;
        let pos: Chess = fen.into_position(CastlingMode::Standard).ok()?;
        let legal = pos.legal_moves();
        let m = legal.first()?;
        Some(San::from_move(&pos, m).to_string())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let mv = Self::first_legal_san(last_user).unwrap_or_else(|| "e5".to_string());
        Ok(serde_json::json!({
            "action": "commit",
            "move": mv,
            "reasoning": "Mock reply: playing the first legal move.",
        })
        .to_string())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// 脚本化客户端：回复队列耗尽后返回 EmptyResponse
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 追加一条回复（可为错误）
    pub fn push_reply(&self, reply: Result<String, LlmError>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply);
        }
    }

    /// 已收到的调用（每次调用的完整消息列表）
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(Err(LlmError::EmptyResponse))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_plays_first_legal_move_from_fen() {
        let prompt = "Current Board State:\nFEN: rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1\n";
        let reply = MockLlmClient.complete(&[Message::user(prompt)]).await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(v["action"], "commit");
        let mv = v["move"].as_str().unwrap();
        let pos: Chess = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
            .parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap();
        let san: San = mv.parse().unwrap();
        assert!(san.to_move(&pos).is_ok());
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order_then_empty() {
        let client = ScriptedLlmClient::new(vec!["one", "two"]);
        assert_eq!(client.complete(&[Message::user("a")]).await.unwrap(), "one");
        assert_eq!(client.complete(&[Message::user("b")]).await.unwrap(), "two");
        assert_eq!(
            client.complete(&[Message::user("c")]).await.unwrap_err(),
            LlmError::EmptyResponse
        );
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.calls()[1][0].content, "b");
    }
}
