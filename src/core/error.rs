//! Agent 错误类型
//!
//! 任何致命错误都会中止本回合：棋盘不变、对局记忆不变，由调用方（控制台 / Web）给出明确失败。

use thiserror::Error;

use crate::llm::LlmError;

/// 走法定稿失败：三类错误都携带原始走法文本
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Invalid move notation: '{0}'")]
    InvalidNotation(String),

    #[error("Illegal move: '{0}'")]
    IllegalMove(String),

    #[error("Ambiguous move: '{0}'")]
    AmbiguousMove(String),
}

impl NotationError {
    /// 出错的原始走法文本
    pub fn offending_text(&self) -> &str {
        match self {
            NotationError::InvalidNotation(t)
            | NotationError::IllegalMove(t)
            | NotationError::AmbiguousMove(t) => t,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotationError::InvalidNotation(_) => "invalid_notation",
            NotationError::IllegalMove(_) => "illegal_move",
            NotationError::AmbiguousMove(_) => "ambiguous_move",
        }
    }
}

/// Agent 回合中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 决策能力返回了枚举之外的动作（能力契约被破坏，不重试）
    #[error("Capability contract violation: {0}")]
    CapabilityContractViolation(String),

    #[error("Unable to produce a move this turn: iteration cap exceeded after {iterations} iterations")]
    TurnBudgetExceeded { iterations: usize },

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// LLM 回复无法解析为要求的结构（无 JSON、缺字段）
    #[error("Malformed structured output: {0}")]
    MalformedOutput(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Game is already over")]
    GameOver,

    #[error("It is not the agent's turn")]
    NotAgentTurn,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Config error: {0}")]
    Config(String),
}
