//! 审议数据模型：候选走法、决策、回合上下文、回合结果

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shakmaty::Move;

use crate::chess::{color_name, render_position, GameState};
use crate::core::AgentError;
use crate::memory::MoveRecord;

/// 候选走法：由候选走法能力产出，加入分析记忆后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateMove {
    /// The move to make in standard algebraic notation. Example of a correct response: 'e5'.
    /// Examples of incorrect responses: '2. e5' or 'e5 is the best move to play in this position.'
    #[serde(rename = "move")]
    pub move_text: String,
    /// A thorough analysis of the position and of the move. Speak like you are talking out loud
    /// to yourself in a casual manner.
    pub reasoning: String,
}

impl CandidateMove {
    pub fn new(move_text: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            move_text: move_text.into(),
            reasoning: reasoning.into(),
        }
    }

    pub fn to_record(&self) -> MoveRecord {
        MoveRecord::new(self.move_text.trim(), self.reasoning.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    ConsiderNew,
    Commit,
}

impl DecisionAction {
    /// 大小写不敏感，容忍 '-' 与空格；其它取值视为能力契约被破坏
    pub fn parse(raw: &str) -> Result<Self, AgentError> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "consider_new" => Ok(DecisionAction::ConsiderNew),
            "commit" => Ok(DecisionAction::Commit),
            _ => Err(AgentError::CapabilityContractViolation(format!(
                "unknown decision action '{}'",
                raw
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAction::ConsiderNew => "consider_new",
            DecisionAction::Commit => "commit",
        }
    }
}

/// 决策能力的原始回复结构（action 以字符串接收，再由 DecisionAction::parse 校验）
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DecisionReply {
    /// Either "consider_new" to analyse another candidate move, or "commit" to decide on a move now.
    pub action: String,
    /// Why you chose this action.
    pub reasoning: String,
}

/// 每轮的决策：即用即弃，不写入记忆
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: DecisionAction,
    pub reasoning: String,
}

impl Decision {
    pub fn commit(reasoning: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Commit,
            reasoning: reasoning.into(),
        }
    }

    pub fn consider_new(reasoning: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::ConsiderNew,
            reasoning: reasoning.into(),
        }
    }
}

impl TryFrom<DecisionReply> for Decision {
    type Error = AgentError;

    fn try_from(reply: DecisionReply) -> Result<Self, Self::Error> {
        Ok(Self {
            action: DecisionAction::parse(&reply.action)?,
            reasoning: reply.reasoning,
        })
    }
}

/// 回合上下文：本回合内不变的局面快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnContext {
    pub position: String,
    pub side_to_move: String,
}

impl TurnContext {
    pub fn from_game(game: &GameState) -> Self {
        let side = color_name(game.turn());
        let mut side_to_move = side.to_string();
        if let Some(first) = side_to_move.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self {
            position: render_position(game),
            side_to_move,
        }
    }
}

/// 一个回合的结果：定稿走法、理由与审议计数
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub mv: Move,
    /// 模型给出的原始记谱（已去除首尾空白）
    pub move_text: String,
    /// 定稿候选的理由（写入对局记忆）
    pub reasoning: String,
    /// 促成定稿的决策理由
    pub decision_reasoning: String,
    pub iterations: usize,
    pub proposals: usize,
}
