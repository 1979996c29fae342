//! 脚本化能力（无需 LLM）：按顺序返回预置决策 / 候选，并记录调用次数与输入，用于测试审议引擎

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::deliberation::capabilities::{DecisionMaker, DeliberationInput, MoveProposer};
use crate::deliberation::types::{CandidateMove, Decision};
use crate::llm::LlmError;

/// 某次能力调用时看到的输入快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInput {
    pub game_memory: String,
    pub considered_moves: String,
    pub decision_reasoning: Option<String>,
    pub error_hint: Option<String>,
}

impl From<&DeliberationInput<'_>> for RecordedInput {
    fn from(input: &DeliberationInput<'_>) -> Self {
        Self {
            game_memory: input.game_memory.clone(),
            considered_moves: input.considered_moves.clone(),
            decision_reasoning: input.decision_reasoning.map(String::from),
            error_hint: input.error_hint.map(String::from),
        }
    }
}

/// 队列耗尽后重复 fallback；无 fallback 时返回 EmptyResponse
#[derive(Debug)]
struct Script<T: Clone> {
    queue: VecDeque<T>,
    fallback: Option<T>,
    inputs: Vec<RecordedInput>,
}

impl<T: Clone> Script<T> {
    fn new(items: Vec<T>, fallback: Option<T>) -> Self {
        Self {
            queue: items.into(),
            fallback,
            inputs: Vec::new(),
        }
    }

    fn next(&mut self, input: &DeliberationInput<'_>) -> Result<T, AgentError> {
        self.inputs.push(input.into());
        self.queue
            .pop_front()
            .or_else(|| self.fallback.clone())
            .ok_or(AgentError::Llm(LlmError::EmptyResponse))
    }
}

fn lock_err() -> AgentError {
    AgentError::Llm(LlmError::Transport("script lock poisoned".to_string()))
}

#[derive(Debug)]
pub struct ScriptedDecisions {
    script: Mutex<Script<Decision>>,
}

impl ScriptedDecisions {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            script: Mutex::new(Script::new(decisions, None)),
        }
    }

    /// 每次都返回同一决策
    pub fn always(decision: Decision) -> Self {
        Self {
            script: Mutex::new(Script::new(Vec::new(), Some(decision))),
        }
    }

    pub fn call_count(&self) -> usize {
        self.inputs().len()
    }

    pub fn inputs(&self) -> Vec<RecordedInput> {
        self.script.lock().map(|s| s.inputs.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DecisionMaker for ScriptedDecisions {
    async fn decide(&self, input: &DeliberationInput<'_>) -> Result<Decision, AgentError> {
        self.script.lock().map_err(|_| lock_err())?.next(input)
    }
}

#[derive(Debug)]
pub struct ScriptedProposals {
    consider: Mutex<Script<CandidateMove>>,
    commit: Mutex<Script<CandidateMove>>,
}

impl ScriptedProposals {
    pub fn new(considered: Vec<CandidateMove>, committed: Vec<CandidateMove>) -> Self {
        Self {
            consider: Mutex::new(Script::new(considered, None)),
            commit: Mutex::new(Script::new(committed, None)),
        }
    }

    /// 分析与定稿都始终返回同一候选
    pub fn repeating(candidate: CandidateMove) -> Self {
        Self {
            consider: Mutex::new(Script::new(Vec::new(), Some(candidate.clone()))),
            commit: Mutex::new(Script::new(Vec::new(), Some(candidate))),
        }
    }

    pub fn consider_count(&self) -> usize {
        self.consider.lock().map(|s| s.inputs.len()).unwrap_or(0)
    }

    pub fn commit_count(&self) -> usize {
        self.commit_inputs().len()
    }

    pub fn commit_inputs(&self) -> Vec<RecordedInput> {
        self.commit.lock().map(|s| s.inputs.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MoveProposer for ScriptedProposals {
    async fn consider(&self, input: &DeliberationInput<'_>) -> Result<CandidateMove, AgentError> {
        self.consider.lock().map_err(|_| lock_err())?.next(input)
    }

    async fn commit(&self, input: &DeliberationInput<'_>) -> Result<CandidateMove, AgentError> {
        self.commit.lock().map_err(|_| lock_err())?.next(input)
    }
}
