//! 审议引擎：决策 -> (分析候选 | 定稿) 主循环
//!
//! 每轮先调用决策能力，再判断：候选数已达上限则强制定稿（优先于决策结果）；
//! 决策为 commit 则定稿；否则分析一个新候选写入分析记忆。决策调用次数受 hard_iteration_cap 约束，
//! 超出即 TurnBudgetExceeded。分析记忆在回合开始与结束（含失败）时清空；只有成功定稿才写入对局记忆。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::chess::{finalize, GameState};
use crate::core::AgentError;
use crate::deliberation::capabilities::{
    DecisionMaker, DeliberationInput, LlmDecisionMaker, LlmMoveProposer, MoveProposer,
};
use crate::deliberation::events::{send_event, DeliberationEvent};
use crate::deliberation::prompts::PromptTemplates;
use crate::deliberation::types::{Decision, DecisionAction, TurnContext, TurnOutcome};
use crate::llm::LlmClient;
use crate::memory::MemoryStore;

/// 单回合审议上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliberationLimits {
    /// 每回合最多分析的候选数
    pub max_proposals: usize,
    /// 每回合最多的决策调用次数
    pub hard_iteration_cap: usize,
    /// 拼入 Prompt 的最近对局记忆条数
    pub recent_moves_window: usize,
}

impl Default for DeliberationLimits {
    fn default() -> Self {
        Self {
            max_proposals: 3,
            hard_iteration_cap: 6,
            recent_moves_window: 3,
        }
    }
}

/// 定稿走法记谱错误时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotationPolicy {
    /// 直接返回记谱错误，回合中止
    #[default]
    Propagate,
    /// 带上错误提示重新请求定稿，总共最多 max_attempts 次；不重跑决策 / 分析
    RetryWithFeedback { max_attempts: usize },
}

impl NotationPolicy {
    fn max_attempts(&self) -> usize {
        match self {
            NotationPolicy::Propagate => 1,
            NotationPolicy::RetryWithFeedback { max_attempts } => (*max_attempts).max(1),
        }
    }
}

/// 回合内计数，回合结束即丢弃
#[derive(Debug, Default, Clone, Copy)]
struct DeliberationState {
    iterations: usize,
    proposals: usize,
}

/// 审议引擎：能力无状态可共享；记忆与局面由调用方（会话）持有并传入
pub struct DeliberationEngine {
    decider: Arc<dyn DecisionMaker>,
    proposer: Arc<dyn MoveProposer>,
    limits: DeliberationLimits,
    notation_policy: NotationPolicy,
}

impl DeliberationEngine {
    pub fn new(decider: Arc<dyn DecisionMaker>, proposer: Arc<dyn MoveProposer>) -> Self {
        Self {
            decider,
            proposer,
            limits: DeliberationLimits::default(),
            notation_policy: NotationPolicy::default(),
        }
    }

    /// 两项能力共用同一个 LLM 与模板
    pub fn from_llm(llm: Arc<dyn LlmClient>, prompts: PromptTemplates) -> Self {
        let prompts = Arc::new(prompts);
        Self::new(
            Arc::new(LlmDecisionMaker::new(llm.clone(), prompts.clone())),
            Arc::new(LlmMoveProposer::new(llm, prompts)),
        )
    }

    pub fn with_limits(mut self, limits: DeliberationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_notation_policy(mut self, policy: NotationPolicy) -> Self {
        self.notation_policy = policy;
        self
    }

    pub fn limits(&self) -> DeliberationLimits {
        self.limits
    }

    pub fn notation_policy(&self) -> NotationPolicy {
        self.notation_policy
    }

    /// 为当前局面走一个回合，返回定稿走法（不修改局面，由调用方应用）
    pub async fn decide_turn(
        &self,
        game: &GameState,
        memory: &mut MemoryStore,
        event_tx: Option<&mpsc::UnboundedSender<DeliberationEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let context = TurnContext::from_game(game);
        memory.clear_analysis();
        send_event(
            event_tx,
            DeliberationEvent::TurnStarted {
                side_to_move: context.side_to_move.clone(),
            },
        );

        let result = self.deliberate(&context, game, memory, event_tx).await;
        memory.clear_analysis();

        if let Err(e) = &result {
            tracing::warn!("Agent turn aborted: {}", e);
            send_event(event_tx, DeliberationEvent::Failed { error: e.to_string() });
        }
        result
    }

    async fn deliberate(
        &self,
        context: &TurnContext,
        game: &GameState,
        memory: &mut MemoryStore,
        event_tx: Option<&mpsc::UnboundedSender<DeliberationEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let mut state = DeliberationState::default();

        loop {
            if state.iterations >= self.limits.hard_iteration_cap {
                return Err(AgentError::TurnBudgetExceeded {
                    iterations: state.iterations,
                });
            }

            send_event(
                event_tx,
                DeliberationEvent::Deciding {
                    iteration: state.iterations + 1,
                },
            );
            let decision = self.decider.decide(&self.input(context, memory)).await?;
            state.iterations += 1;
            tracing::debug!(
                iteration = state.iterations,
                proposals = state.proposals,
                action = decision.action.as_str(),
                "decision received"
            );
            send_event(
                event_tx,
                DeliberationEvent::Decided {
                    iteration: state.iterations,
                    action: decision.action.as_str().to_string(),
                    reasoning: decision.reasoning.clone(),
                },
            );

            if state.proposals >= self.limits.max_proposals {
                if decision.action == DecisionAction::ConsiderNew {
                    tracing::warn!(
                        proposals = state.proposals,
                        "proposal cap reached, forcing commit"
                    );
                    send_event(
                        event_tx,
                        DeliberationEvent::ForcedCommit {
                            proposals: state.proposals,
                        },
                    );
                }
                return self
                    .commit_move(context, game, memory, &decision, state, event_tx)
                    .await;
            }

            match decision.action {
                DecisionAction::Commit => {
                    return self
                        .commit_move(context, game, memory, &decision, state, event_tx)
                        .await;
                }
                DecisionAction::ConsiderNew => {
                    let candidate = self.proposer.consider(&self.input(context, memory)).await?;
                    memory.append_analysis(candidate.to_record());
                    state.proposals += 1;
                    send_event(
                        event_tx,
                        DeliberationEvent::Considered {
                            index: state.proposals,
                            move_text: candidate.move_text.trim().to_string(),
                            reasoning: candidate.reasoning,
                        },
                    );
                }
            }
        }
    }

    /// 请求定稿走法并交给规则引擎校验；成功才写入对局记忆
    async fn commit_move(
        &self,
        context: &TurnContext,
        game: &GameState,
        memory: &mut MemoryStore,
        decision: &Decision,
        state: DeliberationState,
        event_tx: Option<&mpsc::UnboundedSender<DeliberationEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let max_attempts = self.notation_policy.max_attempts();
        let mut last_error: Option<String> = None;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let candidate = {
                let mut input = self.input(context, memory);
                input.decision_reasoning = Some(&decision.reasoning);
                input.error_hint = last_error.as_deref();
                self.proposer.commit(&input).await?
            };

            match finalize(game.position(), &candidate.move_text) {
                Ok(mv) => {
                    let record = candidate.to_record();
                    memory.append_game_move(record.clone());
                    tracing::info!(
                        iterations = state.iterations,
                        proposals = state.proposals,
                        "agent committed {}",
                        record.move_text
                    );
                    send_event(
                        event_tx,
                        DeliberationEvent::Committed {
                            move_text: record.move_text.clone(),
                            reasoning: record.reasoning.clone(),
                        },
                    );
                    return Ok(TurnOutcome {
                        mv,
                        move_text: record.move_text,
                        reasoning: record.reasoning,
                        decision_reasoning: decision.reasoning.clone(),
                        iterations: state.iterations,
                        proposals: state.proposals,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt, "committed move rejected: {}", e);
                    send_event(
                        event_tx,
                        DeliberationEvent::NotationRejected {
                            attempt,
                            error: e.to_string(),
                        },
                    );
                    if attempt >= max_attempts {
                        return Err(e.into());
                    }
                    last_error = Some(e.to_string());
                }
            }
        }
    }

    fn input<'a>(&self, context: &'a TurnContext, memory: &MemoryStore) -> DeliberationInput<'a> {
        DeliberationInput {
            context,
            game_memory: memory.recent_game_moves_prompt(self.limits.recent_moves_window),
            considered_moves: memory.all_analysis_entries_prompt(),
            decision_reasoning: None,
            error_hint: None,
        }
    }
}
