//! 两项能力：决策（继续分析 / 定稿）与候选走法（分析新候选 / 定稿走法）
//!
//! 审议引擎只依赖这两个 trait；LLM 实现各自对应一次结构化调用，测试中可直接替换为脚本化实现。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::deliberation::prompts::PromptTemplates;
use crate::deliberation::structured::complete_structured;
use crate::deliberation::types::{CandidateMove, Decision, DecisionReply, TurnContext};
use crate::llm::LlmClient;

/// 每次能力调用的输入：回合上下文 + 已渲染的记忆片段
#[derive(Debug, Clone)]
pub struct DeliberationInput<'a> {
    pub context: &'a TurnContext,
    /// 最近若干条对局记忆（或占位文本）
    pub game_memory: String,
    /// 本回合全部分析记忆（或占位文本）
    pub considered_moves: String,
    /// 仅定稿调用使用
    pub decision_reasoning: Option<&'a str>,
    /// 仅 RetryWithFeedback 策略重试定稿时使用
    pub error_hint: Option<&'a str>,
}

#[async_trait]
pub trait DecisionMaker: Send + Sync {
    async fn decide(&self, input: &DeliberationInput<'_>) -> Result<Decision, AgentError>;
}

#[async_trait]
pub trait MoveProposer: Send + Sync {
    /// 分析一个尚未考虑过的候选走法
    async fn consider(&self, input: &DeliberationInput<'_>) -> Result<CandidateMove, AgentError>;

    /// 选出本回合最终走法（有候选时从候选中选，无候选时直接给出）
    async fn commit(&self, input: &DeliberationInput<'_>) -> Result<CandidateMove, AgentError>;
}

pub struct LlmDecisionMaker {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptTemplates>,
}

impl LlmDecisionMaker {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptTemplates>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl DecisionMaker for LlmDecisionMaker {
    async fn decide(&self, input: &DeliberationInput<'_>) -> Result<Decision, AgentError> {
        let user = self.prompts.render_decision(input);
        let reply: DecisionReply =
            complete_structured(self.llm.as_ref(), &self.prompts.system, &user).await?;
        Decision::try_from(reply)
    }
}

pub struct LlmMoveProposer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptTemplates>,
}

impl LlmMoveProposer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptTemplates>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl MoveProposer for LlmMoveProposer {
    async fn consider(&self, input: &DeliberationInput<'_>) -> Result<CandidateMove, AgentError> {
        let user = self.prompts.render_consider(input);
        complete_structured(self.llm.as_ref(), &self.prompts.system, &user).await
    }

    async fn commit(&self, input: &DeliberationInput<'_>) -> Result<CandidateMove, AgentError> {
        let user = self.prompts.render_commit(input);
        complete_structured(self.llm.as_ref(), &self.prompts.system, &user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliberation::DecisionAction;
    use crate::llm::ScriptedLlmClient;

    fn input(ctx: &TurnContext) -> DeliberationInput<'_> {
        DeliberationInput {
            context: ctx,
            game_memory: "No moves have been made yet.".to_string(),
            considered_moves: "No moves have been considered yet.".to_string(),
            decision_reasoning: None,
            error_hint: None,
        }
    }

    fn ctx() -> TurnContext {
        TurnContext {
            position: "FEN: startpos".to_string(),
            side_to_move: "Black".to_string(),
        }
    }

    #[tokio::test]
    async fn test_llm_decision_maker_parses_action() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            r#"{"action": "consider_new", "reasoning": "only one idea so far"}"#,
        ]));
        let decider = LlmDecisionMaker::new(llm.clone(), Arc::new(PromptTemplates::default()));
        let ctx = ctx();
        let decision = decider.decide(&input(&ctx)).await.unwrap();
        assert_eq!(decision.action, DecisionAction::ConsiderNew);
        assert!(llm.calls()[0][1].content.contains("FEN: startpos"));
    }

    #[tokio::test]
    async fn test_llm_decision_maker_rejects_unknown_action() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            r#"{"action": "resign", "reasoning": "hopeless"}"#,
        ]));
        let decider = LlmDecisionMaker::new(llm, Arc::new(PromptTemplates::default()));
        let ctx = ctx();
        let err = decider.decide(&input(&ctx)).await.unwrap_err();
        assert!(matches!(err, AgentError::CapabilityContractViolation(_)));
    }

    #[tokio::test]
    async fn test_llm_move_proposer_uses_distinct_templates() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            r#"{"move": "e5", "reasoning": "a"}"#,
            r#"{"move": "c5", "reasoning": "b"}"#,
        ]));
        let proposer = LlmMoveProposer::new(llm.clone(), Arc::new(PromptTemplates::default()));
        let ctx = ctx();
        proposer.consider(&input(&ctx)).await.unwrap();
        let committed = proposer.commit(&input(&ctx)).await.unwrap();
        assert_eq!(committed.move_text, "c5");
        let calls = llm.calls();
        assert!(calls[0][1].content.contains("DO NOT CHOOSE FROM THESE MOVES"));
        assert!(calls[1][1].content.contains("ONLY CHOOSE FROM THESE MOVES"));
    }
}
