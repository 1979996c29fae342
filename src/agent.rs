//! Headless Agent 运行时
//!
//! 供控制台与 HTTP API 调用的无界面 Agent 逻辑：
//! create_agent_components 从配置构建审议引擎（LLM + 模板 + 上限 + 记谱策略），
//! request_agent_move 为会话跑一个回合并把定稿走法应用到局面。

use serde::Serialize;
use shakmaty::Color;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::core::{AgentError, GameSession};
use crate::deliberation::{DeliberationEngine, DeliberationEvent, PromptTemplates};
use crate::llm::create_llm_from_config;

/// 预构建的 Agent 组件：审议引擎无会话状态，可被多个会话共享
pub struct AgentComponents {
    pub engine: DeliberationEngine,
    pub agent_color: Color,
}

/// hard_iteration_cap 为 0 时回合不可能完成，视为配置错误
pub fn create_agent_components(cfg: &AppConfig) -> Result<AgentComponents, AgentError> {
    let limits = cfg.agent.limits();
    if limits.hard_iteration_cap == 0 {
        return Err(AgentError::Config(
            "agent.hard_iteration_cap must be at least 1".to_string(),
        ));
    }
    if limits.max_proposals >= limits.hard_iteration_cap {
        tracing::warn!(
            max_proposals = limits.max_proposals,
            hard_iteration_cap = limits.hard_iteration_cap,
            "proposal cap can never force a commit before the iteration cap"
        );
    }

    let llm = create_llm_from_config(cfg);
    let prompts = PromptTemplates::load(&cfg.agent.prompts_dir);
    let engine = DeliberationEngine::from_llm(llm, prompts)
        .with_limits(limits)
        .with_notation_policy(cfg.agent.notation_policy());
    Ok(AgentComponents {
        engine,
        agent_color: cfg.agent.agent_color(),
    })
}

/// 一次 Agent 走子的结果
#[derive(Debug, Clone, Serialize)]
pub struct AgentMove {
    pub uci: String,
    pub san: String,
    pub reasoning: String,
    pub decision_reasoning: String,
    pub iterations: usize,
    pub proposals: usize,
}

/// 为会话走一个 Agent 回合；任何错误都不修改局面与对局记忆
pub async fn request_agent_move(
    engine: &DeliberationEngine,
    session: &mut GameSession,
    event_tx: Option<&mpsc::UnboundedSender<DeliberationEvent>>,
) -> Result<AgentMove, AgentError> {
    if session.game.is_game_over() {
        return Err(AgentError::GameOver);
    }
    if !session.is_agent_turn() {
        return Err(AgentError::NotAgentTurn);
    }

    tracing::info!(session = %session.id, "agent turn started");
    let outcome = engine
        .decide_turn(&session.game, &mut session.memory, event_tx)
        .await?;
    let uci = session.game.uci(&outcome.mv);
    session.game.apply_move(&outcome.mv)?;
    session.last_reasoning = Some(outcome.reasoning.clone());

    Ok(AgentMove {
        uci,
        san: outcome.move_text,
        reasoning: outcome.reasoning,
        decision_reasoning: outcome.decision_reasoning,
        iterations: outcome.iterations,
        proposals: outcome.proposals,
    })
}

/// 与 request_agent_move 相同，但审议事件在回合进行中交给 on_event；
/// 返回前保证本回合的全部事件都已交付
pub async fn request_agent_move_observed<F>(
    engine: &DeliberationEngine,
    session: &mut GameSession,
    mut on_event: F,
) -> Result<AgentMove, AgentError>
where
    F: FnMut(&DeliberationEvent),
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let result = {
        let turn = request_agent_move(engine, session, Some(&tx));
        tokio::pin!(turn);
        loop {
            tokio::select! {
                Some(ev) = rx.recv() => on_event(&ev),
                res = &mut turn => break res,
            }
        }
    };
    drop(tx);
    while let Some(ev) = rx.recv().await {
        on_event(&ev);
    }
    result
}
