//! 审议层：决策 / 候选走法能力、Prompt 模板、结构化输出、审议引擎

pub mod capabilities;
pub mod engine;
pub mod events;
pub mod prompts;
pub mod scripted;
pub mod structured;
pub mod types;

pub use capabilities::{
    DecisionMaker, DeliberationInput, LlmDecisionMaker, LlmMoveProposer, MoveProposer,
};
pub use engine::{DeliberationEngine, DeliberationLimits, NotationPolicy};
pub use events::DeliberationEvent;
pub use prompts::PromptTemplates;
pub use scripted::{RecordedInput, ScriptedDecisions, ScriptedProposals};
pub use types::{CandidateMove, Decision, DecisionAction, TurnContext, TurnOutcome};
