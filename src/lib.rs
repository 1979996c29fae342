//! Gambit - LLM 驱动的国际象棋智能体
//!
//! 模块划分：
//! - **agent**: 无头 Agent 运行时（供控制台 / HTTP 调用）
//! - **chess**: 规则引擎边界（shakmaty 封装）、走法定稿、局面快照
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、对局会话与会话注册表
//! - **deliberation**: 决策 / 候选走法能力、审议状态机、Prompt 模板
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 对局记忆与本回合分析记忆
//! - **web**: axum 路由（feature = "web"）

pub mod agent;
pub mod chess;
pub mod config;
pub mod core;
pub mod deliberation;
pub mod llm;
pub mod memory;
pub mod observability;
#[cfg(feature = "web")]
pub mod web;

pub use agent::{create_agent_components, request_agent_move, AgentComponents};
pub use deliberation::{DeliberationEngine, DeliberationLimits, NotationPolicy};
