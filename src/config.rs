//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `GAMBIT__*` 覆盖（双下划线表示嵌套，如 `GAMBIT__AGENT__MAX_PROPOSALS=2`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::deliberation::{DeliberationLimits, NotationPolicy};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub web: WebSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择、采样温度与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；最终由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub deepseek: LlmDeepSeekSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            deepseek: LlmDeepSeekSection::default(),
            openai: LlmOpenAiSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次能力调用（决策 / 候选走法）超时，秒
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [agent] 段：审议上限、记忆窗口、执子颜色、走法纠错策略
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_max_proposals")]
    pub max_proposals: usize,
    #[serde(default = "default_hard_iteration_cap")]
    pub hard_iteration_cap: usize,
    #[serde(default = "default_recent_moves_window")]
    pub recent_moves_window: usize,
    /// white / black
    #[serde(default = "default_agent_color")]
    pub agent_color: String,
    /// propagate / retry_with_feedback
    #[serde(default = "default_notation_policy")]
    pub notation_policy: String,
    #[serde(default = "default_notation_max_attempts")]
    pub notation_max_attempts: usize,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_proposals: default_max_proposals(),
            hard_iteration_cap: default_hard_iteration_cap(),
            recent_moves_window: default_recent_moves_window(),
            agent_color: default_agent_color(),
            notation_policy: default_notation_policy(),
            notation_max_attempts: default_notation_max_attempts(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

fn default_max_proposals() -> usize {
    3
}

fn default_hard_iteration_cap() -> usize {
    6
}

fn default_recent_moves_window() -> usize {
    3
}

fn default_agent_color() -> String {
    "black".to_string()
}

fn default_notation_policy() -> String {
    "propagate".to_string()
}

fn default_notation_max_attempts() -> usize {
    3
}

fn default_prompts_dir() -> PathBuf {
    PathBuf::from("config/prompts")
}

impl AgentSection {
    pub fn limits(&self) -> DeliberationLimits {
        DeliberationLimits {
            max_proposals: self.max_proposals,
            hard_iteration_cap: self.hard_iteration_cap,
            recent_moves_window: self.recent_moves_window,
        }
    }

    /// 未识别的策略名按 propagate 处理并记录警告
    pub fn notation_policy(&self) -> NotationPolicy {
        match self.notation_policy.trim().to_lowercase().as_str() {
            "retry_with_feedback" | "retry" => NotationPolicy::RetryWithFeedback {
                max_attempts: self.notation_max_attempts.max(1),
            },
            "propagate" => NotationPolicy::Propagate,
            other => {
                tracing::warn!("Unknown notation_policy '{}', using propagate", other);
                NotationPolicy::Propagate
            }
        }
    }

    pub fn agent_color(&self) -> shakmaty::Color {
        match self.agent_color.trim().to_lowercase().as_str() {
            "white" | "w" => shakmaty::Color::White,
            _ => shakmaty::Color::Black,
        }
    }
}

/// [web] 段：监听端口、静态目录与会话上限
#[derive(Debug, Clone, Deserialize)]
pub struct WebSection {
    #[serde(default = "default_port")]
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    /// 同时保留的会话数上限，超出时淘汰最早创建的会话
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// 会话存活秒数；0 表示不按时间淘汰
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: None,
            max_sessions: default_max_sessions(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_max_sessions() -> usize {
    crate::core::session::DEFAULT_MAX_SESSIONS
}

fn default_session_ttl_secs() -> u64 {
    86_400
}

fn default_port() -> u16 {
    8000
}

/// 从 config 目录加载配置，环境变量 GAMBIT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 GAMBIT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("GAMBIT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deliberation_bounds() {
        let cfg = AppConfig::default();
        let limits = cfg.agent.limits();
        assert_eq!(limits.max_proposals, 3);
        assert_eq!(limits.hard_iteration_cap, 6);
        assert_eq!(limits.recent_moves_window, 3);
        assert_eq!(cfg.agent.notation_policy(), NotationPolicy::Propagate);
        assert_eq!(cfg.agent.agent_color(), shakmaty::Color::Black);
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert_eq!(cfg.web.port, 8000);
        assert_eq!(cfg.web.max_sessions, 1000);
        assert_eq!(cfg.web.session_ttl_secs, 86_400);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gambit.toml");
        std::fs::write(
            &path,
            r#"
[llm]
provider = "mock"

[agent]
max_proposals = 2
agent_color = "white"
notation_policy = "retry_with_feedback"
notation_max_attempts = 4
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.agent.max_proposals, 2);
        assert_eq!(cfg.agent.hard_iteration_cap, 6);
        assert_eq!(cfg.agent.agent_color(), shakmaty::Color::White);
        assert_eq!(
            cfg.agent.notation_policy(),
            NotationPolicy::RetryWithFeedback { max_attempts: 4 }
        );
    }

    #[test]
    fn test_unknown_policy_falls_back_to_propagate() {
        let section = AgentSection {
            notation_policy: "loop_forever".to_string(),
            ..AgentSection::default()
        };
        assert_eq!(section.notation_policy(), NotationPolicy::Propagate);
    }
}
