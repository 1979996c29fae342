//! DeepSeek 后端（OpenAI 兼容端点）
//!
//! 模型解析顺序：`[llm.deepseek].model` > `DEEPSEEK_MODEL` > `[llm].model` > deepseek-chat。
//! deepseek-reasoner 也可用，但审议回合调用次数多，默认用 deepseek-chat。

use crate::config::LlmSection;
use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";

fn resolve_model(llm: &LlmSection, env_model: Option<String>) -> String {
    llm.deepseek
        .model
        .clone()
        .or(env_model)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if llm.model.trim().is_empty() {
                DEEPSEEK_CHAT.to_string()
            } else {
                llm.model.clone()
            }
        })
}

/// Key 取 `DEEPSEEK_API_KEY`，其次 `OPENAI_API_KEY`；`[llm].base_url` 可指向代理
pub fn create_deepseek_client(llm: &LlmSection) -> OpenAiClient {
    let api_key = std::env::var("DEEPSEEK_API_KEY")
        .ok()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());
    let model = resolve_model(llm, std::env::var("DEEPSEEK_MODEL").ok());
    let base_url = llm.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
    tracing::info!("Using DeepSeek LLM ({} @ {})", model, base_url);

    OpenAiClient::new(Some(base_url), &model, api_key.as_deref()).with_temperature(llm.temperature)
}
