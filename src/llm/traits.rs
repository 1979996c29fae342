//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：complete（非流式）。
//! 审议引擎只依赖此 trait，测试中以脚本化客户端替换真实服务。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 传输层 / 服务层失败；本层不做自动重试
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("empty response from model")]
    EmptyResponse,
}

/// LLM 客户端 trait：一次请求 / 一次回复
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 模型标识，仅用于日志
    fn model_name(&self) -> &str {
        "unknown"
    }
}

/// 超时包装：每次调用最多等待 `timeout`，超时映射为 LlmError::Timeout
pub struct TimeoutLlmClient {
    inner: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl TimeoutLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl LlmClient for TimeoutLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(messages)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "LLM call to {} timed out after {}s",
                    self.inner.model_name(),
                    self.timeout.as_secs()
                );
                Err(LlmError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_llm_error() {
        let client = TimeoutLlmClient::new(Arc::new(SlowClient), Duration::from_secs(5));
        let err = client.complete(&[Message::user("hi")]).await.unwrap_err();
        assert_eq!(err, LlmError::Timeout { secs: 5 });
    }

    #[tokio::test]
    async fn test_timeout_passes_through_fast_reply() {
        let client = TimeoutLlmClient::new(
            Arc::new(crate::llm::ScriptedLlmClient::new(vec!["ok"])),
            Duration::from_secs(5),
        );
        assert_eq!(client.complete(&[Message::user("hi")]).await.unwrap(), "ok");
    }
}
