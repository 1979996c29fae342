//! 结构化输出：把 JSON Schema（schemars 生成）拼入 system prompt，再从回复中提取 JSON 对象解析
//!
//! 回复无法解析为要求的结构时返回 MalformedOutput，本层不重试。

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};

/// 回复预览最大字符数（错误信息用）
const REPLY_PREVIEW_CHARS: usize = 200;

/// 从文本中提取 JSON 对象：优先 ```json ... ``` 代码块，否则取第一个能完整解析为对象的 '{' 起始片段
pub fn extract_json_object(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    let body = match trimmed.find("```json") {
        Some(start) => {
            let rest = &trimmed[start + 7..];
            rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
        }
        None => trimmed,
    };
    body.match_indices('{').find_map(|(start, _)| {
        let candidate = &body[start..];
        let mut stream =
            serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(serde_json::Value::Object(_))) => Some(&candidate[..stream.byte_offset()]),
            _ => None,
        }
    })
}

pub fn schema_json<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 一次结构化调用：system + user 两条消息，返回要求的结构 T
pub async fn complete_structured<T>(
    llm: &dyn LlmClient,
    system: &str,
    user: &str,
) -> Result<T, AgentError>
where
    T: DeserializeOwned + JsonSchema,
{
    let system = format!(
        "{}\n\nRespond with a single JSON object that matches this JSON Schema and nothing else:\n{}",
        system,
        schema_json::<T>()
    );
    let messages = [Message::system(system), Message::user(user)];
    tracing::debug!(
        model = llm.model_name(),
        prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
        "structured LLM call"
    );
    let reply = llm.complete(&messages).await?;

    let json = extract_json_object(&reply).ok_or_else(|| {
        let preview: String = reply.chars().take(REPLY_PREVIEW_CHARS).collect();
        AgentError::MalformedOutput(format!("no JSON object in reply: {}", preview))
    })?;
    serde_json::from_str(json).map_err(|e| AgentError::MalformedOutput(format!("{}: {}", e, json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliberation::CandidateMove;
    use crate::llm::ScriptedLlmClient;

    #[test]
    fn test_extract_plain_and_fenced_json() {
        assert_eq!(extract_json_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
        let fenced = "Sure!\n```json\n{\"move\": \"e5\"}\n```\nGood luck";
        assert_eq!(extract_json_object(fenced), Some("{\"move\": \"e5\"}"));
        assert_eq!(extract_json_object("e5 is best"), None);
    }

    #[test]
    fn test_extract_skips_braces_in_prose() {
        let reply = r#"I like {e5} here. {"move": "e5", "reasoning": "centre {d4} next"} Done {x}"#;
        assert_eq!(
            extract_json_object(reply),
            Some(r#"{"move": "e5", "reasoning": "centre {d4} next"}"#)
        );
    }

    #[test]
    fn test_schema_mentions_fields() {
        let schema = schema_json::<CandidateMove>();
        assert!(schema.contains("\"move\""));
        assert!(schema.contains("\"reasoning\""));
    }

    #[tokio::test]
    async fn test_complete_structured_sends_schema_and_parses() {
        let llm = ScriptedLlmClient::new(vec![r#"{"move": "Nf6", "reasoning": "develop"}"#]);
        let c: CandidateMove = complete_structured(&llm, "You are a chess player.", "Position: ...")
            .await
            .unwrap();
        assert_eq!(c, CandidateMove::new("Nf6", "develop"));
        let calls = llm.calls();
        assert!(calls[0][0].content.contains("JSON Schema"));
        assert_eq!(calls[0][1].content, "Position: ...");
    }

    #[tokio::test]
    async fn test_missing_field_is_malformed() {
        let llm = ScriptedLlmClient::new(vec![r#"{"move": "Nf6"}"#]);
        let err = complete_structured::<CandidateMove>(&llm, "s", "u").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let llm = ScriptedLlmClient::new(Vec::<String>::new());
        let err = complete_structured::<CandidateMove>(&llm, "s", "u").await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
    }
}
