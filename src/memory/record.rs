//! 记忆条目：一步走法及其理由

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub move_text: String,
    pub reasoning: String,
}

impl MoveRecord {
    pub fn new(move_text: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            move_text: move_text.into(),
            reasoning: reasoning.into(),
        }
    }

    /// 渲染为 Prompt 中的一项
    pub fn to_prompt_item(&self) -> String {
        format!("- Move: {}\n  Reasoning: {}", self.move_text, self.reasoning)
    }
}

/// 将若干条目渲染为 Prompt 片段；为空时原样返回占位文本
pub fn render_records(records: &[MoveRecord], placeholder: &str) -> String {
    if records.is_empty() {
        return placeholder.to_string();
    }
    records
        .iter()
        .map(MoveRecord::to_prompt_item)
        .collect::<Vec<_>>()
        .join("\n")
}
