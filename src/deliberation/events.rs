//! 审议过程事件：供控制台 / 前端实时展示

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliberationEvent {
    TurnStarted { side_to_move: String },
    /// 正在请求第 iteration 次决策
    Deciding { iteration: usize },
    Decided {
        iteration: usize,
        action: String,
        reasoning: String,
    },
    /// 第 index 个候选走法已加入分析记忆
    Considered {
        index: usize,
        move_text: String,
        reasoning: String,
    },
    /// 候选数达到上限，忽略决策结果强制定稿
    ForcedCommit { proposals: usize },
    NotationRejected { attempt: usize, error: String },
    Committed { move_text: String, reasoning: String },
    Failed { error: String },
}

pub(crate) fn send_event(tx: Option<&mpsc::UnboundedSender<DeliberationEvent>>, ev: DeliberationEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}
