//! 走法定稿：将代数记谱文本解析为当前局面下的合法走法
//!
//! 解析与合法性判断全部交给规则引擎；三类失败（记谱无效 / 非法 / 歧义）区分返回，均携带原文。

use shakmaty::san::{SanError, SanPlus};
use shakmaty::{Chess, Move};

use crate::core::NotationError;

/// 允许首尾空白与 +/# 后缀，不做其它修正（如去掉 "2." 回合号前缀）
pub fn finalize(position: &Chess, move_text: &str) -> Result<Move, NotationError> {
    let text = move_text.trim();
    let san: SanPlus = text
        .parse()
        .map_err(|_| NotationError::InvalidNotation(text.to_string()))?;
    san.san.to_move(position).map_err(|e| match e {
        SanError::IllegalSan => NotationError::IllegalMove(text.to_string()),
        SanError::AmbiguousSan => NotationError::AmbiguousMove(text.to_string()),
    })
}
