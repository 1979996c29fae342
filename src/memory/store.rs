//! 记忆存储：对局记忆（跨回合、只追加）与分析记忆（仅本回合）
//!
//! 对局记忆按窗口读取（默认最近 3 条）以控制 Prompt 长度；分析记忆由审议引擎在回合开始与结束时清空。
//! 每个对局会话持有独立的 MemoryStore，不跨会话共享。

use serde::Serialize;

use crate::memory::record::{render_records, MoveRecord};

/// 对局记忆为空时渲染进 Prompt 的占位文本
pub const NO_GAME_MOVES_PLACEHOLDER: &str = "No moves have been made yet.";
/// 本回合尚无候选走法时的占位文本
pub const NO_ANALYSIS_PLACEHOLDER: &str = "No moves have been considered yet.";

#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryStore {
    game: Vec<MoveRecord>,
    analysis: Vec<MoveRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近 limit 条已定稿走法，按时间顺序（旧 -> 新）
    pub fn recent_game_moves(&self, limit: usize) -> &[MoveRecord] {
        let start = self.game.len().saturating_sub(limit);
        &self.game[start..]
    }

    /// recent_game_moves 的 Prompt 渲染；为空时为占位文本
    pub fn recent_game_moves_prompt(&self, limit: usize) -> String {
        render_records(self.recent_game_moves(limit), NO_GAME_MOVES_PLACEHOLDER)
    }

    pub fn all_analysis_entries(&self) -> &[MoveRecord] {
        &self.analysis
    }

    pub fn all_analysis_entries_prompt(&self) -> String {
        render_records(&self.analysis, NO_ANALYSIS_PLACEHOLDER)
    }

    pub fn game_moves(&self) -> &[MoveRecord] {
        &self.game
    }

    pub fn append_game_move(&mut self, entry: MoveRecord) {
        self.game.push(entry);
    }

    pub fn append_analysis(&mut self, entry: MoveRecord) {
        self.analysis.push(entry);
    }

    pub fn clear_analysis(&mut self) {
        self.analysis.clear();
    }

    pub fn game_len(&self) -> usize {
        self.game.len()
    }

    pub fn analysis_len(&self) -> usize {
        self.analysis.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(n: usize) -> MemoryStore {
        let mut store = MemoryStore::new();
        for i in 1..=n {
            store.append_game_move(MoveRecord::new(format!("m{i}"), format!("r{i}")));
        }
        store
    }

    #[test]
    fn test_recent_window_is_oldest_first() {
        let store = store_with(5);
        let recent: Vec<&str> = store
            .recent_game_moves(3)
            .iter()
            .map(|r| r.move_text.as_str())
            .collect();
        assert_eq!(recent, vec!["m3", "m4", "m5"]);
    }

    #[test]
    fn test_recent_window_shorter_than_limit() {
        let store = store_with(2);
        assert_eq!(store.recent_game_moves(3).len(), 2);
    }

    #[test]
    fn test_empty_game_memory_renders_placeholder() {
        let store = MemoryStore::new();
        assert!(store.recent_game_moves(3).is_empty());
        assert_eq!(store.recent_game_moves_prompt(3), "No moves have been made yet.");
        assert_eq!(store.all_analysis_entries_prompt(), NO_ANALYSIS_PLACEHOLDER);
    }

    #[test]
    fn test_prompt_rendering_contains_move_and_reasoning() {
        let mut store = MemoryStore::new();
        store.append_analysis(MoveRecord::new("Nf6", "develops a piece"));
        let rendered = store.all_analysis_entries_prompt();
        assert!(rendered.contains("Nf6"));
        assert!(rendered.contains("develops a piece"));
    }

    #[test]
    fn test_clear_analysis_keeps_game_memory() {
        let mut store = store_with(1);
        store.append_analysis(MoveRecord::new("e5", "center"));
        store.clear_analysis();
        assert_eq!(store.analysis_len(), 0);
        assert_eq!(store.game_len(), 1);
    }
}
