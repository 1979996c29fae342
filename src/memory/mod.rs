//! 记忆层：对局记忆（已定稿走法）与分析记忆（本回合候选）

pub mod record;
pub mod store;

pub use record::MoveRecord;
pub use store::{MemoryStore, NO_ANALYSIS_PLACEHOLDER, NO_GAME_MOVES_PLACEHOLDER};
