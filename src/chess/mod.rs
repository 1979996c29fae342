//! 规则引擎边界：对局状态、走法定稿、局面快照

pub mod finalize;
pub mod game;
pub mod snapshot;

pub use finalize::finalize;
pub use game::{color_name, BoardStatus, GameState};
pub use snapshot::{board_diagram, render_position};
