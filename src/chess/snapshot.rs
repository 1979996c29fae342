//! 局面快照：确定性的文本渲染（FEN + 棋盘图 + 着法串），原样作为 Prompt 的 position 字段

use shakmaty::{Position, Square};

use crate::chess::GameState;

/// 8x8 棋盘图：白方在下，大写为白子，'.' 为空格
pub fn board_diagram(game: &GameState) -> String {
    let board = game.position().board();
    (0..8u32)
        .rev()
        .map(|rank| {
            (0..8u32)
                .map(|file| {
                    board
                        .piece_at(Square::new(rank * 8 + file))
                        .map(|p| p.char())
                        .unwrap_or('.')
                        .to_string()
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_position(game: &GameState) -> String {
    let moves = game.move_text();
    let moves = if moves.is_empty() {
        "(no moves yet)".to_string()
    } else {
        moves
    };
    format!(
        "Current Board State:\nFEN: {}\n\nBoard Position:\n{}\n\nGame Moves:\n{}",
        game.fen(),
        board_diagram(game),
        moves
    )
}
