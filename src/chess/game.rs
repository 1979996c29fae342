//! 对局状态：权威局面 + 走法历史（基于 shakmaty）
//!
//! 只有合法走法会被应用；审议失败时调用方不触碰 GameState，局面保持不变。

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Outcome, Position, Role, Square};

use crate::core::{AgentError, NotationError};

/// 供 UI / API 使用的局面状态视图
#[derive(Clone, Debug, Serialize)]
pub struct BoardStatus {
    pub fen: String,
    pub turn: String,
    pub legal_moves: Vec<String>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_game_over: bool,
    pub result: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GameState {
    initial: Chess,
    position: Chess,
    history: Vec<Move>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// 标准初始局面
    pub fn new() -> Self {
        Self {
            initial: Chess::default(),
            position: Chess::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, AgentError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| AgentError::InvalidPosition(format!("{}: {}", fen, e)))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| AgentError::InvalidPosition(format!("{}: {}", fen, e)))?;
        Ok(Self {
            initial: position.clone(),
            position,
            history: Vec::new(),
        })
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// 应用一步走法；非法走法返回 IllegalMove 且局面不变
    pub fn apply_move(&mut self, m: &Move) -> Result<(), NotationError> {
        if !self.position.is_legal(m) {
            return Err(NotationError::IllegalMove(self.uci(m)));
        }
        self.position.play_unchecked(m);
        self.history.push(m.clone());
        Ok(())
    }

    pub fn uci(&self, m: &Move) -> String {
        m.to_uci(CastlingMode::Standard).to_string()
    }

    pub fn legal_moves_uci(&self) -> Vec<String> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| self.uci(m))
            .collect()
    }

    /// 按起止格查找合法走法；升变未指定时默认升后
    pub fn find_move(&self, from: &str, to: &str, promotion: Option<char>) -> Option<Move> {
        let from: Square = from.trim().to_lowercase().parse().ok()?;
        let to: Square = to.trim().to_lowercase().parse().ok()?;
        let wanted = promotion
            .and_then(|c| Role::from_char(c.to_ascii_lowercase()))
            .unwrap_or(Role::Queen);
        let legal = self.position.legal_moves();
        let mut candidates = legal
            .iter()
            .filter(|m| m.from() == Some(from) && m.to() == to)
            .peekable();
        let first = candidates.peek().map(|m| (*m).clone())?;
        if first.promotion().is_none() {
            return Some(first);
        }
        candidates.find(|m| m.promotion() == Some(wanted)).cloned()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    /// "1-0" / "0-1" / "1/2-1/2"；未结束时为 None
    pub fn result(&self) -> Option<&'static str> {
        self.position.outcome().map(|outcome| match outcome {
            Outcome::Decisive {
                winner: Color::White,
            } => "1-0",
            Outcome::Decisive {
                winner: Color::Black,
            } => "0-1",
            Outcome::Draw => "1/2-1/2",
        })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// 从初始局面重放，得到 SAN（含 +/# 后缀）历史
    pub fn san_history(&self) -> Vec<String> {
        let mut replay = self.initial.clone();
        self.history
            .iter()
            .map(|m| SanPlus::from_move_and_play_unchecked(&mut replay, m).to_string())
            .collect()
    }

    /// 带回合号的着法串，如 "1. e4 e5 2. Nf3"；黑方先行时以 "1... e5" 开头
    pub fn move_text(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut number = self.initial.fullmoves().get();
        let mut color = self.initial.turn();
        for (i, san) in self.san_history().into_iter().enumerate() {
            match color {
                Color::White => out.push(format!("{}. {}", number, san)),
                Color::Black if i == 0 => out.push(format!("{}... {}", number, san)),
                Color::Black => out.push(san),
            }
            if color == Color::Black {
                number += 1;
            }
            color = !color;
        }
        out.join(" ")
    }

    pub fn status(&self) -> BoardStatus {
        BoardStatus {
            fen: self.fen(),
            turn: color_name(self.turn()).to_string(),
            legal_moves: self.legal_moves_uci(),
            is_check: self.is_check(),
            is_checkmate: self.is_checkmate(),
            is_game_over: self.is_game_over(),
            result: self.result().map(String::from),
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
