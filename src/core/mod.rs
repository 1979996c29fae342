//! 核心层：错误类型、对局会话与会话注册表

pub mod error;
pub mod session;

pub use error::{AgentError, NotationError};
pub use session::{GameSession, GameView, SessionRegistry, SharedSession};
