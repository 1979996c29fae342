//! Gambit - 控制台对局
//!
//! 入口：初始化日志、加载配置、构建审议引擎，然后在终端里与 Agent 对弈。
//! 人类输入 SAN（如 e4、Nf3、O-O）；命令：board / moves / retry / reset / quit。

use anyhow::Context;
use gambit::agent::request_agent_move_observed;
use gambit::chess::board_diagram;
use gambit::config::load_config;
use gambit::core::{AgentError, GameSession};
use gambit::deliberation::DeliberationEvent;
use gambit::{create_agent_components, observability, DeliberationEngine};
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_event(ev: &DeliberationEvent) {
    match ev {
        DeliberationEvent::TurnStarted { side_to_move } => {
            println!("[agent] thinking as {}...", side_to_move)
        }
        DeliberationEvent::Deciding { .. } => {}
        DeliberationEvent::Decided {
            iteration,
            action,
            reasoning,
        } => println!("[agent] decision #{}: {} ({})", iteration, action, reasoning),
        DeliberationEvent::Considered {
            index,
            move_text,
            reasoning,
        } => println!("[agent] candidate {}: {} - {}", index, move_text, reasoning),
        DeliberationEvent::ForcedCommit { proposals } => {
            println!("[agent] {} candidates considered, committing now", proposals)
        }
        DeliberationEvent::NotationRejected { attempt, error } => {
            println!("[agent] attempt {} rejected: {}", attempt, error)
        }
        DeliberationEvent::Committed {
            move_text,
            reasoning,
        } => println!("[agent] plays {}: {}", move_text, reasoning),
        DeliberationEvent::Failed { error } => println!("[agent] turn failed: {}", error),
    }
}

async fn agent_turn(engine: &DeliberationEngine, session: &mut GameSession) {
    match request_agent_move_observed(engine, session, print_event).await {
        Ok(mv) => {
            tracing::debug!(uci = %mv.uci, iterations = mv.iterations, "agent move applied");
        }
        Err(e) => {
            println!("Agent could not move ({}). Type `retry` to ask again.", e);
        }
    }
}

fn print_status(session: &GameSession) {
    println!("{}", board_diagram(&session.game));
    let moves = session.game.move_text();
    if !moves.is_empty() {
        println!("Moves: {}", moves);
    }
    if let Some(result) = session.game.result() {
        println!("Game over: {}", result);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let components = create_agent_components(&cfg).context("Failed to build agent")?;
    let mut session = GameSession::new(components.agent_color);


    println!("Gambit console. You play {}.", gambit::chess::color_name(!components.agent_color));
    if session.is_agent_turn() {
        agent_turn(&components.engine, &mut session).await;
    }
    print_status(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "board" => print_status(&session),
            "moves" => println!("Legal: {}", session.game.legal_moves_uci().join(" ")),
            "reset" => {
                session.reset();
                if session.is_agent_turn() {
                    agent_turn(&components.engine, &mut session).await;
                }
                print_status(&session);
            }
            "retry" => {
                agent_turn(&components.engine, &mut session).await;
                print_status(&session);
            }
            san => match session.apply_human_san(san) {
                Ok(()) => {
                    if session.is_agent_turn() && !session.game.is_game_over() {
                        agent_turn(&components.engine, &mut session).await;
                    }
                    print_status(&session);
                }
                Err(AgentError::Notation(e)) => println!("{}", e),
                Err(e) => println!("Cannot move: {}", e),
            },
        }
    }

    Ok(())
}
