//! 审议回合集成测试：只通过公开 API 驱动引擎与会话

use std::sync::Arc;

use gambit::chess::GameState;
use gambit::core::{AgentError, GameSession, NotationError};
use gambit::deliberation::{
    CandidateMove, Decision, DeliberationEngine, DeliberationEvent, DeliberationLimits,
    NotationPolicy, ScriptedDecisions, ScriptedProposals,
};
use gambit::llm::MockLlmClient;
use gambit::memory::{MemoryStore, MoveRecord};
use gambit::request_agent_move;
use gambit::deliberation::PromptTemplates;
use shakmaty::Color;
use tokio::sync::mpsc;

fn after_e4() -> GameSession {
    let mut session = GameSession::new(Color::Black);
    session.apply_human_san("e4").unwrap();
    session
}

#[tokio::test]
async fn test_forced_commit_after_three_candidates() {
    let decider = Arc::new(ScriptedDecisions::always(Decision::consider_new("keep looking")));
    let proposer = Arc::new(ScriptedProposals::new(
        vec![
            CandidateMove::new("e5", "symmetry"),
            CandidateMove::new("c5", "sicilian"),
            CandidateMove::new("e6", "french"),
        ],
        vec![CandidateMove::new("c5", "sharpest option")],
    ));
    let engine = DeliberationEngine::new(decider.clone(), proposer.clone());

    let mut session = after_e4();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mv = request_agent_move(&engine, &mut session, Some(&tx)).await.unwrap();

    assert_eq!(mv.uci, "c7c5");
    assert_eq!(mv.proposals, 3);
    assert_eq!(decider.call_count(), 4);
    assert_eq!(proposer.consider_count(), 3);
    assert_eq!(proposer.commit_count(), 1);
    assert_eq!(session.memory.analysis_len(), 0);

    // 定稿时看到全部三个候选
    let commit_input = &proposer.commit_inputs()[0];
    for m in ["e5", "c5", "e6"] {
        assert!(commit_input.considered_moves.contains(&format!("- Move: {}", m)));
    }

    drop(tx);
    let mut forced = false;
    while let Some(ev) = rx.recv().await {
        if matches!(ev, DeliberationEvent::ForcedCommit { proposals: 3 }) {
            forced = true;
        }
    }
    assert!(forced);
}

#[tokio::test]
async fn test_game_memory_window_in_later_turns() {
    let decider = Arc::new(ScriptedDecisions::always(Decision::commit("fine")));
    let proposer = Arc::new(ScriptedProposals::new(
        Vec::new(),
        vec![CandidateMove::new("Nf6", "develop")],
    ));
    let engine = DeliberationEngine::new(decider.clone(), proposer);

    let mut session = after_e4();
    for (i, m) in ["m1", "m2", "m3", "m4", "m5"].iter().enumerate() {
        session
            .memory
            .append_game_move(MoveRecord::new(*m, format!("r{}", i + 1)));
    }
    request_agent_move(&engine, &mut session, None).await.unwrap();

    let seen = &decider.inputs()[0].game_memory;
    assert!(!seen.contains("m2"));
    assert!(seen.contains("m3") && seen.contains("m4") && seen.contains("m5"));
    assert_eq!(session.memory.game_len(), 6);
}

#[tokio::test]
async fn test_iteration_cap_aborts_turn_without_side_effects() {
    let decider = Arc::new(ScriptedDecisions::always(Decision::consider_new("more")));
    let proposer = Arc::new(ScriptedProposals::repeating(CandidateMove::new("e5", "x")));
    let engine = DeliberationEngine::new(decider.clone(), proposer.clone()).with_limits(
        DeliberationLimits {
            max_proposals: 10,
            hard_iteration_cap: 2,
            recent_moves_window: 3,
        },
    );

    let mut session = after_e4();
    let fen = session.game.fen();
    let err = request_agent_move(&engine, &mut session, None).await.unwrap_err();

    assert!(matches!(err, AgentError::TurnBudgetExceeded { iterations: 2 }));
    assert_eq!(decider.call_count(), 2);
    assert_eq!(proposer.commit_count(), 0);
    assert_eq!(session.game.fen(), fen);
    assert_eq!(session.memory.game_len(), 0);
    assert_eq!(session.memory.analysis_len(), 0);
}

#[tokio::test]
async fn test_ambiguous_commit_is_reported() {
    let engine = DeliberationEngine::new(
        Arc::new(ScriptedDecisions::always(Decision::commit("go"))),
        Arc::new(ScriptedProposals::repeating(CandidateMove::new("Nd2", "x"))),
    );
    let game = GameState::from_fen("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1").unwrap();
    let mut memory = MemoryStore::new();
    let err = engine.decide_turn(&game, &mut memory, None).await.unwrap_err();
    assert!(matches!(
        err,
        AgentError::Notation(NotationError::AmbiguousMove(ref t)) if t == "Nd2"
    ));
    assert_eq!(memory.game_len(), 0);
}

#[tokio::test]
async fn test_retry_with_feedback_recovers() {
    let proposer = Arc::new(ScriptedProposals::new(
        Vec::new(),
        vec![
            CandidateMove::new("1... e5", "numbered"),
            CandidateMove::new("e5", "clean"),
        ],
    ));
    let engine = DeliberationEngine::new(
        Arc::new(ScriptedDecisions::always(Decision::commit("go"))),
        proposer.clone(),
    )
    .with_notation_policy(NotationPolicy::RetryWithFeedback { max_attempts: 2 });

    let mut session = after_e4();
    let mv = request_agent_move(&engine, &mut session, None).await.unwrap();
    assert_eq!(mv.san, "e5");

    let inputs = proposer.commit_inputs();
    assert_eq!(inputs.len(), 2);
    assert!(inputs[0].error_hint.is_none());
    assert_eq!(
        inputs[1].error_hint.as_deref(),
        Some("Invalid move notation: '1... e5'")
    );
}

#[tokio::test]
async fn test_mock_llm_plays_a_full_turn() {
    let engine = DeliberationEngine::from_llm(Arc::new(MockLlmClient), PromptTemplates::default());
    let mut session = after_e4();
    let mv = request_agent_move(&engine, &mut session, None).await.unwrap();
    assert_eq!(session.game.history().len(), 2);
    assert_eq!(session.memory.game_moves()[0].move_text, mv.san);
    assert!(!session.is_agent_turn());
}
