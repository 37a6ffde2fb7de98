//! Integration tests for dialogue arbitration
//!
//! These run a full game against the mock backend and check:
//! - Only one dialogue request is ever in flight
//! - Self-initiated lines retry, then fall back to a canned line
//! - Results that land after a restart are thrown away

use std::sync::Arc;

use shroom::core::config::GameConfig;
use shroom::core::types::ManualClock;
use shroom::entity::evolution::Mode;
use shroom::llm::dialogue::DialogueOutcome;
use shroom::llm::lines::{self, Reaction};
use shroom::llm::mock::MockBackend;
use shroom::simulation::conversation::Trigger;
use shroom::simulation::game::{Game, GameOptions};
use shroom::storage::MemoryStore;

fn game_with(mock: Arc<MockBackend>) -> Game {
    Game::new(
        GameConfig::default(),
        mock,
        Box::new(MemoryStore::new()),
        Arc::new(ManualClock::new(5_000_000)),
        GameOptions::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_requests_make_one_call() {
    let mock = Arc::new(MockBackend::with_latency(3, 400..401));
    let game = game_with(mock.clone());

    let first = game.spawn_initiation(Trigger::Boredom);
    let second = game.spawn_chat("hello?").unwrap();

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert!(first.line().is_some());
    assert_eq!(second, DialogueOutcome::Busy);
    assert_eq!(mock.calls(), 1);
    assert!(!game.snapshot().is_conversing);
}

#[tokio::test(start_paused = true)]
async fn test_failing_backend_retries_then_falls_back() {
    let mock = Arc::new(MockBackend::instant(3));
    mock.set_always_fail(true);
    let game = game_with(mock.clone());
    let retries = game.config().dialogue.max_retries as usize;

    let outcome = game.spawn_initiation(Trigger::Thirst).await.unwrap();

    assert_eq!(mock.calls(), retries + 1);
    let line = outcome.line().expect("fallback line");
    assert!(line.fallback);
    assert!(lines::trigger_pool(Trigger::Thirst, Mode::Normal).contains(&line.text.as_str()));

    let snap = game.snapshot();
    assert!(!snap.is_conversing);
    assert_eq!(snap.last_mushroom_message.as_deref(), Some(line.text.as_str()));
}

#[tokio::test(start_paused = true)]
async fn test_chat_failure_does_not_retry() {
    let mock = Arc::new(MockBackend::instant(3));
    mock.set_always_fail(true);
    let game = game_with(mock.clone());

    let outcome = game.spawn_chat("are you there").unwrap().await.unwrap();
    assert_eq!(outcome.line().unwrap().text, lines::CHAT_FALLBACK);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_discards_in_flight_line() {
    let mock = Arc::new(MockBackend::with_latency(3, 800..801));
    let mut game = game_with(mock.clone());

    let pending = game.spawn_chat("tell me a secret").unwrap();
    tokio::task::yield_now().await;
    assert!(game.snapshot().is_conversing);

    game.restart();
    assert_eq!(pending.await.unwrap(), DialogueOutcome::Stale);

    let snap = game.snapshot();
    assert!(!snap.is_conversing);
    assert_eq!(snap.last_mushroom_message_id, 0);

    // The slot is free again for the new life
    let outcome = game.spawn_chat("hi again").unwrap().await.unwrap();
    assert!(outcome.line().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_reaction_waits_out_a_running_turn() {
    let mock = Arc::new(MockBackend::with_latency(3, 1_500..1_501));
    let game = game_with(mock.clone());

    let chat = game.spawn_chat("hi").unwrap();
    tokio::task::yield_now().await;
    let reaction = game.spawn_reaction(Reaction::Misted);

    assert!(chat.await.unwrap().line().is_some());
    assert!(reaction.await.unwrap().line().is_some());
    assert_eq!(mock.calls(), 2);
}
