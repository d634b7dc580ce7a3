mod support;

use memory_match_client::{Difficulty, Error, FlipOutcome, GameEvent, IgnoreReason};
use support::{FakeService, advance, completions, drain, started};
use tokio_test::{assert_err, assert_ok};

const ALL_BUT_H: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

#[tokio::test(start_paused = true)]
async fn last_match_completes_without_waiting_for_a_poll() {
    let fake = FakeService::scenario();
    fake.prematch(&ALL_BUT_H);
    let (game, mut events) = started(&fake).await;

    game.flip(14).await;
    assert_eq!(game.flip(15).await, FlipOutcome::Matched { completed: true });

    advance(499).await;
    assert!(game.summary().await.is_none());
    assert_eq!(completions(&drain(&mut events)), 0);

    advance(2).await;
    let summary = game.summary().await.expect("game should be over");
    assert_eq!(summary.matched_pairs, 8);
    assert_eq!(summary.attempts, 8);
    assert_eq!(
        Some(summary.score),
        fake.server_snapshot().unwrap().final_score()
    );
    assert!(summary.score > 0);
    assert_eq!(completions(&drain(&mut events)), 1);
    assert!(!game.is_polling().await);

    let fetches = fake.counters().fetches;
    advance(5000).await;
    assert_eq!(completions(&drain(&mut events)), 0);
    assert_eq!(fake.counters().fetches, fetches);
}

#[tokio::test(start_paused = true)]
async fn poll_detects_completion_from_elsewhere_exactly_once() {
    let fake = FakeService::scenario();
    let (game, mut events) = started(&fake).await;

    fake.complete_externally();
    advance(999).await;
    assert!(game.summary().await.is_none());

    advance(2).await;
    let seen = drain(&mut events);
    assert_eq!(completions(&seen), 1);
    assert!(game.board().await.unwrap().completed);
    assert!(!game.is_polling().await);

    advance(3000).await;
    assert_eq!(completions(&drain(&mut events)), 0);
    assert_eq!(
        game.flip(0).await,
        FlipOutcome::Ignored(IgnoreReason::Completed)
    );
}

#[tokio::test(start_paused = true)]
async fn refresh_after_flip_reports_completion_from_elsewhere() {
    let fake = FakeService::scenario();
    let (game, mut events) = started(&fake).await;

    assert_eq!(game.flip(2).await, FlipOutcome::Revealed);
    fake.complete_externally();

    advance(10).await;
    assert_eq!(completions(&drain(&mut events)), 1);
    let summary = game.summary().await.expect("game should be over");
    assert_eq!(summary.matched_pairs, 8);
    assert!(!game.is_polling().await);

    let fetches = fake.counters().fetches;
    advance(5000).await;
    assert_eq!(completions(&drain(&mut events)), 0);
    assert_eq!(fake.counters().fetches, fetches);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_after_flip_completion_does_not_fire_again() {
    let fake = FakeService::scenario();
    fake.prematch(&ALL_BUT_H);
    let (game, mut events) = started(&fake).await;

    advance(990).await;
    game.flip(14).await;
    game.flip(15).await;

    advance(3000).await;
    assert_eq!(completions(&drain(&mut events)), 1);
    assert!(game.summary().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn score_can_be_saved_once() {
    let fake = FakeService::scenario();
    let (game, mut events) = started(&fake).await;

    assert!(matches!(game.save_score().await, Err(Error::NotCompleted)));

    fake.complete_externally();
    advance(1001).await;

    assert!(game.save_score().await.unwrap());
    assert!(!game.save_score().await.unwrap());
    assert_eq!(fake.counters().saves, 1);

    let saved = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, GameEvent::ScoreSaved { .. }))
        .count();
    assert_eq!(saved, 1);

    let table = game.high_scores(Difficulty::Normal).await.unwrap();
    assert_eq!(table.high_scores.len(), 1);
    assert_eq!(table.high_scores[0].player_name, "Ada");
}

#[tokio::test(start_paused = true)]
async fn failed_save_can_be_retried() {
    let fake = FakeService::scenario();
    let (game, _events) = started(&fake).await;

    fake.complete_externally();
    advance(1001).await;

    fake.fail_next_saves(1);
    assert_err!(game.save_score().await);
    assert!(assert_ok!(game.save_score().await));
    assert_eq!(fake.counters().saves, 1);
}

#[tokio::test(start_paused = true)]
async fn restart_discards_the_game_and_stops_polling() {
    let fake = FakeService::scenario();
    let (game, mut events) = started(&fake).await;

    fake.complete_externally();
    advance(1001).await;
    drain(&mut events);

    assert!(game.restart().await);
    assert!(!game.is_active().await);
    assert!(game.board().await.is_none());
    assert_eq!(drain(&mut events), vec![GameEvent::ReturnedToSetup]);
    assert!(!game.restart().await);
    assert!(matches!(game.save_score().await, Err(Error::NotCompleted)));
}

#[tokio::test(start_paused = true)]
async fn completed_game_on_load_goes_straight_to_summary() {
    let fake = FakeService::scenario();
    fake.complete_externally();
    let (game, mut events) = started(&fake).await;

    assert_eq!(completions(&drain(&mut events)), 1);
    assert!(!game.is_polling().await);

    let fetches = fake.counters().fetches;
    advance(3000).await;
    assert_eq!(fake.counters().fetches, fetches);
}
