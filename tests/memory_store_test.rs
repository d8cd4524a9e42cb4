//! Tests for the in-memory match store.

use bulls_cows::{
    Code, GuessHistory, InMemoryMatchStore, MatchRepository, MatchStatus, Player, PlayerId,
    RepositoryError, RoomId, Secrets, evaluate,
};
use chrono::TimeDelta;

fn code(s: &str) -> Code {
    Code::parse(s).expect("Valid code")
}

#[tokio::test]
async fn test_create_match_stores_waiting_room() {
    let store = InMemoryMatchStore::default();
    let alice = Player::new("alice");
    let game = store
        .create_match(alice.clone())
        .await
        .expect("Create failed");

    assert_eq!(game.status, MatchStatus::Waiting);
    assert_eq!(game.turn_owner, alice.id);

    let loaded = store.get_all_fields(&game.room_id).await.expect("Load failed");
    assert_eq!(loaded, game);
}

#[tokio::test]
async fn test_partial_reads_see_partial_writes() {
    let store = InMemoryMatchStore::default();
    let alice = Player::new("alice");
    let bob = Player::new("bob");
    let game = store
        .create_match(alice.clone())
        .await
        .expect("Create failed");
    let room = &game.room_id;

    let mut players = game.players.clone();
    players.insert(bob.id.clone(), bob.clone());
    store
        .set_players_and_mark_full(room, &players)
        .await
        .expect("Set players failed");
    assert_eq!(store.get_players(room).await.expect("Load failed"), players);
    assert_eq!(
        store.get_status(room).await.expect("Load failed"),
        MatchStatus::FullRoom
    );

    let mut secrets = Secrets::new();
    secrets.insert(alice.id.clone(), code("0123"));
    secrets.insert(bob.id.clone(), code("4567"));
    store.set_secrets(room, &secrets).await.expect("Set secrets failed");

    let (loaded_players, loaded_secrets) = store
        .get_players_and_secrets(room)
        .await
        .expect("Load failed");
    assert_eq!(loaded_players, players);
    assert_eq!(loaded_secrets, secrets);
    assert_eq!(loaded_secrets[&alice.id].to_string(), "0123");

    store
        .set_status_and_turn(room, MatchStatus::Playing, &bob.id)
        .await
        .expect("Set status failed");
    let setup = store
        .get_players_secrets_status_turn(room)
        .await
        .expect("Load failed");
    assert_eq!(setup.status, MatchStatus::Playing);
    assert_eq!(setup.turn_owner, bob.id);
    assert_eq!(setup.secrets, secrets);
}

#[tokio::test]
async fn test_winning_history_write_finishes_match() {
    let store = InMemoryMatchStore::default();
    let alice = Player::new("alice");
    let game = store
        .create_match(alice.clone())
        .await
        .expect("Create failed");

    let mut history = GuessHistory::new();
    history
        .entry(alice.id.clone())
        .or_default()
        .push(evaluate(&code("1234"), &code("1234")));

    store
        .set_guess_history_and_turn(&game.room_id, &history, &alice.id, true)
        .await
        .expect("Write failed");

    let loaded = store.get_all_fields(&game.room_id).await.expect("Load failed");
    assert_eq!(loaded.status, MatchStatus::Finished);
    assert_eq!(loaded.guess_history, history);
}

#[tokio::test]
async fn test_restart_clears_secrets_and_history() {
    let store = InMemoryMatchStore::default();
    let alice = Player::new("alice");
    let game = store
        .create_match(alice.clone())
        .await
        .expect("Create failed");
    let room = &game.room_id;

    let mut secrets = Secrets::new();
    secrets.insert(alice.id.clone(), code("9876"));
    store.set_secrets(room, &secrets).await.expect("Write failed");
    let mut history = GuessHistory::new();
    history
        .entry(alice.id.clone())
        .or_default()
        .push(evaluate(&code("1234"), &code("9876")));
    store
        .set_guess_history_and_turn(room, &history, &alice.id, false)
        .await
        .expect("Write failed");

    store.restart(room).await.expect("Restart failed");

    let loaded = store.get_all_fields(room).await.expect("Load failed");
    assert!(loaded.secrets.is_empty());
    assert!(loaded.guess_history.is_empty());
    assert_eq!(loaded.status, MatchStatus::FullRoom);
    assert_eq!(loaded.players, game.players);
}

#[tokio::test]
async fn test_missing_room_is_not_found() {
    let store = InMemoryMatchStore::default();
    let room = RoomId::parse("Nope123").expect("Valid id");

    assert_eq!(
        store.exists(&room).await,
        Err(RepositoryError::not_found(&room))
    );
    assert!(store.get_players(&room).await.unwrap_err().is_not_found());
    assert!(store.restart(&room).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_write_to_missing_room_does_not_create_it() {
    let store = InMemoryMatchStore::default();
    let room = RoomId::parse("Nope123").expect("Valid id");

    let err = store
        .set_status_and_turn(&room, MatchStatus::Playing, &PlayerId::from("ghost"))
        .await
        .expect_err("Write to missing room succeeded");
    assert!(err.is_not_found());
    assert!(store.exists(&room).await.is_err());
}

#[tokio::test]
async fn test_expired_room_reads_as_not_found() {
    let store = InMemoryMatchStore::new(TimeDelta::zero());
    let game = store
        .create_match(Player::new("alice"))
        .await
        .expect("Create failed");

    let err = store
        .get_all_fields(&game.room_id)
        .await
        .expect_err("Expired room loaded");
    assert!(err.is_not_found());

    let err = store
        .set_secrets(&game.room_id, &Secrets::new())
        .await
        .expect_err("Write to expired room succeeded");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_purge_drops_only_expired_rooms() {
    let expired = InMemoryMatchStore::new(TimeDelta::zero());
    expired
        .create_match(Player::new("alice"))
        .await
        .expect("Create failed");
    expired
        .create_match(Player::new("bob"))
        .await
        .expect("Create failed");
    assert_eq!(expired.purge_expired().expect("Purge failed"), 2);
    assert_eq!(expired.purge_expired().expect("Purge failed"), 0);

    let live = InMemoryMatchStore::default();
    let game = live
        .create_match(Player::new("carol"))
        .await
        .expect("Create failed");
    assert_eq!(live.purge_expired().expect("Purge failed"), 0);
    assert!(live.exists(&game.room_id).await.is_ok());
}

#[tokio::test]
async fn test_clones_share_rooms() {
    let store = InMemoryMatchStore::default();
    let other = store.clone();
    let game = store
        .create_match(Player::new("alice"))
        .await
        .expect("Create failed");
    assert!(other.exists(&game.room_id).await.is_ok());
}

#[tokio::test]
async fn test_unrepresentable_expiry_fails_without_breaking_store() {
    let store = InMemoryMatchStore::new(TimeDelta::MAX);

    for username in ["alice", "bob"] {
        let err = store
            .create_match(Player::new(username))
            .await
            .expect_err("Room created with unbounded lifetime");
        assert!(matches!(err, RepositoryError::Backend { .. }), "{err}");
    }

    assert_eq!(store.purge_expired().expect("Store poisoned"), 0);
    let room = RoomId::parse("Nope123").expect("Valid id");
    assert!(store.exists(&room).await.expect_err("Phantom room").is_not_found());
}
