//! End-to-end lifecycle scenarios driven through the public service API
//! with the in-memory storage backend.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use secret_santa_core::{
    command::{Command, CommandReply, dispatch},
    config::AppConfig,
    dao::{
        memory::MemoryStore,
        models::GameEntity,
        storage::GameStore,
    },
    error::ServiceError,
    services::{draw, game_service, purge_service},
    state::{
        AppState, SharedState,
        lifecycle::{GameStage, TransitionError},
    },
};

const ORGANIZER: i64 = 100;
const STRANGER: i64 = 200;

/// Fresh state with an installed in-memory backend; the store handle is
/// returned so tests can seed records directly.
async fn setup() -> (SharedState, MemoryStore) {
    let state = AppState::new(AppConfig::default());
    let store = MemoryStore::new();
    state.install_store(Arc::new(store.clone())).await;
    (state, store)
}

async fn create_with_roster(state: &SharedState, names: &[&str]) -> String {
    let created = game_service::create_game(state, ORGANIZER).await.unwrap();
    for name in names {
        game_service::join_game(state, &created.code, name)
            .await
            .unwrap();
    }
    created.code
}

#[tokio::test]
async fn full_happy_path_create_join_lock_draw_export() {
    let (state, _) = setup().await;

    let created = game_service::create_game(&state, ORGANIZER).await.unwrap();
    assert!(created.expires_at.is_some());

    for (i, name) in ["Ann", "Bo", "Cid"].iter().enumerate() {
        let count = game_service::join_game(&state, &created.code, name)
            .await
            .unwrap();
        assert_eq!(count, i + 1);
    }

    let roster = game_service::lock_game(&state, &created.code, ORGANIZER)
        .await
        .unwrap();
    assert_eq!(roster, vec!["Ann", "Bo", "Cid"]);

    let assignment = game_service::draw_game(&state, &created.code, ORGANIZER)
        .await
        .unwrap();
    assert_eq!(assignment.len(), 3);
    assert!(draw::verify_properties(&assignment).all_hold());

    let exported = game_service::export_results(&state, &created.code, ORGANIZER)
        .await
        .unwrap();
    assert_eq!(exported.len(), 3);
    for (giver, receiver) in &assignment {
        assert_eq!(exported.get(giver), Some(receiver));
    }

    let info = game_service::game_info(&state, &created.code).await.unwrap();
    assert_eq!(info.stage, GameStage::Drawn);
    assert_eq!(info.participant_count, 3);
    assert_eq!(info.assignment_count, 3);
}

#[tokio::test]
async fn codes_are_matched_case_insensitively() {
    let (state, _) = setup().await;
    let code = create_with_roster(&state, &[]).await;

    let lowered = code.to_lowercase();
    let count = game_service::join_game(&state, &lowered, "Ann")
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn fresh_games_are_open_and_lock_requires_three_participants() {
    let (state, store) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo"]).await;

    let game = store.find_game(code.clone()).await.unwrap().unwrap();
    assert_eq!(game.stage, GameStage::Open);

    let err = game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::InsufficientParticipants { got: 2 })
    ));

    game_service::join_game(&state, &code, "Cid").await.unwrap();
    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    let game = store.find_game(code.clone()).await.unwrap().unwrap();
    assert_eq!(game.stage, GameStage::Locked);
}

#[tokio::test]
async fn joining_a_locked_game_fails() {
    let (state, _) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;
    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    let err = game_service::join_game(&state, &code, "Dot")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::GameLocked)
    ));
}

#[tokio::test]
async fn duplicate_names_within_a_game_are_rejected() {
    let (state, _) = setup().await;
    let code = create_with_roster(&state, &["Ann"]).await;

    let err = game_service::join_game(&state, &code, "Ann")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::DuplicateName(name)) if name == "Ann"
    ));
}

#[tokio::test]
async fn draw_requires_lock_and_happens_once() {
    let (state, _) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;

    let err = game_service::draw_game(&state, &code, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::NotLocked)
    ));

    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    game_service::draw_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    let err = game_service::draw_game(&state, &code, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::AlreadyDrawn)
    ));
}

#[tokio::test]
async fn unlock_reopens_before_draw_but_never_after() {
    let (state, store) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;

    let err = game_service::unlock_game(&state, &code, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::AlreadyOpen)
    ));

    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    game_service::unlock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    let game = store.find_game(code.clone()).await.unwrap().unwrap();
    assert_eq!(game.stage, GameStage::Open);

    // Late joiner while reopened, then lock and draw.
    game_service::join_game(&state, &code, "Dot").await.unwrap();
    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    game_service::draw_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    let err = game_service::unlock_game(&state, &code, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::CannotUnlockAfterDraw)
    ));
}

#[tokio::test]
async fn export_before_draw_fails() {
    let (state, _) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;

    let err = game_service::export_results(&state, &code, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::NotDrawnYet)
    ));
}

#[tokio::test]
async fn redraw_replaces_results_and_stays_drawn() {
    let (state, store) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid", "Dot"]).await;
    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    game_service::draw_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    let redrawn = game_service::redraw_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    assert_eq!(redrawn.len(), 4);
    assert!(draw::verify_properties(&redrawn).all_hold());

    let game = store.find_game(code.clone()).await.unwrap().unwrap();
    assert_eq!(game.stage, GameStage::Drawn);
    assert_eq!(store.list_assignments(code).await.unwrap().len(), 4);
}

#[tokio::test]
async fn redraw_from_locked_acts_as_first_draw() {
    let (state, _) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;
    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    let assignment = game_service::redraw_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    assert!(draw::verify_properties(&assignment).all_hold());
}

#[tokio::test]
async fn guarded_transitions_reject_non_creators_without_state_change() {
    let (state, store) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;

    let err = game_service::lock_game(&state, &code, STRANGER)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transition(TransitionError::PermissionDenied)
    ));
    let game = store.find_game(code.clone()).await.unwrap().unwrap();
    assert_eq!(game.stage, GameStage::Open);
    assert_eq!(game.version, 0);

    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    for result in [
        game_service::draw_game(&state, &code, STRANGER).await.err(),
        game_service::unlock_game(&state, &code, STRANGER)
            .await
            .err(),
        game_service::delete_game(&state, &code, STRANGER)
            .await
            .err(),
    ] {
        assert!(matches!(
            result,
            Some(ServiceError::Transition(TransitionError::PermissionDenied))
        ));
    }
    assert!(store.find_game(code).await.unwrap().is_some());
}

#[tokio::test]
async fn unknown_codes_surface_not_found() {
    let (state, _) = setup().await;
    let err = game_service::join_game(&state, "SANTA99", "Ann")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::GameNotFound(code) if code == "SANTA99"));
}

#[tokio::test]
async fn delete_removes_the_game_and_everything_it_owns() {
    let (state, store) = setup().await;
    let code = create_with_roster(&state, &["Ann", "Bo", "Cid"]).await;
    game_service::lock_game(&state, &code, ORGANIZER)
        .await
        .unwrap();
    game_service::draw_game(&state, &code, ORGANIZER)
        .await
        .unwrap();

    assert!(game_service::delete_game(&state, &code, ORGANIZER)
        .await
        .unwrap());
    assert!(store.find_game(code.clone()).await.unwrap().is_none());
    assert!(matches!(
        game_service::game_info(&state, &code).await.unwrap_err(),
        ServiceError::GameNotFound(_)
    ));
}

#[tokio::test]
async fn purge_sweep_removes_only_expired_games() {
    let (state, store) = setup().await;
    let now = OffsetDateTime::now_utc();

    let expired = GameEntity::new("SANTAAA".into(), ORGANIZER, now, Some(now - Duration::days(1)));
    let alive = GameEntity::new("SANTABB".into(), ORGANIZER, now, Some(now + Duration::days(5)));
    let eternal = GameEntity::new("SANTACC".into(), ORGANIZER, now, None);
    for game in [expired, alive, eternal] {
        store.insert_game(game).await.unwrap();
    }

    let purged = purge_service::run_purge_sweep(&state, now).await.unwrap();
    assert_eq!(purged, 1);

    assert!(store.find_game("SANTAAA".into()).await.unwrap().is_none());
    let alive = store.find_game("SANTABB".into()).await.unwrap().unwrap();
    assert_eq!(alive.version, 0);
    assert!(store.find_game("SANTACC".into()).await.unwrap().is_some());

    // Idempotent: a second sweep has nothing left to do.
    let purged = purge_service::run_purge_sweep(&state, now).await.unwrap();
    assert_eq!(purged, 0);
}

#[tokio::test]
async fn operations_fail_cleanly_in_degraded_mode() {
    let state = AppState::new(AppConfig::default());
    let err = game_service::create_game(&state, ORGANIZER)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
}

#[tokio::test]
async fn commands_dispatch_to_the_matching_operations() {
    let (state, _) = setup().await;

    let reply = dispatch(&state, Command::Create { creator: ORGANIZER })
        .await
        .unwrap();
    let CommandReply::Created(created) = reply else {
        panic!("expected Created reply");
    };

    for name in ["Ann", "Bo", "Cid"] {
        let reply = dispatch(
            &state,
            Command::Join {
                code: created.code.clone(),
                name: name.into(),
            },
        )
        .await
        .unwrap();
        assert!(matches!(reply, CommandReply::Joined { .. }));
    }

    let reply = dispatch(
        &state,
        Command::Lock {
            code: created.code.clone(),
            caller: ORGANIZER,
        },
    )
    .await
    .unwrap();
    assert!(matches!(reply, CommandReply::Locked { participants } if participants.len() == 3));

    let reply = dispatch(
        &state,
        Command::Draw {
            code: created.code.clone(),
            caller: ORGANIZER,
        },
    )
    .await
    .unwrap();
    let CommandReply::Drawn { assignment } = reply else {
        panic!("expected Drawn reply");
    };
    assert!(draw::verify_properties(&assignment).all_hold());

    let reply = dispatch(
        &state,
        Command::Info {
            code: created.code.clone(),
        },
    )
    .await
    .unwrap();
    let CommandReply::Info(info) = reply else {
        panic!("expected Info reply");
    };
    assert_eq!(info.stage, GameStage::Drawn);

    let reply = dispatch(&state, Command::PurgeSweep).await.unwrap();
    assert!(matches!(reply, CommandReply::Purged { count: 0 }));
}
