//! Scent-pyramid replacement tests against a real database, covering the
//! all-or-nothing transaction semantics.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use parfum_api_rust::handlers::parfum_notes::{replace_pyramid, PyramidRequest};
use parfum_api_rust::middleware::{AuthUser, SlidingWindowLimiter};
use parfum_api_rust::state::AppState;

fn test_state(pool: PgPool) -> AppState {
    AppState::new(pool, SlidingWindowLimiter::new(10, Duration::from_secs(900)))
}

fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: "admin@example.com".to_string(),
    }
}

async fn seed_parfum(pool: &PgPool, name: &str, slug: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO parfum (id, name, slug, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn seed_note(pool: &PgPool, name: &str, slug: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO notes (id, name, slug) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn pyramid_rows(pool: &PgPool, parfum_id: Uuid) -> Vec<(Uuid, String)> {
    sqlx::query_as(
        "SELECT note_id, note_type FROM parfum_notes WHERE parfum_id = $1 ORDER BY note_type",
    )
    .bind(parfum_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[sqlx::test]
async fn replaces_the_whole_pyramid(pool: PgPool) {
    let parfum_id = seed_parfum(&pool, "Santal 33", "santal-33").await;
    let bergamot = seed_note(&pool, "Bergamot", "bergamot").await;
    let musk = seed_note(&pool, "Musk", "musk").await;

    let state = test_state(pool.clone());

    let request = PyramidRequest {
        top: vec![bergamot],
        ..Default::default()
    };
    replace_pyramid(admin(), State(state.clone()), Path(parfum_id), Json(request))
        .await
        .expect("initial pyramid");

    let request = PyramidRequest {
        base: vec![musk],
        ..Default::default()
    };
    replace_pyramid(admin(), State(state), Path(parfum_id), Json(request))
        .await
        .expect("replacement");

    // The old TOP row is gone; only the new BASE row remains.
    let rows = pyramid_rows(&pool, parfum_id).await;
    assert_eq!(rows, vec![(musk, "BASE".to_string())]);
}

#[sqlx::test]
async fn invalid_note_id_leaves_the_prior_pyramid_untouched(pool: PgPool) {
    let parfum_id = seed_parfum(&pool, "Santal 33", "santal-33").await;
    let bergamot = seed_note(&pool, "Bergamot", "bergamot").await;

    let state = test_state(pool.clone());

    let request = PyramidRequest {
        top: vec![bergamot],
        ..Default::default()
    };
    replace_pyramid(admin(), State(state.clone()), Path(parfum_id), Json(request))
        .await
        .expect("initial pyramid");

    // One known note and one that does not exist: the whole replacement
    // must roll back, not partially apply.
    let request = PyramidRequest {
        top: vec![bergamot],
        middle: vec![Uuid::new_v4()],
        ..Default::default()
    };
    let err = replace_pyramid(admin(), State(state), Path(parfum_id), Json(request))
        .await
        .expect_err("unknown note id must fail");

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "one or more note ids do not exist");

    let rows = pyramid_rows(&pool, parfum_id).await;
    assert_eq!(rows, vec![(bergamot, "TOP".to_string())]);
}

#[sqlx::test]
async fn emptying_every_bucket_clears_the_pyramid(pool: PgPool) {
    let parfum_id = seed_parfum(&pool, "Santal 33", "santal-33").await;
    let bergamot = seed_note(&pool, "Bergamot", "bergamot").await;

    let state = test_state(pool.clone());

    let request = PyramidRequest {
        top: vec![bergamot],
        ..Default::default()
    };
    replace_pyramid(admin(), State(state.clone()), Path(parfum_id), Json(request))
        .await
        .expect("initial pyramid");

    replace_pyramid(
        admin(),
        State(state),
        Path(parfum_id),
        Json(PyramidRequest::default()),
    )
    .await
    .expect("empty replacement");

    assert!(pyramid_rows(&pool, parfum_id).await.is_empty());
}

#[sqlx::test]
async fn unknown_parfum_is_not_found(pool: PgPool) {
    let state = test_state(pool);

    let err = replace_pyramid(
        admin(),
        State(state),
        Path(Uuid::new_v4()),
        Json(PyramidRequest::default()),
    )
    .await
    .expect_err("no such parfum");

    assert_eq!(err.status_code(), 404);
    assert_eq!(err.message(), "parfum not found");
}
