//! Database-backed catalog tests. Each test gets its own throwaway
//! database with the migrations applied.

use std::time::Duration;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, State};
use axum::http::{header, Request};
use sqlx::PgPool;
use uuid::Uuid;

use parfum_api_rust::handlers::brands;
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

const BOUNDARY: &str = "------------------------test";

/// Build a text-only multipart form carrying a single name field.
async fn form_with_name(name: &str) -> Multipart {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n--{b}--\r\n",
        b = BOUNDARY,
        name = name,
    );
    let request = Request::builder()
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    Multipart::from_request(request, &()).await.unwrap()
}

#[sqlx::test]
async fn duplicate_brand_name_reports_a_conflict(pool: PgPool) {
    let state = test_state(pool);

    let form = form_with_name("Chanel").await;
    brands::create(admin(), State(state.clone()), form)
        .await
        .expect("first create succeeds");

    let form = form_with_name("Chanel").await;
    let err = brands::create(admin(), State(state), form)
        .await
        .expect_err("second create with the same name must fail");

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error_code(), "CONFLICT");
    assert_eq!(err.message(), "brand name or slug already exists");
}

#[sqlx::test]
async fn distinct_names_colliding_on_slug_also_conflict(pool: PgPool) {
    let state = test_state(pool);

    let form = form_with_name("Tom Ford").await;
    brands::create(admin(), State(state.clone()), form)
        .await
        .expect("first create succeeds");

    // Different display name, same derived slug.
    let form = form_with_name("tom_ford").await;
    let err = brands::create(admin(), State(state), form)
        .await
        .expect_err("slug collision must fail");

    assert_eq!(err.error_code(), "CONFLICT");
}

#[sqlx::test]
async fn delete_succeeds_when_the_image_file_is_already_gone(pool: PgPool) {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO brands (id, name, slug, image_url) \
         VALUES ($1, 'Dior', 'dior', '/public/uploads/already-gone.png')",
    )
    .bind(id)
    .execute(&pool)
    .await
    .unwrap();

    let state = test_state(pool.clone());
    brands::remove(admin(), State(state), Path(id))
        .await
        .expect("row deletion is the operation of record");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brands")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[sqlx::test]
async fn deleting_an_unknown_brand_is_not_found(pool: PgPool) {
    let state = test_state(pool);

    let err = brands::remove(admin(), State(state), Path(Uuid::new_v4()))
        .await
        .expect_err("nothing to delete");

    assert_eq!(err.status_code(), 404);
}
