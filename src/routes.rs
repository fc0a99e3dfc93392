use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    BoxError, Router,
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use sqlx::PgPool;
use std::time::Duration;
use tower::{buffer::BufferLayer, limit::RateLimitLayer, ServiceBuilder};
use tower_http::compression::CompressionLayer;

use crate::{api, AppState};

pub fn generate_routes(pool: PgPool, jwt_secret: &str) -> Router {
    let encoding_key = EncodingKey::from_secret(jwt_secret.as_bytes());
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());

    let state = AppState {
        pool,
        encoding_key,
        decoding_key,
    };

    Router::new()
        // ==== USERS ==== //
        .route("/api/users/login", post(api::auth::login)) // login
        .route("/api/users", post(api::auth::registration)) // register
        .route("/api/users", get(api::user::list_users)) // list users
        .route("/api/users/:id", get(api::user::get_profile)) // one profile
        .route("/api/user", get(api::user::get_current_user)) // current user
        .route("/api/user", delete(api::user::delete_current_user)) // delete own account
        // ==== QUESTIONS ==== //
        .route("/api/questions", post(api::questions::create_question))
        .route("/api/questions", get(api::questions::get_questions))
        .route(
            "/api/questions/random",
            get(api::questions::get_random_question),
        )
        .route("/api/questions/:id", get(api::questions::get_question))
        .route("/api/questions/:id", put(api::questions::update_question))
        .route(
            "/api/questions/:id",
            delete(api::questions::delete_question),
        )
        .route(
            "/api/questions/:id/status",
            put(api::questions::set_question_status),
        )
        .route(
            "/api/questions/:id/vote",
            post(api::questions::vote_question),
        )
        // ==== ANSWERS ==== //
        .route(
            "/api/questions/:id/answers",
            post(api::answers::create_answer),
        )
        .route("/api/questions/:id/answers", get(api::answers::get_answers))
        .route(
            "/api/questions/:id/answers/curated",
            get(api::answers::get_curated_answer),
        )
        .route("/api/answers/:id", put(api::answers::update_answer))
        .route("/api/answers/:id", delete(api::answers::delete_answer))
        .route(
            "/api/answers/:id/validate",
            post(api::answers::validate_answer),
        )
        .route("/api/answers/:id/vote", post(api::answers::vote_answer))
        // ==== TAGS ==== //
        .route("/api/tags", get(api::tags::get_tags))
        .route("/api/tags", post(api::tags::create_tag))
        .route("/api/tags/:name", delete(api::tags::delete_tag))
        .fallback(handler_404)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: BoxError| async move {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Unhandled error: {}", err),
                    )
                }))
                .layer(BufferLayer::new(1024))
                .layer(RateLimitLayer::new(64, Duration::from_secs(1))),
        )
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    // Lazy pool: connects on first query, which these requests never reach.
    fn app() -> Router {
        let pool = PgPool::connect_lazy("postgres://localhost/banki_brunch").unwrap();
        generate_routes(pool, "test-secret")
    }

    #[tokio::test]
    async fn current_user_without_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn voting_without_token_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/questions/1/vote")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{ "voteType": "upvote" }"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
