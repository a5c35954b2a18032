use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::shared::AppState;
use crate::{auth, comment, post as posts, user};

/// Assembles the full route table over the given state.
///
/// Used by both the binary and the integration tests so they exercise
/// the same router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/users", get(user::list_users))
        .route("/users/:id", get(user::get_user))
        .route("/user", post(user::create_user))
        .route("/posts", get(posts::list_published_posts))
        .route("/posts/admin", get(posts::list_all_posts))
        .route("/posts/search", get(posts::search_posts))
        .route(
            "/posts/:id/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route("/post", post(posts::create_post))
        .route("/post/publish/:id", put(posts::publish_post))
        .route(
            "/post/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/me",
            get(auth::me).layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth)),
        )
        .with_state(state)
}
