// Public API - what other modules can use
pub use handlers::{
    create_post, delete_post, get_post, list_all_posts, list_published_posts, publish_post,
    search_posts, update_post,
};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
