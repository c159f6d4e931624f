pub mod auth;
pub mod bookmarks;
pub mod categories;
pub mod health;
pub mod users;
