pub mod ai;
pub mod api;
pub mod app;
pub mod categories;
pub mod config;
pub mod db;
pub mod domain;
pub mod infrastructure;
pub mod integrations;
pub mod tasks;
pub mod web_content;
