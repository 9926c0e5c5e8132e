pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod identity;
pub mod model;
pub mod routes;
pub mod state;
pub mod store;
