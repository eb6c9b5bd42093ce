pub mod api;
pub mod app;
pub mod board;
pub mod config;
pub mod drag;
pub mod error;
pub mod form;
pub mod logger;
pub mod models;
pub mod repository;
pub mod seed;
pub mod session;
pub mod summary;
pub mod ui;
pub mod validation;
