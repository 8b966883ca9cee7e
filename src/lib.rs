pub mod app;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod dom;
pub mod handler;
pub mod page;
pub mod payload;
pub mod ui;
pub mod utils;
