pub mod config;
pub mod content;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod import;
pub mod paths;
pub mod search;
pub mod services;
pub mod session;
pub mod state;
pub mod study;
pub mod validation;

#[cfg(test)]
pub mod testing;
