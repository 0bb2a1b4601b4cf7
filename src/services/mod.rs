//! Application services.
//!
//! Logic shared by the HTTP handlers and the CLI.

pub mod backup;
