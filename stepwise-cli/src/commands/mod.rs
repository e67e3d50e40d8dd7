//! Subcommand handlers

pub mod config;
pub mod init;
pub mod lang;
