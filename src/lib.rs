// src/lib.rs
// Library interface for ct-audit
pub mod audit;
pub mod cert_parser;
pub mod certificate;
pub mod checks;
pub mod cli;
pub mod config;
pub mod database;
pub mod output;
pub mod types;
