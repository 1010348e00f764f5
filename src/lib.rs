// src/lib.rs

//! Extracts commit-message training samples from a directory of git repositories.
//!
//! Each repository becomes one `<name>.jsonl` file holding one sample per
//! accepted commit: the sanitized subject, the (byte-bounded) diff, the five
//! preceding commit subjects and repository metadata.

pub mod backend;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod filter;
pub mod metadata;
pub mod model;
pub mod orchestrator;
pub mod sanitize;
pub mod window;
