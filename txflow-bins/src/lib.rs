//! Shared code for the txflow binaries

pub mod common;
