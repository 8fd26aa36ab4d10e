//! Testing utilities and mocks for integration tests
//!
//! Provides mock implementations and test helpers for:
//! - MockTradeSink: Programmable price engine
//! - Test data builders (configs, transactions, state)

pub mod helpers;
pub mod mock_sink;

pub use helpers::*;
pub use mock_sink::{MockTradeSink, SinkBehavior};
