//! netquiz-core: Scoring engine, session state machine and integrity monitor.
//!
//! This crate defines the question model, the heuristic code scorer, the
//! session controller with its persistence, and the notification contract
//! that the rest of netquiz builds on.

pub mod clock;
pub mod codec;
pub mod error;
pub mod integrity;
pub mod model;
pub mod notifier;
pub mod parser;
pub mod ratelimit;
pub mod results;
pub mod scoring;
pub mod session;
pub mod store;
pub mod traits;
