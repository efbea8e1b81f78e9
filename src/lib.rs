//! DISMI - intent decomposition and failure recovery for SDN services
//!
//! This library turns declarative service requests into low-level network
//! intents, tracks their lifecycle per service, and recomputes paths when
//! the topology fails under them.

pub mod abstraction;
pub mod action;
pub mod config;
pub mod constraint;
pub mod decomposer;
pub mod endpoint;
pub mod intent;
pub mod logging;
pub mod recovery;
pub mod state;
pub mod store;
pub mod topology;
