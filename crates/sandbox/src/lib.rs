//! Scripted runs of the order workflow against seeded in-memory
//! collaborators, with structured logging and Prometheus metrics.

pub mod config;
pub mod error;
pub mod scenarios;
pub mod world;

pub use config::{Config, LogFormat};
pub use error::{Result, SandboxError};
pub use scenarios::{ScenarioOutcome, run_all};
pub use world::{SandboxCoordinator, World, create_coordinator, load_catalog};
