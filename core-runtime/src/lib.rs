//! # Core Runtime Module
//!
//! Ambient infrastructure shared by the router, entity layer and player:
//! - Logging and tracing setup
//! - Configuration and host bridge wiring
//! - Event bus
//! - Reactive state cells
//!
//! Other crates depend on this one for their logging conventions, their
//! configuration and the channels through which they publish state.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod state;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
pub use state::StateCell;
