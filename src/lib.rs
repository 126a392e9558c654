//! Workspace façade crate.
//!
//! Exposes feature flags that map onto the individual workspace crates so a
//! host application can depend on `nestedbird-workspace` alone. The default
//! `desktop-shims` feature pulls in the full [`core_service`] application
//! context with the native bridge implementations.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

#[cfg(feature = "router-only")]
pub use core_router as router;

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
