//! Rust library for driving vibrator HAL services that may come and go
//!
//! This library provides an async API for controlling a vibrator through a
//! hardware abstraction layer (HAL) service. The service may crash, restart or
//! drop its connection at any point; the [`HalController`] hides that from
//! callers by reconnecting on demand. It supports:
//!
//! - On/off and amplitude control
//! - External control hand-over
//! - Always-on preset effects
//! - Capability and supported-effect queries
//! - Predefined and composed effects with completion callbacks
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vibrator_hal::{ConnectorConfig, Effect, EffectStrength, RemoteHalConnector, RemoteHalController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = RemoteHalConnector::new(ConnectorConfig::new("ws://127.0.0.1:8780"))?;
//!     let controller = RemoteHalController::new(connector);
//!
//!     let capabilities = controller.get_capabilities().await?;
//!     println!("HAL capabilities: {:?}", capabilities);
//!
//!     let duration = controller
//!         .perform_effect(Effect::Click, EffectStrength::Strong, Arc::new(|| println!("click done")))
//!         .await?;
//!     println!("Click lasts {:?}", duration);
//!     Ok(())
//! }
//! ```
//!
//! # Failure handling
//!
//! Every call returns a [`HalResult`]. [`HalError::Unsupported`] means the
//! hardware lacks the feature and is returned as is. Any other failure drops
//! the current session, and the call is retried once on a new session before
//! the error reaches the caller. A controller that cannot connect stays usable
//! and tries again on the next call.
//!
//! # Architecture
//!
//! - **Controller**: session ownership, reconnection and retry
//! - **Hal**: the `HalWrapper` / `HalConnector` traits a HAL backend implements
//! - **Scheduler**: delayed completion callbacks
//! - **Remote**: a HAL backend speaking JSON over WebSocket
//! - **Connection**: low-level WebSocket request/response handling
//! - **Protocol**: JSON message structures
//! - **Types**: effect vocabulary and capability flags

mod config;
mod connection;
mod controller;
mod error;
mod hal;
mod protocol;
mod remote;
mod scheduler;
mod types;

// Public exports
pub use config::ConnectorConfig;
pub use controller::HalController;
pub use error::{HalError, HalResult, Result, TransportError};
pub use hal::{HalConnector, HalWrapper};
pub use protocol::{ApiError, ErrorCode, Method, Request, RequestMeta, Response, ResponseMeta};
pub use remote::{RemoteHal, RemoteHalConnector, RemoteHalController};
pub use scheduler::{CallbackScheduler, CompletionCallback, CompletionToken};
pub use types::{Capabilities, CompositeEffect, CompositePrimitive, Effect, EffectStrength};
