//! Voicelink Core Library
//!
//! The local IPC fabric of the voicelink host: the shared message
//! envelope, the Unix-domain-socket server speaking newline-delimited
//! JSON to the native helper, the helper process supervisor, and the
//! window registry/broadcast bus.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use voicelink_core::{
//!     helper::{HelperConfig, HelperSupervisor},
//!     socket::SocketServer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> voicelink_core::CoreResult<()> {
//!     let path = std::env::temp_dir().join("voicelink.sock");
//!     let (server, mut events) = SocketServer::new(path);
//!     let server = Arc::new(server);
//!
//!     server.start().await?;
//!     let supervisor = HelperSupervisor::new(HelperConfig::default(), Arc::clone(&server));
//!     supervisor.start().await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod helper;
pub mod message;
pub mod socket;
pub mod window;

pub use error::{CoreError, Result as CoreResult};
