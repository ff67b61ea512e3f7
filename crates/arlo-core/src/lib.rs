//! Session and command-correlation layer between `arlo-api` and a host.
//!
//! - **[`SessionManager`]** opens one [`Session`] per login: a fresh
//!   transport, the authenticated client, and the push channel.
//!   [`with_session`](SessionManager::with_session) guarantees the logout.
//!
//! - **[`DeviceRegistry`]** turns the flat inventory into base stations and
//!   the cameras attached to them.
//!
//! - **[`CommandDispatcher`]** runs one host action per session and resolves
//!   it to exactly one [`CommandResult`], waiting on the push channel where
//!   the service answers asynchronously (snapshots).
//!
//! - **[`PollScheduler`]** re-reads the active mode of every base station on
//!   an interval.
//!
//! - **[`Adapter`]** ties these to a [`HostSink`]: discovery, object
//!   registration, and property updates.

pub mod adapter;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod model;
pub mod poll;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::Adapter;
pub use command::{Action, CommandDispatcher, CommandRequest, CommandResult, FailureReason};
pub use config::{ClientConfig, TlsVerification, DEFAULT_STATE_POLL_MINUTES};
pub use error::CoreError;
pub use host::{HostSink, MemoryHost, ObjectSpec, PropertyUpdate, StateSpec};
pub use model::{Device, DeviceKind, DeviceRegistry};
pub use poll::PollScheduler;
pub use session::{Session, SessionManager, SessionState};
