// arlo-api: Async Rust client for the Arlo cloud service (sessions, commands, push events)

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod events;
pub mod models;
pub mod session;
pub mod sse;
pub mod transport;

pub use auth::{Credentials, ServiceUrls, SessionAuth, DEFAULT_API_ROOT};
pub use client::ArloClient;
pub use error::Error;
pub use events::{ArloEvent, EventChannel, EventFilter, EventKind, EventSubscription};
pub use models::{AutomationStatus, DeviceAddress, RawDevice};
pub use reqwest::Method;
pub use transport::{
    ApiRequest, ByteStream, Connector, HttpConnector, HttpTransport, TlsMode, Transport,
    TransportConfig,
};
