use thiserror::Error;

/// Top-level error type for the `arlo-api` crate.
///
/// Covers every failure mode across the remote surface:
/// authentication, transport, service envelopes, and the push channel.
/// `arlo-core` maps these into command failures and user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A call that needs a session token was made before login.
    #[error("Not logged in -- no session token available")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status, with the raw body for debugging.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Service ─────────────────────────────────────────────────────
    /// The service answered `{ "success": false, ... }`.
    #[error("Arlo service error: {message}")]
    Service { message: String },

    // ── Push channel ────────────────────────────────────────────────
    /// The event stream could not be opened or failed mid-read.
    #[error("Event stream error: {0}")]
    EventStream(String),

    /// The event stream closed while a caller was still waiting on it.
    #[error("Event stream closed")]
    ChannelClosed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has failed or expired
    /// and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::NotAuthenticated | Self::Http { status: 401, .. }
        )
    }
}
