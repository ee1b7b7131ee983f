//! Typed outcomes for link operations.
//!
//! Every failure of discovery, connect, resolution or transmission is
//! surfaced to the caller as one of these variants; nothing is swallowed
//! and nothing is retried automatically.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// Discovery produced no device matching the configured name prefixes,
    /// or the radio could not scan at all.
    #[error("no matching device was discovered")]
    DeviceUnavailable,

    /// The GATT connect attempt was rejected by the device or the stack.
    #[error("GATT connect failed")]
    ConnectFailed(#[source] windows::core::Error),

    /// The configured service or one of its characteristics could not be
    /// resolved on the connected device.
    #[error("service or characteristic resolution failed: {0}")]
    ResolutionFailed(String),

    /// A control frame write was rejected. The session stays connected;
    /// the next input update simply tries again.
    #[error("control frame write failed: {0}")]
    SendFailed(String),

    /// A send was attempted outside the `Connected` state.
    #[error("link is not connected")]
    NotConnected,
}
