// Licensed under the Apache-2.0 license

use core::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustyError {
    #[error("secure session is not connected")]
    NotConnected,
    #[error("secure session timed out waiting for a response")]
    Timeout,
    #[error("secure session disconnected")]
    Disconnected,
    #[error("secure message buffer too short")]
    BufferTooShort,
    #[error("secure world rejected the request")]
    Rejected,
}

/// A session with the display trusted application.
///
/// The protocol is synchronous: one request is written, then the caller
/// waits for and reads the matching response before sending the next one.
pub trait TrustyChannel: Send {
    /// Opens the session.
    ///
    /// # Returns
    ///
    /// * `Result<(), TrustyError>` - Returns `Ok(())` if the session is open.
    fn connect(&self) -> Result<(), TrustyError>;

    /// Closes the session. Always succeeds.
    fn disconnect(&self);

    /// Sends one request.
    ///
    /// # Arguments
    ///
    /// * `message` - Header followed by the optional payload.
    fn write(&self, message: &[u8]) -> Result<(), TrustyError>;

    /// Blocks until a response is available.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait.
    fn wait_response(&self, timeout: Duration) -> Result<(), TrustyError>;

    /// Copies the pending response into `buffer`.
    ///
    /// # Returns
    ///
    /// * `Result<usize, TrustyError>` - Number of bytes copied.
    fn read(&self, buffer: &mut [u8]) -> Result<usize, TrustyError>;
}

impl<T: TrustyChannel + ?Sized> TrustyChannel for Box<T> {
    fn connect(&self) -> Result<(), TrustyError> {
        (**self).connect()
    }

    fn disconnect(&self) {
        (**self).disconnect()
    }

    fn write(&self, message: &[u8]) -> Result<(), TrustyError> {
        (**self).write(message)
    }

    fn wait_response(&self, timeout: Duration) -> Result<(), TrustyError> {
        (**self).wait_response(timeout)
    }

    fn read(&self, buffer: &mut [u8]) -> Result<usize, TrustyError> {
        (**self).read(buffer)
    }
}
