// Licensed under the Apache-2.0 license

use crate::channel::{TrustyChannel, TrustyError};
use crate::codec::TrustyCodec;
use crate::message::{DispMessage, TaCommand, DISP_MESSAGE_HEADER_SIZE, MAX_DISP_MESSAGE_SIZE};
use core::time::Duration;
use log::{debug, error};

pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Client side of the display trusted application protocol. Owns the
/// channel and a message buffer that is reused for every request.
pub struct DispCa<C: TrustyChannel> {
    channel: C,
    version: u16,
    buffer: [u8; MAX_DISP_MESSAGE_SIZE],
    connected: bool,
}

impl<C: TrustyChannel> DispCa<C> {
    pub fn new(channel: C, version: u16) -> Self {
        Self {
            channel,
            version,
            buffer: [0; MAX_DISP_MESSAGE_SIZE],
            connected: false,
        }
    }

    pub fn connect(&mut self) -> Result<(), TrustyError> {
        self.channel.connect()?;
        self.connected = true;
        debug!("disp ca connected");
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.connected {
            self.channel.disconnect();
            self.connected = false;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Sends `cmd` with an optional payload and waits for the reply.
    pub fn request(&mut self, cmd: TaCommand, payload: &[u8]) -> Result<(), TrustyError> {
        if !self.connected {
            return Err(TrustyError::NotConnected);
        }

        let header = DispMessage::new(self.version, cmd);
        let len = DISP_MESSAGE_HEADER_SIZE + payload.len();
        if len > self.buffer.len() {
            return Err(TrustyError::BufferTooShort);
        }
        header
            .encode(&mut self.buffer)
            .map_err(|_| TrustyError::BufferTooShort)?;
        self.buffer[DISP_MESSAGE_HEADER_SIZE..len].copy_from_slice(payload);

        self.channel.write(&self.buffer[..len])?;
        self.channel.wait_response(RESPONSE_TIMEOUT)?;

        let n = self.channel.read(&mut self.buffer)?;
        let reply =
            DispMessage::decode(&self.buffer[..n]).map_err(|_| TrustyError::BufferTooShort)?;
        if !reply.is_response() || reply.command() != Some(cmd) {
            error!("disp ca unexpected reply {:?} to {:?}", reply, cmd);
            return Err(TrustyError::Rejected);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoChannel {
        sent: Mutex<Vec<Vec<u8>>>,
        reply: Mutex<Vec<u8>>,
        corrupt: bool,
    }

    impl TrustyChannel for EchoChannel {
        fn connect(&self) -> Result<(), TrustyError> {
            Ok(())
        }
        fn disconnect(&self) {}
        fn write(&self, message: &[u8]) -> Result<(), TrustyError> {
            self.sent.lock().unwrap().push(message.to_vec());
            let mut hdr = DispMessage::decode(message).unwrap().response();
            if self.corrupt {
                hdr.cmd = 0;
            }
            let mut reply = vec![0u8; DISP_MESSAGE_HEADER_SIZE];
            hdr.encode(&mut reply).unwrap();
            *self.reply.lock().unwrap() = reply;
            Ok(())
        }
        fn wait_response(&self, _timeout: Duration) -> Result<(), TrustyError> {
            Ok(())
        }
        fn read(&self, buffer: &mut [u8]) -> Result<usize, TrustyError> {
            let reply = self.reply.lock().unwrap();
            buffer[..reply.len()].copy_from_slice(&reply);
            Ok(reply.len())
        }
    }

    #[test]
    fn test_request_requires_connection() {
        let mut ca = DispCa::new(EchoChannel::default(), 6);
        assert_eq!(
            ca.request(TaCommand::FirewallSet, &[]),
            Err(TrustyError::NotConnected)
        );
    }

    #[test]
    fn test_request_carries_payload() {
        let mut ca = DispCa::new(EchoChannel::default(), 6);
        ca.connect().unwrap();
        ca.request(TaCommand::RegSet, &[0xaa; 64]).unwrap();

        let sent = ca.channel().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 68);
        assert_eq!(&sent[0][..4], &[6, 0, 1, 0]);
        assert!(sent[0][4..].iter().all(|b| *b == 0xaa));
    }

    #[test]
    fn test_oversized_payload() {
        let mut ca = DispCa::new(EchoChannel::default(), 6);
        ca.connect().unwrap();
        assert_eq!(
            ca.request(TaCommand::RegSet, &[0; MAX_DISP_MESSAGE_SIZE]),
            Err(TrustyError::BufferTooShort)
        );
    }

    #[test]
    fn test_mismatched_reply_is_rejected() {
        let channel = EchoChannel {
            corrupt: true,
            ..Default::default()
        };
        let mut ca = DispCa::new(channel, 6);
        ca.connect().unwrap();
        assert_eq!(
            ca.request(TaCommand::RegClr, &[]),
            Err(TrustyError::Rejected)
        );
    }
}
