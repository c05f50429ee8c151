// Licensed under the Apache-2.0 license

//! Hands protected layers to the secure world.

use disp_trusty::{DispCa, TaCommand, TrustyChannel, TrustyError, DISP_VERSION_R6P0};
use log::{debug, error};
use registers_dpu::regs::LayerReg;
use std::thread;
use std::time::Duration;
use zerocopy::IntoBytes;

pub struct SecureGateway {
    ca: DispCa<Box<dyn TrustyChannel>>,
}

impl SecureGateway {
    pub fn new(channel: Box<dyn TrustyChannel>) -> Self {
        Self {
            ca: DispCa::new(channel, DISP_VERSION_R6P0),
        }
    }

    /// Asks the secure world to program `image` into its slot.
    ///
    /// # Arguments
    ///
    /// * `hw_secure` - Whether the engine already runs in secure mode.
    /// * `settle` - Pause after opening a new session.
    /// * `image` - Register image of the layer slot.
    pub fn protect_layer(
        &mut self,
        hw_secure: bool,
        settle: Duration,
        image: &LayerReg,
    ) -> Result<(), TrustyError> {
        if !hw_secure {
            if !self.ca.is_connected() {
                self.ca.connect()?;
            }
            thread::sleep(settle);
        }
        self.ca
            .request(TaCommand::FirewallSet, &[])
            .inspect_err(|e| error!("firewall set failed: {}", e))?;
        self.ca
            .request(TaCommand::RegSet, image.as_bytes())
            .inspect_err(|e| error!("secure layer reg set failed: {}", e))?;
        debug!("secure layer handed over, ctrl 0x{:08x}", image.ctrl);
        Ok(())
    }

    /// Returns the engine to the normal world.
    pub fn release(&mut self) -> Result<(), TrustyError> {
        self.ca.request(TaCommand::RegClr, &[])?;
        self.ca.request(TaCommand::FirewallClr, &[])?;
        debug!("secure mode released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disp_trusty::{DispMessage, TrustyCodec, MAX_DISP_MESSAGE_SIZE};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingChannel {
        log: Arc<Mutex<Vec<String>>>,
        reply: Arc<Mutex<Vec<u8>>>,
    }

    impl TrustyChannel for RecordingChannel {
        fn connect(&self) -> Result<(), TrustyError> {
            self.log.lock().unwrap().push("connect".into());
            Ok(())
        }
        fn disconnect(&self) {}
        fn write(&self, message: &[u8]) -> Result<(), TrustyError> {
            let msg = DispMessage::decode(message).unwrap();
            self.log
                .lock()
                .unwrap()
                .push(format!("{:?}:{}", msg.command().unwrap(), message.len()));
            let mut reply = vec![0u8; MAX_DISP_MESSAGE_SIZE];
            let n = msg.response().encode(&mut reply).unwrap();
            reply.truncate(n);
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
    fn test_protect_then_release() {
        let channel = RecordingChannel::default();
        let log = channel.log.clone();
        let mut gateway = SecureGateway::new(Box::new(channel));
        let image = LayerReg {
            ctrl: 0x10039,
            ..Default::default()
        };
        gateway
            .protect_layer(false, Duration::from_micros(10), &image)
            .unwrap();
        gateway.protect_layer(true, Duration::ZERO, &image).unwrap();
        gateway.release().unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "connect",
                "FirewallSet:4",
                "RegSet:68",
                "FirewallSet:4",
                "RegSet:68",
                "RegClr:4",
                "FirewallClr:4",
            ]
        );
    }
}
