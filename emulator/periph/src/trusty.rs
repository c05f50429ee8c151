/*++

Licensed under the Apache-2.0 license.

File Name:

    trusty.rs

Abstract:

    File contains an emulated display trusted application. It owns the
    firewall of the emulated engine and records the layers it is asked to
    program.

--*/

use crate::dpu::EmulatedDpu;
use core::time::Duration;
use disp_trusty::{DispMessage, TaCommand, TrustyChannel, TrustyCodec, TrustyError};
use log::{debug, warn};
use registers_dpu::regs::LayerReg;
use std::sync::{Arc, Mutex, MutexGuard};
use zerocopy::FromBytes;

const HEADER_SIZE: usize = core::mem::size_of::<DispMessage>();

#[derive(Default)]
struct TaState {
    connected: bool,
    refuse_connect: bool,
    reject: Option<TaCommand>,
    reply: Option<DispMessage>,
    commands: Vec<TaCommand>,
    layers: Vec<LayerReg>,
}

/// Secure world end of the display session. Clones share the same state.
#[derive(Clone)]
pub struct EmulatedTa {
    dpu: EmulatedDpu,
    state: Arc<Mutex<TaState>>,
}

impl EmulatedTa {
    pub fn new(dpu: EmulatedDpu) -> Self {
        Self {
            dpu,
            state: Arc::default(),
        }
    }

    /// Makes the next connection attempts fail.
    pub fn refuse_connect(&self, refuse: bool) {
        self.lock().refuse_connect = refuse;
    }

    /// Answers `cmd` with a malformed reply from now on.
    pub fn reject(&self, cmd: Option<TaCommand>) {
        self.lock().reject = cmd;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Commands handled so far, in order.
    pub fn commands(&self) -> Vec<TaCommand> {
        self.lock().commands.clone()
    }

    /// Layer images programmed on behalf of the normal world.
    pub fn layers(&self) -> Vec<LayerReg> {
        self.lock().layers.clone()
    }

    fn lock(&self) -> MutexGuard<'_, TaState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TrustyChannel for EmulatedTa {
    fn connect(&self) -> Result<(), TrustyError> {
        let mut state = self.lock();
        if state.refuse_connect {
            return Err(TrustyError::NotConnected);
        }
        state.connected = true;
        debug!("disp ta session opened");
        Ok(())
    }

    fn disconnect(&self) {
        self.lock().connected = false;
    }

    fn write(&self, message: &[u8]) -> Result<(), TrustyError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(TrustyError::NotConnected);
        }
        let header = DispMessage::decode(message).map_err(|_| TrustyError::BufferTooShort)?;
        let Some(cmd) = header.command() else {
            warn!("disp ta unknown command {}", header.cmd);
            return Err(TrustyError::Rejected);
        };

        match cmd {
            TaCommand::FirewallSet => self.dpu.set_secure(true),
            TaCommand::FirewallClr => self.dpu.set_secure(false),
            TaCommand::RegSet => {
                let (image, _) = LayerReg::read_from_prefix(&message[HEADER_SIZE..])
                    .map_err(|_| TrustyError::BufferTooShort)?;
                state.layers.push(image);
            }
            TaCommand::RegClr => state.layers.clear(),
        }
        state.commands.push(cmd);
        state.reply = Some(if state.reject == Some(cmd) {
            header
        } else {
            header.response()
        });
        Ok(())
    }

    fn wait_response(&self, _timeout: Duration) -> Result<(), TrustyError> {
        match self.lock().reply {
            Some(_) => Ok(()),
            None => Err(TrustyError::Timeout),
        }
    }

    fn read(&self, buffer: &mut [u8]) -> Result<usize, TrustyError> {
        let reply = self.lock().reply.take().ok_or(TrustyError::Timeout)?;
        reply
            .encode(buffer)
            .map_err(|_| TrustyError::BufferTooShort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dma::DmaPool;
    use crate::irq::IrqLine;
    use disp_trusty::{DispCa, DISP_VERSION_R6P0};
    use zerocopy::IntoBytes;

    fn ta() -> (EmulatedTa, EmulatedDpu) {
        let dpu = EmulatedDpu::new(IrqLine::default(), DmaPool::new(0, 0x1000));
        (EmulatedTa::new(dpu.clone()), dpu)
    }

    #[test]
    fn test_firewall_follows_commands() {
        let (ta, dpu) = ta();
        let mut ca = DispCa::new(ta.clone(), DISP_VERSION_R6P0);
        ca.connect().unwrap();
        ca.request(TaCommand::FirewallSet, &[]).unwrap();
        assert!(dpu.is_secure());

        let image = LayerReg {
            ctrl: 0x39,
            ..Default::default()
        };
        ca.request(TaCommand::RegSet, image.as_bytes()).unwrap();
        assert_eq!(ta.layers(), vec![image]);

        ca.request(TaCommand::RegClr, &[]).unwrap();
        ca.request(TaCommand::FirewallClr, &[]).unwrap();
        assert!(!dpu.is_secure());
        assert!(ta.layers().is_empty());
        assert_eq!(
            ta.commands(),
            vec![
                TaCommand::FirewallSet,
                TaCommand::RegSet,
                TaCommand::RegClr,
                TaCommand::FirewallClr
            ]
        );
    }

    #[test]
    fn test_session_required() {
        let (ta, _) = ta();
        ta.refuse_connect(true);
        let mut ca = DispCa::new(ta.clone(), DISP_VERSION_R6P0);
        assert_eq!(ca.connect(), Err(TrustyError::NotConnected));
        let header = DispMessage::new(DISP_VERSION_R6P0, TaCommand::RegClr);
        assert_eq!(ta.write(header.as_bytes()), Err(TrustyError::NotConnected));
    }

    #[test]
    fn test_rejected_command() {
        let (ta, _) = ta();
        ta.reject(Some(TaCommand::FirewallSet));
        let mut ca = DispCa::new(ta, DISP_VERSION_R6P0);
        ca.connect().unwrap();
        assert_eq!(
            ca.request(TaCommand::FirewallSet, &[]),
            Err(TrustyError::Rejected)
        );
    }

    #[test]
    fn test_short_layer_image() {
        let (ta, _) = ta();
        ta.connect().unwrap();
        let header = DispMessage::new(DISP_VERSION_R6P0, TaCommand::RegSet);
        assert_eq!(
            ta.write(header.as_bytes()),
            Err(TrustyError::BufferTooShort)
        );
    }
}
