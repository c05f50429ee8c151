// Licensed under the Apache-2.0 license

use num_enum::{IntoPrimitive, TryFromPrimitive};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Hardware revision carried in every request header.
pub const DISP_VERSION_R6P0: u16 = 6;

/// Header plus the largest payload, one layer register image.
pub const MAX_DISP_MESSAGE_SIZE: usize = 128;

/// Set in the command field of a reply.
pub const RESPONSE_FLAG: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum TaCommand {
    /// Program a layer from the image that follows the header.
    RegSet = 1,
    /// Release the layers programmed by the secure world.
    RegClr = 2,
    /// Lock the display block to the secure world.
    FirewallSet = 3,
    /// Give the display block back to the normal world.
    FirewallClr = 4,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct DispMessage {
    pub version: u16,
    pub cmd: u16,
}

impl DispMessage {
    pub fn new(version: u16, cmd: TaCommand) -> Self {
        Self {
            version,
            cmd: cmd.into(),
        }
    }

    pub fn command(&self) -> Option<TaCommand> {
        TaCommand::try_from(self.cmd & !RESPONSE_FLAG).ok()
    }

    pub fn is_response(&self) -> bool {
        self.cmd & RESPONSE_FLAG != 0
    }

    /// The reply a trusted application sends once it has handled `self`.
    pub fn response(&self) -> Self {
        Self {
            version: self.version,
            cmd: self.cmd | RESPONSE_FLAG,
        }
    }
}

pub const DISP_MESSAGE_HEADER_SIZE: usize = core::mem::size_of::<DispMessage>();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{TrustyCodec, TrustyCodecError};

    #[test]
    fn test_header_wire_format() {
        let msg = DispMessage::new(DISP_VERSION_R6P0, TaCommand::FirewallSet);
        let mut buf = [0u8; 4];
        assert_eq!(msg.encode(&mut buf), Ok(4));
        assert_eq!(buf, [6, 0, 3, 0]);

        let reply = DispMessage::decode(&msg.response().as_bytes()[..]).unwrap();
        assert!(reply.is_response());
        assert_eq!(reply.command(), Some(TaCommand::FirewallSet));
    }

    #[test]
    fn test_short_buffer() {
        let msg = DispMessage::new(DISP_VERSION_R6P0, TaCommand::RegClr);
        assert_eq!(msg.encode(&mut [0u8; 3]), Err(TrustyCodecError::BufferTooShort));
        assert_eq!(
            DispMessage::decode(&[1, 2]).err(),
            Some(TrustyCodecError::BufferTooShort)
        );
    }

    #[test]
    fn test_unknown_command() {
        let msg = DispMessage { version: 6, cmd: 9 };
        assert_eq!(msg.command(), None);
    }
}
