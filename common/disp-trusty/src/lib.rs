// Licensed under the Apache-2.0 license

//! Messages and transport used to hand protected display layers to the
//! display trusted application running in the secure world.

pub mod channel;
pub mod client;
pub mod codec;
pub mod message;

pub use channel::{TrustyChannel, TrustyError};
pub use client::DispCa;
pub use codec::{TrustyCodec, TrustyCodecError};
pub use message::{DispMessage, TaCommand, DISP_VERSION_R6P0, MAX_DISP_MESSAGE_SIZE};
