/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Common types shared by the emulated bus and peripherals.

--*/

mod consts;

pub use consts::*;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bus address
pub type RvAddr = u32;

/// Bus data
pub type RvData = u32;

/// Size of a bus access
#[derive(Debug, Copy, Clone, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(usize)]
pub enum RvSize {
    Byte = 1,
    HalfWord = 2,
    Word = 4,
}

impl RvSize {
    /// Mask of the bits a value of this size occupies.
    pub fn mask(self) -> RvData {
        match self {
            RvSize::Byte => 0xff,
            RvSize::HalfWord => 0xffff,
            RvSize::Word => 0xffff_ffff,
        }
    }
}
