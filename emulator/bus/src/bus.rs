/*++

Licensed under the Apache-2.0 license.

File Name:

    bus.rs

Abstract:

    File contains the Bus trait every emulated register window and memory
    region implements.

--*/

use emulator_types::{RvAddr, RvData, RvSize};
use thiserror::Error;

/// Why an access did not complete.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum BusError {
    #[error("load address misaligned")]
    LoadAddrMisaligned,

    /// Nothing answers reads at the address.
    #[error("load access fault")]
    LoadAccessFault,

    #[error("store address misaligned")]
    StoreAddrMisaligned,

    /// Nothing answers writes at the address, or the target is read-only.
    #[error("store access fault")]
    StoreAccessFault,
}

/// An address space seen from the CPU. Addresses are relative to whatever
/// routed the access here.
pub trait Bus {
    /// Loads `size` bytes at `addr`.
    ///
    /// # Error
    ///
    /// * `BusError::LoadAccessFault` or `BusError::LoadAddrMisaligned`
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError>;

    /// Stores the low `size` bytes of `val` at `addr`.
    ///
    /// # Error
    ///
    /// * `BusError::StoreAccessFault` or `BusError::StoreAddrMisaligned`
    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError>;
}
