/*++

Licensed under the Apache-2.0 license.

File Name:

    ram.rs

Abstract:

    File contains a byte-addressable memory that can be shared between a
    driver and the emulated devices that DMA from it.

--*/

use crate::{Bus, BusError};
use emulator_types::{RvAddr, RvData, RvSize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Memory backed by a shared byte vector. Clones refer to the same storage,
/// which is how a DMA-coherent buffer is visible to both sides.
#[derive(Clone)]
pub struct Ram {
    data: Arc<Mutex<Vec<u8>>>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self {
            data: Arc::new(Mutex::new(vec![0; size])),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `src` into the memory at `offset`.
    pub fn write_bytes(&self, offset: usize, src: &[u8]) -> Result<(), BusError> {
        let mut data = self.lock();
        let end = offset
            .checked_add(src.len())
            .ok_or(BusError::StoreAccessFault)?;
        data.get_mut(offset..end)
            .ok_or(BusError::StoreAccessFault)?
            .copy_from_slice(src);
        Ok(())
    }

    /// Copy memory at `offset` into `dst`.
    pub fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), BusError> {
        let data = self.lock();
        let end = offset
            .checked_add(dst.len())
            .ok_or(BusError::LoadAccessFault)?;
        dst.copy_from_slice(data.get(offset..end).ok_or(BusError::LoadAccessFault)?);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Bus for Ram {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        let width = usize::from(size);
        if addr as usize % width != 0 {
            return Err(BusError::LoadAddrMisaligned);
        }
        let mut buf = [0u8; 4];
        self.read_bytes(addr as usize, &mut buf[..width])?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        let width = usize::from(size);
        if addr as usize % width != 0 {
            return Err(BusError::StoreAddrMisaligned);
        }
        self.write_bytes(addr as usize, &val.to_le_bytes()[..width])
    }
}
