/*++

Licensed under the Apache-2.0 license.

File Name:

    dma.rs

Abstract:

    File contains the DMA-coherent memory pool shared by the driver and
    the emulated display engine.

--*/

use dpu_driver::platform::{DmaAllocator, DmaBuffer};
use emulator_bus::{BusError, Ram};
use emulator_types::{RvAddr, DMA_POOL_OFFSET, DMA_POOL_SIZE};
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Allocations are page aligned, like the kernel's coherent allocator.
const PAGE_SIZE: usize = 4096;

#[derive(Default)]
struct PoolState {
    next: usize,
    exhausted: bool,
}

/// A bump allocator over one [`Ram`]. Memory is never returned; the pool
/// lives as long as the emulated system.
#[derive(Clone)]
pub struct DmaPool {
    ram: Ram,
    base: RvAddr,
    state: Arc<Mutex<PoolState>>,
}

impl Default for DmaPool {
    fn default() -> Self {
        Self::new(DMA_POOL_OFFSET, DMA_POOL_SIZE as usize)
    }
}

impl DmaPool {
    pub fn new(base: RvAddr, size: usize) -> Self {
        Self {
            ram: Ram::new(size),
            base,
            state: Arc::default(),
        }
    }

    /// Backing memory, for mapping onto a bus.
    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn base(&self) -> RvAddr {
        self.base
    }

    /// Makes every following allocation fail.
    pub fn set_exhausted(&self, exhausted: bool) {
        self.lock().exhausted = exhausted;
    }

    pub fn alloc(&self, size: usize) -> Option<DmaRegion> {
        let mut state = self.lock();
        if state.exhausted {
            warn!("dma pool exhausted, refusing {} bytes", size);
            return None;
        }
        let offset = state.next;
        let end = offset.checked_add(size)?;
        if end > self.ram.len() {
            warn!("dma pool too small for {} bytes", size);
            return None;
        }
        state.next = end.div_ceil(PAGE_SIZE) * PAGE_SIZE;
        debug!("dma alloc {} bytes at 0x{:08x}", size, self.base as usize + offset);
        Some(DmaRegion {
            ram: self.ram.clone(),
            phys: self.base + offset as RvAddr,
            offset,
            len: size,
        })
    }

    /// Reads the word at bus address `addr`, as a DMA master would.
    pub fn read_word(&self, addr: RvAddr) -> Option<u32> {
        let mut bytes = [0u8; 4];
        self.read_at(addr, &mut bytes)?;
        Some(u32::from_le_bytes(bytes))
    }

    pub fn read_half(&self, addr: RvAddr) -> Option<u16> {
        let mut bytes = [0u8; 2];
        self.read_at(addr, &mut bytes)?;
        Some(u16::from_le_bytes(bytes))
    }

    fn read_at(&self, addr: RvAddr, dst: &mut [u8]) -> Option<()> {
        let offset = addr.checked_sub(self.base)? as usize;
        self.ram.read_bytes(offset, dst).ok()
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One allocation out of a [`DmaPool`].
pub struct DmaRegion {
    ram: Ram,
    phys: RvAddr,
    offset: usize,
    len: usize,
}

impl DmaRegion {
    fn span(&self, offset: usize, len: usize) -> Option<usize> {
        let end = offset.checked_add(len)?;
        (end <= self.len).then_some(self.offset + offset)
    }
}

impl DmaBuffer for DmaRegion {
    fn phys_addr(&self) -> u32 {
        self.phys
    }

    fn len(&self) -> usize {
        self.len
    }

    fn write_bytes(&self, offset: usize, src: &[u8]) -> Result<(), BusError> {
        let start = self
            .span(offset, src.len())
            .ok_or(BusError::StoreAccessFault)?;
        self.ram.write_bytes(start, src)
    }

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), BusError> {
        let start = self
            .span(offset, dst.len())
            .ok_or(BusError::LoadAccessFault)?;
        self.ram.read_bytes(start, dst)
    }
}

impl DmaAllocator for DmaPool {
    fn alloc_coherent(&self, size: usize) -> Option<Box<dyn DmaBuffer>> {
        self.alloc(size).map(|r| Box::new(r) as Box<dyn DmaBuffer>)
    }
}
