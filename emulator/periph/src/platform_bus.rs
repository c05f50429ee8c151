/*++

Licensed under the Apache-2.0 license.

File Name:

    platform_bus.rs

Abstract:

    File contains the root bus of the emulated display subsystem.

--*/

use crate::dpu::EmulatedDpu;
use emulator_bus::{Bus, BusError, Ram};
use emulator_types::{
    RvAddr, RvData, RvSize, DMA_POOL_OFFSET, DMA_POOL_SIZE, DPU_REG_OFFSET, DPU_REG_SIZE,
    WB_RESERVED_OFFSET, WB_RESERVED_SIZE,
};

#[derive(Debug, Clone)]
pub struct PlatformBusOffsets {
    pub dpu_offset: u32,
    pub dpu_size: u32,
    pub dma_offset: u32,
    pub dma_size: u32,
    pub wb_offset: u32,
    pub wb_size: u32,
}

impl Default for PlatformBusOffsets {
    fn default() -> Self {
        Self {
            dpu_offset: DPU_REG_OFFSET,
            dpu_size: DPU_REG_SIZE,
            dma_offset: DMA_POOL_OFFSET,
            dma_size: DMA_POOL_SIZE,
            wb_offset: WB_RESERVED_OFFSET,
            wb_size: WB_RESERVED_SIZE,
        }
    }
}

/// Routes each access to the device mapped at its address.
pub struct PlatformBus {
    pub dpu: EmulatedDpu,
    pub dma: Ram,
    pub wb: Ram,
    offsets: PlatformBusOffsets,
}

impl PlatformBus {
    pub fn new(dpu: EmulatedDpu, dma: Ram, wb: Ram, offsets: PlatformBusOffsets) -> Self {
        Self {
            dpu,
            dma,
            wb,
            offsets,
        }
    }

    fn route(&mut self, addr: RvAddr) -> Option<(&mut dyn Bus, RvAddr)> {
        let within = |base: u32, size: u32| addr >= base && addr - base < size;
        let o = &self.offsets;
        let (dev, base): (&mut dyn Bus, u32) = if within(o.dpu_offset, o.dpu_size) {
            (&mut self.dpu, o.dpu_offset)
        } else if within(o.dma_offset, o.dma_size) {
            (&mut self.dma, o.dma_offset)
        } else if within(o.wb_offset, o.wb_size) {
            (&mut self.wb, o.wb_offset)
        } else {
            return None;
        };
        Some((dev, addr - base))
    }
}

impl Bus for PlatformBus {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        let (dev, offset) = self.route(addr).ok_or(BusError::LoadAccessFault)?;
        dev.read(size, offset)
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        let (dev, offset) = self.route(addr).ok_or(BusError::StoreAccessFault)?;
        dev.write(size, offset, val)
    }
}
