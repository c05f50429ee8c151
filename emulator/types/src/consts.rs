/*++

Licensed under the Apache-2.0 license.

File Name:

    consts.rs

Abstract:

    File contains the address map of the emulated display subsystem.

--*/

/// Physical base of the DPU register page.
pub const DPU_REG_OFFSET: u32 = 0x6310_0000;
/// Size of the DPU register page.
pub const DPU_REG_SIZE: u32 = 0x2000;

/// Physical base of the DMA-coherent pool handed out to drivers.
pub const DMA_POOL_OFFSET: u32 = 0x8000_0000;
pub const DMA_POOL_SIZE: u32 = 512 * 1024;

/// Reserved memory carved out for write-back capture.
pub const WB_RESERVED_OFFSET: u32 = 0x9000_0000;
pub const WB_RESERVED_SIZE: u32 = 16 * 1024 * 1024;
