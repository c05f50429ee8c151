/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the emulated display subsystem peripherals.

--*/

mod dma;
mod dpu;
mod irq;
mod panel;
mod platform_bus;
mod system;
mod trusty;

pub use dma::{DmaPool, DmaRegion};
pub use dpu::{EmulatedDpu, DPU_R6P0_VERSION};
pub use irq::{IrqDispatcher, IrqLine};
pub use panel::{BacklightUpdate, EmulatedBacklight, EmulatedDsi};
pub use platform_bus::{PlatformBus, PlatformBusOffsets};
pub use system::{DisplaySystem, DisplaySystemArgs, BACKLIGHT_NAME};
pub use trusty::EmulatedTa;
