/*++

Licensed under the Apache-2.0 license.

File Name:

    system.rs

Abstract:

    File contains the assembled display subsystem: engine, memory, secure
    world, panel and the interrupt path between them and a driver.

--*/

use crate::dma::DmaPool;
use crate::dpu::EmulatedDpu;
use crate::irq::{IrqDispatcher, IrqLine};
use crate::panel::{EmulatedBacklight, EmulatedDsi};
use crate::platform_bus::{PlatformBus, PlatformBusOffsets};
use crate::trusty::EmulatedTa;
use dpu_driver::config::ReservedMemory;
use dpu_driver::platform::{BacklightRegistry, DsiWorkMode, DvfsNotifierChain, Platform};
use dpu_driver::regs::DpuRegs;
use dpu_driver::DpuCore;
use emulator_bus::{Ram, SharedBus};
use std::sync::Arc;

/// Name the backlight is registered under.
pub const BACKLIGHT_NAME: &str = "sprd_backlight";

#[derive(Debug, Clone, Default)]
pub struct DisplaySystemArgs {
    pub dsi_mode: DsiWorkMode,
    pub offsets: PlatformBusOffsets,
}

pub struct DisplaySystem {
    pub bus: SharedBus,
    pub dpu: EmulatedDpu,
    pub irq: IrqLine,
    pub dma: DmaPool,
    pub ta: EmulatedTa,
    pub backlight: EmulatedBacklight,
    pub backlights: BacklightRegistry,
    pub dvfs: DvfsNotifierChain,
    dsi: EmulatedDsi,
    offsets: PlatformBusOffsets,
}

impl DisplaySystem {
    pub fn new(args: DisplaySystemArgs) -> Self {
        let offsets = args.offsets;
        let irq = IrqLine::default();
        let dma = DmaPool::new(offsets.dma_offset, offsets.dma_size as usize);
        let dpu = EmulatedDpu::new(irq.clone(), dma.clone());
        let wb = Ram::new(offsets.wb_size as usize);
        let bus = SharedBus::new(PlatformBus::new(
            dpu.clone(),
            dma.ram().clone(),
            wb,
            offsets.clone(),
        ));

        let backlight = EmulatedBacklight::default();
        let backlights = BacklightRegistry::default();
        backlights.register(BACKLIGHT_NAME, Arc::new(backlight.clone()));

        Self {
            bus,
            ta: EmulatedTa::new(dpu.clone()),
            dpu,
            irq,
            dma,
            backlight,
            backlights,
            dvfs: DvfsNotifierChain::default(),
            dsi: EmulatedDsi::new(args.dsi_mode),
            offsets,
        }
    }

    /// Register window of the engine as a driver sees it.
    pub fn regs(&self) -> DpuRegs {
        DpuRegs::new(self.bus.clone(), self.offsets.dpu_offset)
    }

    /// Collaborators for a new engine instance.
    pub fn platform(&self) -> Platform {
        Platform {
            dsi: Arc::new(self.dsi),
            backlights: self.backlights.clone(),
            dma: Arc::new(self.dma.clone()),
            dvfs: self.dvfs.clone(),
            trusty: Box::new(self.ta.clone()),
        }
    }

    /// The reserved region write-back captures into.
    pub fn wb_memory(&self) -> ReservedMemory {
        ReservedMemory {
            base: self.offsets.wb_offset,
            size: self.offsets.wb_size.into(),
        }
    }

    /// Delivers the engine interrupt to `core` until the returned
    /// dispatcher is dropped.
    pub fn attach(&self, core: Arc<dyn DpuCore>) -> IrqDispatcher {
        IrqDispatcher::spawn(self.irq.clone(), move || {
            core.isr();
        })
    }
}
