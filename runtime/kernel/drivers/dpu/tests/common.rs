// Licensed under the Apache-2.0 license

use dpu_driver::config::DpuConfig;
use dpu_driver::layer::{DrmFormat, Layer, Rect};
use dpu_driver::{create_dpu_core, DpuCore, InterfaceType, PanelConfig, VideoMode, DPU_R6P0};
use emulator_periph::{DisplaySystem, DisplaySystemArgs, IrqDispatcher, BACKLIGHT_NAME};
use log::LevelFilter;
use registers_dpu::regs::DPU_INT_RAW;
use registers_dpu::DpuIrq;
use simple_logger::SimpleLogger;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const PANEL_WIDTH: u32 = 64;
pub const PANEL_HEIGHT: u32 = 32;

/// Long enough for deferred work and the interrupt thread to catch up.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Polls `cond` until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

pub fn panel(interface: InterfaceType) -> PanelConfig {
    PanelConfig {
        vm: VideoMode {
            hactive: PANEL_WIDTH,
            vactive: PANEL_HEIGHT,
            hsync_len: 4,
            hback_porch: 16,
            hfront_porch: 16,
            vsync_len: 4,
            vback_porch: 32,
            vfront_porch: 8,
        },
        interface,
    }
}

/// An ARGB layer covering `dst`, backed by an address inside the DMA pool.
pub fn image_layer(system: &DisplaySystem, index: usize, dst: Rect) -> Layer {
    Layer {
        index,
        addr: [system.dma.base() + 0x1000 * index as u32, 0, 0, 0],
        pitch: [dst.w * 4, 0, 0, 0],
        src: Rect::new(0, 0, dst.w, dst.h),
        dst,
        format: DrmFormat::ARGB8888,
        ..Default::default()
    }
}

/// Board description every test display starts from.
pub fn default_config(system: &DisplaySystem) -> DpuConfig {
    let mut config = DpuConfig::default();
    config.device_tree.wb_memory = Some(system.wb_memory());
    config.device_tree.backlight = Some(BACKLIGHT_NAME.to_string());
    config
}

pub struct TestDisplay {
    pub system: DisplaySystem,
    pub core: Arc<dyn DpuCore>,
    _irq: IrqDispatcher,
}

impl TestDisplay {
    /// Builds an engine on a fresh emulated system. The engine is left
    /// powered off.
    pub fn new(args: DisplaySystemArgs, config: impl FnOnce(&mut DpuConfig)) -> Self {
        // Initialize log level (only once)
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();

        let system = DisplaySystem::new(args);
        let mut dpu_config = default_config(&system);
        config(&mut dpu_config);
        let core = create_dpu_core(DPU_R6P0, system.regs(), system.platform(), &dpu_config)
            .unwrap();
        let irq = system.attach(core.clone());
        Self {
            system,
            core,
            _irq: irq,
        }
    }

    pub fn power_on(&self, interface: InterfaceType) {
        self.core.init(&panel(interface)).unwrap();
        self.core.ifconfig().unwrap();
        self.core.run().unwrap();
    }

    /// Raises one vsync and waits until the engine has counted it.
    pub fn vsync(&self) {
        let before = self.core.status().vsync_count;
        self.system.dpu.vsync();
        assert!(
            wait_for(SETTLE_TIMEOUT, || {
                self.system.dpu.reg(DPU_INT_RAW) & DpuIrq::DPI_VSYNC.bits() == 0
                    && self.core.status().vsync_count != before
            }),
            "vsync was not serviced"
        );
    }
}

/// A running video mode display.
pub fn setup() -> TestDisplay {
    let display = TestDisplay::new(DisplaySystemArgs::default(), |_| {});
    display.power_on(InterfaceType::Dpi);
    display
}
