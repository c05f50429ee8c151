/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Display processing unit engine: composition, picture quality,
    write-back capture, adaptive backlight and secure layer hand-off.

--*/

pub mod config;
pub mod enhance;
pub mod error;
pub mod events;
pub mod layer;
pub mod platform;
pub mod r6p0;
pub mod regs;
pub mod workqueue;

use crate::config::{DeviceTreeConfig, DpuConfig, ModuleParam, ModuleParams};
use crate::enhance::{CabcState, EnhanceId, EnhanceParam, EnhanceValue};
use crate::error::{DpuError, DpuResult};
use crate::layer::{DrmFormat, Layer};
use crate::platform::Platform;
use crate::regs::DpuRegs;
use registers_dpu::EnhanceModules;
use std::sync::Arc;

pub use crate::r6p0::DpuR6p0;

/// Native timing of the attached panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoMode {
    pub hactive: u32,
    pub vactive: u32,
    pub hsync_len: u32,
    pub hback_porch: u32,
    pub hfront_porch: u32,
    pub vsync_len: u32,
    pub vback_porch: u32,
    pub vfront_porch: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterfaceType {
    /// Video mode. Shadowed registers allow updates while running.
    #[default]
    Dpi,
    /// Command mode. Registers may only change while stopped.
    Edpi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelConfig {
    pub vm: VideoMode,
    pub interface: InterfaceType,
}

/// Mode requested by userspace; may differ from the panel timing, in which
/// case the engine upscales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub hdisplay: u32,
    pub vdisplay: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub max_layers: usize,
    pub formats: &'static [DrmFormat],
}

/// Snapshot of the engine's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpuStatus {
    pub inited: bool,
    pub stopped: bool,
    pub panel_ready: bool,
    pub flip_disabled: bool,
    pub vsync_count: u32,
    pub max_vsync_count: u32,
    pub wb_en: bool,
    pub cabc_bl_set: bool,
    pub cabc_state: CabcState,
    pub frame_no: u32,
    pub enhance_en: EnhanceModules,
}

/// Operations every hardware revision of the engine provides.
pub trait DpuCore: Send + Sync {
    /// Applies the board description.
    fn parse_dt(&self, dt: &DeviceTreeConfig) -> DpuResult<()>;

    fn version(&self) -> DpuResult<u32>;

    /// Powers the pipeline up for `panel` and replays cached enhancement
    /// settings.
    fn init(&self, panel: &PanelConfig) -> DpuResult<()>;

    fn uninit(&self) -> DpuResult<()>;

    fn run(&self) -> DpuResult<()>;

    fn stop(&self) -> DpuResult<()>;

    /// Services the interrupt line. Returns the status bits that were
    /// pending.
    fn isr(&self) -> u32;

    /// Programs the panel interface chosen at `init`.
    fn ifconfig(&self) -> DpuResult<()>;

    fn capability(&self) -> Capability;

    fn flip(&self, layers: &[Layer]) -> DpuResult<()>;

    fn bg_color(&self, color: u32) -> DpuResult<()>;

    fn enable_vsync(&self) -> DpuResult<()>;

    /// Leaves the vsync interrupt on; write-back and CABC count vsyncs.
    fn disable_vsync(&self);

    fn enhance_set(&self, param: EnhanceParam) -> DpuResult<()>;

    fn enhance_get(&self, id: EnhanceId) -> DpuResult<EnhanceValue>;

    fn modeset(&self, mode: DisplayMode) -> DpuResult<()>;

    /// Captures the next frame into the write-back buffer.
    fn write_back(&self, count: u8, debug: bool) -> DpuResult<()>;

    fn dma_request(&self) -> DpuResult<()>;

    fn module_params(&self) -> ModuleParams;

    fn set_module_param(&self, param: ModuleParam);

    /// Makes deferred write-back work skip its flip.
    fn disable_flip(&self, disabled: bool);

    fn status(&self) -> DpuStatus;
}

/// Key of the r6p0 implementation.
pub const DPU_R6P0: &str = "dpu-r6p0";

/// Builds the engine registered under `version`.
pub fn create_dpu_core(
    version: &str,
    regs: DpuRegs,
    platform: Platform,
    config: &DpuConfig,
) -> DpuResult<Arc<dyn DpuCore>> {
    match version {
        DPU_R6P0 => {
            let dpu = DpuR6p0::new(regs, platform, config);
            dpu.parse_dt(&config.device_tree)?;
            Ok(dpu)
        }
        _ => Err(DpuError::UnsupportedVersion(version.to_string())),
    }
}
