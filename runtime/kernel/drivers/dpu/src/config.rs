// Licensed under the Apache-2.0 license

//! Board description and tunables for the display engine.

use crate::enhance::CabcState;
use crate::error::{DpuError, DpuResult};
use log::warn;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_ARQOS_LOW: u8 = 0xa;
pub const DEFAULT_ARQOS_HIGH: u8 = 0xc;
pub const DEFAULT_AWQOS_LOW: u8 = 0xa;
pub const DEFAULT_AWQOS_HIGH: u8 = 0xc;

/// Everything the engine reads from the device tree node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeviceTreeConfig {
    /// Enables rounded corner masking with this radius in pixels.
    pub corner_radius: Option<u32>,
    pub qos: Option<QosConfig>,
    /// Reserved memory region that receives write-back frames.
    pub wb_memory: Option<ReservedMemory>,
    /// Name of the backlight device used by CABC.
    pub backlight: Option<String>,
    /// Panel name handed over by the bootloader. Selects the DSC preset.
    pub lcd_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct QosConfig {
    pub arqos_low: Option<u8>,
    pub arqos_high: Option<u8>,
    pub awqos_low: Option<u8>,
    pub awqos_high: Option<u8>,
}

/// AXI priorities with defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qos {
    pub arqos_low: u8,
    pub arqos_high: u8,
    pub awqos_low: u8,
    pub awqos_high: u8,
}

impl Default for Qos {
    fn default() -> Self {
        Self {
            arqos_low: DEFAULT_ARQOS_LOW,
            arqos_high: DEFAULT_ARQOS_HIGH,
            awqos_low: DEFAULT_AWQOS_LOW,
            awqos_high: DEFAULT_AWQOS_HIGH,
        }
    }
}

impl Qos {
    /// Resolves the optional node, warning for each value that falls back.
    pub fn from_config(cfg: Option<&QosConfig>) -> Self {
        let Some(cfg) = cfg else {
            warn!("can't find dpu qos cfg node, use default");
            return Self::default();
        };
        let pick = |value: Option<u8>, default: u8, name: &str| {
            value.unwrap_or_else(|| {
                warn!("read {} failed, use default", name);
                default
            })
        };
        Self {
            arqos_low: pick(cfg.arqos_low, DEFAULT_ARQOS_LOW, "arqos-low"),
            arqos_high: pick(cfg.arqos_high, DEFAULT_ARQOS_HIGH, "arqos-high"),
            awqos_low: pick(cfg.awqos_low, DEFAULT_AWQOS_LOW, "awqos-low"),
            awqos_high: pick(cfg.awqos_high, DEFAULT_AWQOS_HIGH, "awqos-high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReservedMemory {
    pub base: u32,
    pub size: u64,
}

/// Driver tunables. All of them have defaults so a partial table is fine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModuleParams {
    /// Delay after connecting the secure session, in microseconds.
    pub time: u32,
    /// Route every layer through the secure world.
    pub secure_debug: bool,
    /// Compress write-back frames.
    pub wb_xfbc_en: bool,
    /// Vsyncs to wait after a flip before capturing it.
    pub max_vsync_count: u32,
    /// Delay before a CABC backlight update is applied, in milliseconds.
    pub cabc_bl_set_delay: u32,
    pub cabc_state: CabcState,
    pub frame_no: u32,
    /// Fill 3D-LUT entry `j` from `r[j]/g[j]/b[j]` instead of repeating the
    /// per sub-table value.
    pub lut3d_entry_indexed: bool,
}

impl Default for ModuleParams {
    fn default() -> Self {
        Self {
            time: 5000,
            secure_debug: false,
            wb_xfbc_en: false,
            max_vsync_count: 0,
            cabc_bl_set_delay: 0,
            cabc_state: CabcState::Disabled,
            frame_no: 0,
            lut3d_entry_indexed: false,
        }
    }
}

/// A tunable changed on a running engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleParam {
    Time(u32),
    SecureDebug(bool),
    MaxVsyncCount(u32),
    CabcBlSetDelay(u32),
}

/// Maps the worst layer overlap to a core clock hint in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DvfsTable {
    /// Two or fewer overlapping layers.
    pub low: u32,
    pub three: u32,
    pub four: u32,
    /// Five or more.
    pub high: u32,
}

impl Default for DvfsTable {
    fn default() -> Self {
        Self {
            low: 384_000_000,
            three: 409_600_000,
            four: 51_200_000,
            high: 614_400_000,
        }
    }
}

impl DvfsTable {
    pub fn frequency(&self, overlaps: usize) -> u32 {
        match overlaps {
            0..=2 => self.low,
            3 => self.three,
            4 => self.four,
            _ => self.high,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DpuConfig {
    pub device_tree: DeviceTreeConfig,
    pub params: ModuleParams,
    pub dvfs: DvfsTable,
}

impl DpuConfig {
    pub fn from_toml(s: &str) -> DpuResult<Self> {
        toml::from_str(s).map_err(|e| DpuError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> DpuResult<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DpuError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&s)
    }
}
