// Licensed under the Apache-2.0 license

//! Display stream compression presets and programming.

use super::ctrl::{size, timing};
use crate::error::DpuResult;
use crate::regs::DpuRegs;
use crate::VideoMode;
use log::{info, warn};
use registers_dpu::regs::{
    dsc_cfg, DSC0, DSC1, DSC_CFG_WORDS, DSC_CTRL, DSC_GRP_SIZE, DSC_H_TIMING, DSC_PIC_SIZE,
    DSC_SLICE_SIZE, DSC_V_TIMING,
};

const DSC_CTRL_VIDEO: u32 = 0x2000_000b;
const DSC_CTRL_COMMAND: u32 = 0x2000_010b;

/// Words shared by every preset. Slots 1 and 2 are filled per mode.
const DSC_CFG_COMMON: [u32; DSC_CFG_WORDS] = [
    0x306c_81db,
    0,
    0,
    0x1218_1800,
    0x0033_16b6,
    0x382a_1c0e,
    0x6962_5446,
    0x7b79_7770,
    0x0000_7e7d,
    0x0100_0102,
    0x09be_0940,
    0x19fa_19fc,
    0x1a38_19f8,
    0x1ab6_1a78,
    0x2b34_2af6,
    0x3b74_2b74,
    0x0000_6bf4,
];

/// Per panel compression settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DscPreset {
    pub enabled: bool,
    pub dual_dsi: bool,
    pub mode: u32,
}

struct PanelPreset {
    name: &'static str,
    dual_dsi: bool,
    mode: u32,
}

const PANEL_PRESETS: &[PanelPreset] = &[
    PanelPreset {
        name: "lcd_nt35597_boe_mipi_qhd",
        dual_dsi: false,
        mode: 0,
    },
    PanelPreset {
        name: "lcd_nt57860_boe_mipi_qhd",
        dual_dsi: true,
        mode: 2,
    },
    PanelPreset {
        name: "lcd_nt36672c_truly_mipi_fhd",
        dual_dsi: false,
        mode: 1,
    },
];

impl DscPreset {
    /// Picks the preset for the panel the bootloader reported.
    pub fn for_panel(lcd_name: Option<&str>) -> Self {
        let found = lcd_name.and_then(|name| PANEL_PRESETS.iter().find(|p| p.name == name));
        match found {
            Some(p) => {
                info!("dsc enabled for {}, mode {}", p.name, p.mode);
                Self {
                    enabled: true,
                    dual_dsi: p.dual_dsi,
                    mode: p.mode,
                }
            }
            None => {
                warn!("no found compatible, use dsc off");
                Self::default()
            }
        }
    }

    /// `(grp_size, slice_size, cfg1, cfg2)` for the mode.
    fn mode_words(&self) -> (u32, u32, u32, u32) {
        match self.mode {
            1 => (0x0008_00b4, 0x0500_05a0, 0x0007_009b, 0x0cb7_0db7),
            2 => (0x0008_00f0, 0x0100_0780, 0x000a_00b1, 0x0989_0db7),
            _ => (0x0000_00f0, 0x0409_6000, 0x000a_e4bd, 0x0008_000a),
        }
    }

    fn program_instance(
        &self,
        regs: &DpuRegs,
        base: u32,
        vm: &VideoMode,
        command_mode: bool,
    ) -> DpuResult<()> {
        let div = if self.dual_dsi { 2 } else { 1 };
        let (grp, slice, cfg1, cfg2) = self.mode_words();

        regs.write(base + DSC_PIC_SIZE, size(vm.hactive / div, vm.vactive))?;
        regs.write(base + DSC_GRP_SIZE, grp)?;
        regs.write(base + DSC_SLICE_SIZE, slice)?;
        regs.write(
            base + DSC_H_TIMING,
            timing(vm.hsync_len / div, vm.hback_porch / div, vm.hfront_porch / div),
        )?;
        regs.write(
            base + DSC_V_TIMING,
            timing(vm.vsync_len, vm.vback_porch, vm.vfront_porch),
        )?;

        let mut words = DSC_CFG_COMMON;
        words[1] = cfg1;
        words[2] = cfg2;
        for (n, word) in words.iter().enumerate() {
            regs.write(dsc_cfg(base, n), *word)?;
        }

        let ctrl = if command_mode {
            DSC_CTRL_COMMAND
        } else {
            DSC_CTRL_VIDEO
        };
        regs.write(base + DSC_CTRL, ctrl)
    }

    /// Programs the compressor for `vm`. A dual-link panel in mode 2 drives
    /// both instances with the same settings.
    pub fn program(&self, regs: &DpuRegs, vm: &VideoMode, command_mode: bool) -> DpuResult<()> {
        self.program_instance(regs, DSC0, vm, command_mode)?;
        if self.dual_dsi && self.mode == 2 {
            self.program_instance(regs, DSC1, vm, command_mode)?;
        }
        Ok(())
    }
}
