// Licensed under the Apache-2.0 license

//! Register offsets within the DPU block, relative to its base address.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const DPU_VERSION: u32 = 0x000;
pub const DPU_MODE: u32 = 0x004;
pub const DPU_CTRL: u32 = 0x008;
pub const DPU_CFG0: u32 = 0x00c;
pub const DPU_CFG1: u32 = 0x010;
pub const DPU_SECURE: u32 = 0x014;
pub const PANEL_SIZE: u32 = 0x018;
pub const BLEND_SIZE: u32 = 0x01c;
pub const SCL_EN: u32 = 0x020;
pub const BG_COLOR: u32 = 0x024;
pub const LAYER_ENABLE: u32 = 0x02c;

/// First layer slot.
pub const LAYERS: u32 = 0x030;
pub const LAYER_STRIDE: u32 = 0x40;
pub const LAYER_COUNT: usize = 8;
/// Slot reserved for replaying the write-back buffer.
pub const WB_LAYER_INDEX: usize = 7;

// Offsets inside one layer slot.
pub const LAYER_ADDR0: u32 = 0x00;
pub const LAYER_CTRL: u32 = 0x10;
pub const LAYER_DST_SIZE: u32 = 0x14;
pub const LAYER_SRC_SIZE: u32 = 0x18;
pub const LAYER_PITCH: u32 = 0x1c;
pub const LAYER_POS: u32 = 0x20;
pub const LAYER_ALPHA: u32 = 0x24;
pub const LAYER_CK: u32 = 0x28;
pub const LAYER_PALLETE: u32 = 0x2c;
pub const LAYER_CROP_START: u32 = 0x30;

pub const WB_BASE_ADDR: u32 = 0x230;
pub const WB_CTRL: u32 = 0x234;
pub const WB_CFG: u32 = 0x238;
pub const WB_PITCH: u32 = 0x23c;

pub const DPU_INT_EN: u32 = 0x250;
pub const DPU_INT_CLR: u32 = 0x254;
pub const DPU_INT_STS: u32 = 0x258;
pub const DPU_INT_RAW: u32 = 0x25c;

pub const DPI_CTRL: u32 = 0x260;
pub const DPI_H_TIMING: u32 = 0x264;
pub const DPI_V_TIMING: u32 = 0x268;

pub const SCL_COEF_HOR_CFG: u32 = 0x300;
pub const SCL_COEF_VER_CFG: u32 = 0x380;
pub const SCL_COEF_WORDS: usize = 32;

pub const CHECKSUM_EN: u32 = 0x4b0;
pub const CHECKSUM0_START_POS: u32 = 0x4b4;
pub const CHECKSUM0_END_POS: u32 = 0x4b8;
pub const CHECKSUM1_START_POS: u32 = 0x4bc;
pub const CHECKSUM1_END_POS: u32 = 0x4c0;
pub const CHECKSUM0_RESULT: u32 = 0x4c4;
pub const CHECKSUM1_RESULT: u32 = 0x4c8;

pub const CORNER_CONFIG: u32 = 0x4d0;
pub const TOP_CORNER_LUT_ADDR: u32 = 0x4d4;
pub const TOP_CORNER_LUT_WDATA: u32 = 0x4d8;
pub const TOP_CORNER_LUT_RDATA: u32 = 0x4dc;
pub const BOT_CORNER_LUT_ADDR: u32 = 0x4e0;
pub const BOT_CORNER_LUT_WDATA: u32 = 0x4e4;
pub const BOT_CORNER_LUT_RDATA: u32 = 0x4e8;

pub const NOTCH_CONFIG: u32 = 0x4f0;
pub const NOTCH_LUT_ADDR: u32 = 0x4f4;
pub const NOTCH_LUT_WDATA: u32 = 0x4f8;
pub const NOTCH_LUT_RDATA: u32 = 0x4fc;

pub const DPU_ENHANCE_CFG: u32 = 0x500;
pub const ENHANCE_UPDATE: u32 = 0x504;
pub const ENHANCE_STS: u32 = 0x508;

pub const SLP_LUT_BASE_ADDR: u32 = 0x510;
pub const THREED_LUT_BASE_ADDR: u32 = 0x514;
pub const HSV_LUT_BASE_ADDR: u32 = 0x518;
pub const GAMMA_LUT_BASE_ADDR: u32 = 0x51c;

pub const EPF_EPSILON: u32 = 0x520;
pub const EPF_GAIN0_3: u32 = 0x524;
pub const EPF_GAIN4_7: u32 = 0x528;
pub const EPF_DIFF: u32 = 0x52c;

/// Six color matrix words, two 16-bit coefficients each.
pub const CM_COEF01_00: u32 = 0x530;
pub const CM_COEF_WORDS: usize = 6;

/// Eleven tone curve words.
pub const SLP_CFG0: u32 = 0x550;
pub const SLP_CFG8: u32 = 0x570;
pub const SLP_CFG_WORDS: usize = 11;
pub const SW_TUNING_BTH_STEP: u32 = 0x57c;

pub const HSV_CFG: u32 = 0x580;

pub const CABC_CFG0: u32 = 0x590;
pub const CABC_CFG_WORDS: usize = 6;

pub const UD_CFG0: u32 = 0x5b0;
pub const UD_CFG1: u32 = 0x5b4;

pub const CABC_HIST: u32 = 0x600;
pub const CABC_HIST_WORDS: usize = 64;

pub const DPU_STS: u32 = 0x700;
pub const DPU_STS_WORDS: usize = 24;

pub const GAMMA_LUT_ADDR: u32 = 0x780;
pub const GAMMA_LUT_RDATA: u32 = 0x784;
pub const SLP_LUT_ADDR: u32 = 0x798;
pub const SLP_LUT_RDATA: u32 = 0x79c;
/// Four HSV read ports, each an address/data pair.
pub const HSV_LUT0_ADDR: u32 = 0x7a0;
pub const HSV_LUT0_RADDR: u32 = 0x7a4;
pub const HSV_LUT_PORTS: usize = 4;
/// Eight 3D-LUT read ports, each an address/data pair.
pub const THREED_LUT0_ADDR: u32 = 0x7c0;
pub const THREED_LUT0_RDATA: u32 = 0x7c4;
pub const THREED_LUT_PORTS: usize = 8;
pub const LUT_PORT_STRIDE: u32 = 8;

pub const MMU_INV_ADDR_RD: u32 = 0x185c;
pub const MMU_INV_ADDR_WR: u32 = 0x1860;
pub const MMU_UNS_ADDR_RD: u32 = 0x1864;
pub const MMU_UNS_ADDR_WR: u32 = 0x1868;
pub const MMU_INT_EN: u32 = 0x18a0;
pub const MMU_INT_CLR: u32 = 0x18a4;
pub const MMU_INT_STS: u32 = 0x18a8;
pub const MMU_INT_RAW: u32 = 0x18ac;

/// Base of the first display stream compression instance.
pub const DSC0: u32 = 0x1a00;
/// Base of the second instance, used by dual-link panels.
pub const DSC1: u32 = 0x1b00;

// Offsets inside one DSC instance.
pub const DSC_CTRL: u32 = 0x00;
pub const DSC_PIC_SIZE: u32 = 0x04;
pub const DSC_GRP_SIZE: u32 = 0x08;
pub const DSC_SLICE_SIZE: u32 = 0x0c;
pub const DSC_H_TIMING: u32 = 0x10;
pub const DSC_V_TIMING: u32 = 0x14;
pub const DSC_CFG0: u32 = 0x18;
pub const DSC_CFG_WORDS: usize = 17;
pub const DSC_STS0: u32 = 0x5c;
pub const DSC_STS1: u32 = 0x60;
pub const DSC_VERSION: u32 = 0x64;

/// Size of the whole register window.
pub const DPU_BLOCK_SIZE: u32 = 0x1c00;

/// Offset of layer slot `index`.
pub const fn layer_offset(index: usize) -> u32 {
    LAYERS + index as u32 * LAYER_STRIDE
}

/// Offset of color matrix word `n`.
pub const fn cm_coef(n: usize) -> u32 {
    CM_COEF01_00 + 4 * n as u32
}

/// Offset of tone curve word `n`.
pub const fn slp_cfg(n: usize) -> u32 {
    SLP_CFG0 + 4 * n as u32
}

pub const fn cabc_cfg(n: usize) -> u32 {
    CABC_CFG0 + 4 * n as u32
}

pub const fn cabc_hist(n: usize) -> u32 {
    CABC_HIST + 4 * n as u32
}

pub const fn hsv_lut_addr(port: usize) -> u32 {
    HSV_LUT0_ADDR + LUT_PORT_STRIDE * port as u32
}

pub const fn hsv_lut_raddr(port: usize) -> u32 {
    HSV_LUT0_RADDR + LUT_PORT_STRIDE * port as u32
}

pub const fn threed_lut_addr(port: usize) -> u32 {
    THREED_LUT0_ADDR + LUT_PORT_STRIDE * port as u32
}

pub const fn threed_lut_rdata(port: usize) -> u32 {
    THREED_LUT0_RDATA + LUT_PORT_STRIDE * port as u32
}

pub const fn dsc_cfg(base: u32, n: usize) -> u32 {
    base + DSC_CFG0 + 4 * n as u32
}

/// Register image of one layer slot. This is also the payload handed to
/// the secure world when a protected layer is programmed on our behalf.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct LayerReg {
    pub addr: [u32; 4],
    pub ctrl: u32,
    pub dst_size: u32,
    pub src_size: u32,
    pub pitch: u32,
    pub pos: u32,
    pub alpha: u32,
    pub ck: u32,
    pub pallete: u32,
    pub crop_start: u32,
    pub reserved: [u32; 3],
}

pub const LAYER_REG_SIZE: usize = core::mem::size_of::<LayerReg>();

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn test_layer_image_matches_slot_layout() {
        assert_eq!(LAYER_REG_SIZE, LAYER_STRIDE as usize);

        let layer = LayerReg {
            ctrl: 0x2005,
            pos: 0x000a_000a,
            crop_start: 0x55,
            ..Default::default()
        };
        let bytes = layer.as_bytes();
        let word = |off: u32| {
            let off = off as usize;
            u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
        };
        assert_eq!(word(LAYER_CTRL), 0x2005);
        assert_eq!(word(LAYER_POS), 0x000a_000a);
        assert_eq!(word(LAYER_CROP_START), 0x55);
    }

    #[test]
    fn test_block_layout() {
        assert_eq!(layer_offset(WB_LAYER_INDEX) + LAYER_STRIDE, WB_BASE_ADDR);
        assert_eq!(slp_cfg(8), SLP_CFG8);
        assert_eq!(slp_cfg(SLP_CFG_WORDS), SW_TUNING_BTH_STEP);
        assert_eq!(hsv_lut_raddr(3) + 4, 0x7c0);
        assert_eq!(threed_lut_rdata(7), 0x7fc);
        assert_eq!(dsc_cfg(DSC0, DSC_CFG_WORDS), DSC0 + DSC_STS0);
        assert!(DSC1 + DSC_VERSION < DPU_BLOCK_SIZE);
    }
}
