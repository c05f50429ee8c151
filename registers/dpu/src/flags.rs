// Licensed under the Apache-2.0 license

use bitflags::bitflags;

bitflags! {
    /// Sources of the single DPU interrupt line, as seen in the
    /// enable, clear, status and raw registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DpuIrq: u32 {
        const DONE = 1 << 0;
        const TE = 1 << 1;
        const ERR = 1 << 2;
        const EDPI_TE = 1 << 3;
        const DPI_VSYNC = 1 << 4;
        const WB_DONE = 1 << 5;
        const WB_FAIL = 1 << 6;
        const FBC_HDR_ERR = 1 << 7;
        const FBC_PLD_ERR = 1 << 8;
        const MMU0_STS = 1 << 14;
        const MMU1_STS = 1 << 15;
        const ALL_UPDATE_DONE = 1 << 16;
        const REG_UPDATE_DONE = 1 << 17;
        const LAY_REG_UPDATE_DONE = 1 << 18;
        const PQ_REG_UPDATE_DONE = 1 << 19;
        const PQ_LUT_UPDATE_DONE = 1 << 20;
        const HSV_LUT_UPDATE_DONE = 1 << 21;
        const SLP_LUT_UPDATE_DONE = 1 << 22;
        const GAMMA_LUT_UPDATE_DONE = 1 << 23;
        const LUT3D_UPDATE_DONE = 1 << 24;
    }
}

bitflags! {
    /// IOMMU fault sources.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MmuIrq: u32 {
        const VAOR_RD = 1 << 0;
        const VAOR_WR = 1 << 1;
        const INV_RD = 1 << 2;
        const INV_WR = 1 << 3;
        const UNS_RD = 1 << 4;
        const UNS_WR = 1 << 5;
        const PAOR_RD = 1 << 6;
        const PAOR_WR = 1 << 7;
    }
}

bitflags! {
    /// Picture quality blocks selected by the enhance configuration
    /// register. The same mask records which cached settings are live.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnhanceModules: u32 {
        const EPF = 1 << 0;
        const HSV = 1 << 1;
        const CM = 1 << 2;
        const GAMMA = 1 << 3;
        const LUT3D = 1 << 4;
        const DITHER = 1 << 5;
        const SLP = 1 << 6;
        const LTM = 1 << 7;
        const SLP_MASK = 1 << 8;
        const CABC = 1 << 9;
        const UD = 1 << 10;
        const UD_LOCAL = 1 << 11;
        const UD_MASK = 1 << 12;
        const SCL = 1 << 13;
    }
}

impl DpuIrq {
    /// Sources that are masked off after they fire and re-armed by the
    /// next flip.
    pub const FBC_ERR: Self = Self::FBC_HDR_ERR.union(Self::FBC_PLD_ERR);
}

impl EnhanceModules {
    /// Gamma is always enabled together with dithering.
    pub const GAMMA_DITHER: Self = Self::GAMMA.union(Self::DITHER);
    pub const UD_ALL: Self = Self::UD.union(Self::UD_LOCAL).union(Self::UD_MASK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_masks() {
        assert_eq!(DpuIrq::FBC_ERR.bits(), 0x180);
        assert_eq!(EnhanceModules::GAMMA_DITHER.bits(), 0x28);
        assert_eq!(EnhanceModules::UD_ALL.bits(), 0x1c00);
        assert_eq!(
            EnhanceModules::from_bits_retain(0xffff_ffff).bits(),
            0xffff_ffff
        );
    }
}
