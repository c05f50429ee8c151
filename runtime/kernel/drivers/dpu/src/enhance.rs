// Licensed under the Apache-2.0 license

//! Picture quality parameters, their register packing and the cache that
//! lets them survive a power cycle.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use registers_dpu::bits::{HsvCfg, HsvEntry, RgbEntry};
use registers_dpu::EnhanceModules;
use serde::Deserialize;
use std::fmt;
use strum_macros::EnumIter;
use tock_registers::LocalRegisterCopy;

pub const GAMMA_ENTRIES: usize = 256;
pub const HSV_TABLES: usize = 4;
pub const HSV_ENTRIES: usize = 64;
pub const LUT3D_TABLES: usize = 8;
pub const LUT3D_ENTRIES: usize = 729;
pub const SLP_LUT_ENTRIES: usize = 256;
pub const SLP_PARAMS: usize = 39;

/// CABC mode bits accepted by [`EnhanceParam::CabcMode`].
pub const CABC_MODE_UI: u32 = 1 << 2;
pub const CABC_MODE_GAME: u32 = 1 << 3;
pub const CABC_MODE_VIDEO: u32 = 1 << 4;
pub const CABC_MODE_IMAGE: u32 = 1 << 5;
pub const CABC_MODE_CAMERA: u32 = 1 << 6;
pub const CABC_MODE_FULL_FRAME: u32 = 1 << 7;

/// Identifiers of the enhancement settings, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, EnumIter)]
#[repr(u32)]
pub enum EnhanceId {
    Enable = 0,
    Disable,
    Scl,
    Epf,
    Hsv,
    Cm,
    Slp,
    Gamma,
    Ltm,
    CabcParam,
    SlpLut,
    Lut3d,
    SrEpf,
    CabcMode,
    CabcHist,
    CabcCurBl,
    CabcHistV2,
    CabcRun,
    CabcState,
    Ud,
    UpdateLuts,
    FrameNo,
    VsyncCount,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Deserialize,
)]
#[repr(u32)]
pub enum CabcState {
    Working = 0,
    Stopping = 1,
    #[default]
    Disabled = 2,
}

impl fmt::Display for CabcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Super resolution input size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleCfg {
    pub in_w: u32,
    pub in_h: u32,
}

impl ScaleCfg {
    pub fn blend_size(&self) -> u32 {
        (self.in_h << 16) | self.in_w
    }

    pub fn from_blend_size(val: u32) -> Self {
        Self {
            in_w: val & 0xffff,
            in_h: val >> 16,
        }
    }
}

/// Edge preserving filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpfCfg {
    pub epsilon: [u16; 2],
    pub gain: [u8; 8],
    pub diff: [u8; 2],
}

impl EpfCfg {
    /// Words for the epsilon, gain0-3, gain4-7 and diff registers.
    pub fn pack(&self) -> [u32; 4] {
        let g = |i: usize| u32::from_le_bytes([self.gain[i], self.gain[i + 1], self.gain[i + 2], self.gain[i + 3]]);
        [
            (self.epsilon[1] as u32) << 16 | self.epsilon[0] as u32,
            g(0),
            g(4),
            (self.diff[1] as u32) << 8 | self.diff[0] as u32,
        ]
    }

    pub fn unpack(words: [u32; 4]) -> Self {
        let [g0, g1, g2, g3] = words[1].to_le_bytes();
        let [g4, g5, g6, g7] = words[2].to_le_bytes();
        Self {
            epsilon: [words[0] as u16, (words[0] >> 16) as u16],
            gain: [g0, g1, g2, g3, g4, g5, g6, g7],
            diff: [words[3] as u8, (words[3] >> 8) as u8],
        }
    }
}

/// 3x4 color matrix. Coefficients are 14 bits wide in hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CmCfg {
    pub coef: [[u16; 4]; 3],
}

impl CmCfg {
    pub fn pack(&self) -> [u32; 6] {
        let mut words = [0u32; 6];
        for (n, word) in words.iter_mut().enumerate() {
            let row = &self.coef[n / 2];
            let col = (n % 2) * 2;
            *word = (row[col + 1] as u32) << 16 | row[col] as u32;
        }
        words
    }

    pub fn unpack(words: [u32; 6]) -> Self {
        let mut cm = Self::default();
        for (n, word) in words.iter().enumerate() {
            let col = (n % 2) * 2;
            cm.coef[n / 2][col] = (word & 0x3fff) as u16;
            cm.coef[n / 2][col + 1] = ((word >> 16) & 0x3fff) as u16;
        }
        cm
    }
}

/// Where each tone curve parameter sits: (word, shift, mask).
const SLP_LAYOUT: [(usize, u32, u32); SLP_PARAMS] = [
    (0, 0, 0xffff),
    (0, 16, 0x7f),
    (1, 0, 0x7f),
    (1, 7, 0x7f),
    (1, 14, 0x7f),
    (1, 21, 0x7f),
    (2, 9, 0x7f),
    (2, 16, 0x3),
    (2, 18, 0x7f),
    (2, 25, 0x7f),
    (3, 3, 0xf),
    (3, 7, 0xf),
    (3, 11, 0xf),
    (3, 15, 0xf),
    (3, 19, 0xfff),
    (4, 0, 0xff),
    (4, 8, 0xff),
    (4, 16, 0xff),
    (4, 24, 0xff),
    (5, 0, 0xff),
    (5, 8, 0xff),
    (5, 16, 0xff),
    (5, 24, 0xff),
    (6, 0, 0xff),
    (6, 8, 0xff),
    (6, 16, 0xff),
    (6, 24, 0xff),
    (7, 5, 0x1ff),
    (7, 14, 0x1ff),
    (7, 23, 0x1ff),
    (8, 0, 0x1fff),
    (8, 14, 0x1ff),
    (8, 23, 0x1ff),
    (9, 6, 0x7f),
    (9, 13, 0xf),
    (9, 17, 0xff),
    (9, 25, 0x7f),
    (10, 0, 0xff),
    (10, 8, 0xff),
];

/// Index of the SLP word that also carries the local tone mapping setup.
pub const SLP_LTM_WORD: usize = 8;

/// Sunlight protector / local tone mapping curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlpCfg {
    pub params: [u16; SLP_PARAMS],
}

impl Default for SlpCfg {
    fn default() -> Self {
        Self {
            params: [0; SLP_PARAMS],
        }
    }
}

impl SlpCfg {
    /// CABC owns the last two parameters while it is working.
    pub fn with_cabc_override(mut self, state: CabcState) -> Self {
        if state == CabcState::Working {
            self.params[37] = 0;
            self.params[38] = 255;
        }
        self
    }

    pub fn pack(&self) -> [u32; 11] {
        let mut words = [0u32; 11];
        for (&(word, shift, mask), &value) in SLP_LAYOUT.iter().zip(self.params.iter()) {
            words[word] |= (value as u32 & mask) << shift;
        }
        words
    }

    pub fn unpack(words: [u32; 11]) -> Self {
        let mut slp = Self::default();
        for (&(word, shift, mask), value) in SLP_LAYOUT.iter().zip(slp.params.iter_mut()) {
            *value = ((words[word] >> shift) & mask) as u16;
        }
        slp
    }
}

/// Hue/saturation configuration word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HsvParams {
    pub h0: u16,
    pub h1: u16,
    pub h2: u16,
}

impl HsvParams {
    pub fn pack(&self) -> u32 {
        let mut reg = LocalRegisterCopy::<u32, HsvCfg::Register>::new(0);
        reg.modify(
            HsvCfg::H0.val(self.h0 as u32 & 0xff)
                + HsvCfg::H1.val(self.h1 as u32 & 0x3)
                + HsvCfg::H2.val(self.h2 as u32 & 0x3),
        );
        reg.get()
    }

    pub fn unpack(val: u32) -> Self {
        let reg = LocalRegisterCopy::<u32, HsvCfg::Register>::new(val);
        Self {
            h0: reg.read(HsvCfg::H0) as u16,
            h1: reg.read(HsvCfg::H1) as u16,
            h2: reg.read(HsvCfg::H2) as u16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvLutTable {
    pub s_g: [u16; HSV_ENTRIES],
    pub h_o: [u16; HSV_ENTRIES],
}

impl Default for HsvLutTable {
    fn default() -> Self {
        Self {
            s_g: [0; HSV_ENTRIES],
            h_o: [0; HSV_ENTRIES],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HsvLuts {
    pub tables: [HsvLutTable; HSV_TABLES],
}

pub fn pack_hsv_entry(h_o: u16, s_g: u16) -> u32 {
    let mut reg = LocalRegisterCopy::<u32, HsvEntry::Register>::new(0);
    reg.modify(HsvEntry::H_O.val(h_o as u32 & 0x7f) + HsvEntry::S_G.val(s_g as u32 & 0x1ff));
    reg.get()
}

/// Returns `(h_o, s_g)`.
pub fn unpack_hsv_entry(val: u32) -> (u16, u16) {
    let reg = LocalRegisterCopy::<u32, HsvEntry::Register>::new(val);
    (reg.read(HsvEntry::H_O) as u16, reg.read(HsvEntry::S_G) as u16)
}

pub fn pack_rgb_entry(r: u16, g: u16, b: u16) -> u32 {
    let mut reg = LocalRegisterCopy::<u32, RgbEntry::Register>::new(0);
    reg.modify(
        RgbEntry::R.val(r as u32 & 0x3ff)
            + RgbEntry::G.val(g as u32 & 0x3ff)
            + RgbEntry::B.val(b as u32 & 0x3ff),
    );
    reg.get()
}

/// Returns `(r, g, b)`.
pub fn unpack_rgb_entry(val: u32) -> (u16, u16, u16) {
    let reg = LocalRegisterCopy::<u32, RgbEntry::Register>::new(val);
    (
        reg.read(RgbEntry::R) as u16,
        reg.read(RgbEntry::G) as u16,
        reg.read(RgbEntry::B) as u16,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GammaLut {
    pub r: [u16; GAMMA_ENTRIES],
    pub g: [u16; GAMMA_ENTRIES],
    pub b: [u16; GAMMA_ENTRIES],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self {
            r: [0; GAMMA_ENTRIES],
            g: [0; GAMMA_ENTRIES],
            b: [0; GAMMA_ENTRIES],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreedLut {
    pub r: [u16; LUT3D_ENTRIES],
    pub g: [u16; LUT3D_ENTRIES],
    pub b: [u16; LUT3D_ENTRIES],
}

impl Default for ThreedLut {
    fn default() -> Self {
        Self {
            r: [0; LUT3D_ENTRIES],
            g: [0; LUT3D_ENTRIES],
            b: [0; LUT3D_ENTRIES],
        }
    }
}

impl ThreedLut {
    /// Value stored for entry `j` of sub-table `i`.
    pub fn entry(&self, i: usize, j: usize, entry_indexed: bool) -> u32 {
        let k = if entry_indexed { j } else { i };
        pack_rgb_entry(self.r[k], self.g[k], self.b[k])
    }
}

/// Ultra detail parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UdCfg {
    pub u: [u16; 6],
}

impl UdCfg {
    pub fn pack(&self) -> [u32; 2] {
        let word = |a: u16, b: u16, c: u16| {
            (a as u32 & 0xfff) | (b as u32 & 0x3f) << 16 | (c as u32 & 0x3f) << 24
        };
        [
            word(self.u[0], self.u[1], self.u[2]),
            word(self.u[3], self.u[4], self.u[5]),
        ]
    }

    pub fn unpack(words: [u32; 2]) -> Self {
        let mut ud = Self::default();
        for (n, w) in words.iter().enumerate() {
            ud.u[n * 3] = (w & 0xfff) as u16;
            ud.u[n * 3 + 1] = ((w >> 16) & 0x3f) as u16;
            ud.u[n * 3 + 2] = ((w >> 24) & 0x3f) as u16;
        }
        ud
    }
}

/// Calibration handed down by the CABC algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CabcParam {
    /// Backlight scale in 1/1020 units.
    pub bl_fix: u16,
    pub cfg: [u32; 5],
}

/// Runtime CABC bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CabcPara {
    pub bl_fix: u16,
    pub cur_bl: u16,
    pub cfg: [u32; 5],
    /// 0 UI, 1 full frame, 2 video.
    pub video_mode: u8,
}

/// Which LUT RAM slot a base register should point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutSelect {
    Gamma { index: u16 },
    Hsv { index: u16, params: HsvParams },
    /// `index` is `mode << 8 | sub_table` when decoding.
    Lut3d { index: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LutsUpdate {
    Select(LutSelect),
    /// One 2 KiB chunk of the whole LUT RAM image.
    All(Box<[u8; LUTS_CHUNK_SIZE]>),
}

pub const LUTS_CHUNK_SIZE: usize = 2048;

/// A setting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceParam {
    Enable(EnhanceModules),
    Disable(EnhanceModules),
    Scl(ScaleCfg),
    Epf(EpfCfg),
    Hsv(Box<HsvLuts>),
    Cm(CmCfg),
    Slp(SlpCfg),
    Ltm(SlpCfg),
    Gamma(Box<GammaLut>),
    Lut3d(Box<ThreedLut>),
    CabcMode(u32),
    CabcParam(CabcParam),
    CabcRun,
    CabcState(CabcState),
    Ud(UdCfg),
    UpdateLuts(LutsUpdate),
}

impl EnhanceParam {
    pub fn id(&self) -> EnhanceId {
        match self {
            Self::Enable(_) => EnhanceId::Enable,
            Self::Disable(_) => EnhanceId::Disable,
            Self::Scl(_) => EnhanceId::Scl,
            Self::Epf(_) => EnhanceId::Epf,
            Self::Hsv(_) => EnhanceId::Hsv,
            Self::Cm(_) => EnhanceId::Cm,
            Self::Slp(_) => EnhanceId::Slp,
            Self::Ltm(_) => EnhanceId::Ltm,
            Self::Gamma(_) => EnhanceId::Gamma,
            Self::Lut3d(_) => EnhanceId::Lut3d,
            Self::CabcMode(_) => EnhanceId::CabcMode,
            Self::CabcParam(_) => EnhanceId::CabcParam,
            Self::CabcRun => EnhanceId::CabcRun,
            Self::CabcState(_) => EnhanceId::CabcState,
            Self::Ud(_) => EnhanceId::Ud,
            Self::UpdateLuts(_) => EnhanceId::UpdateLuts,
        }
    }
}

/// Decoded contents of a LUT RAM slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LutsDump {
    Gamma(Box<GammaLut>),
    Hsv(Box<HsvLuts>),
    /// `(r, g, b)` of every entry of one sub-table.
    Lut3d(Vec<(u16, u16, u16)>),
}

/// A setting read back from hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceValue {
    Modules(EnhanceModules),
    Scl(ScaleCfg),
    Epf(EpfCfg),
    Hsv(HsvParams, Box<HsvLuts>),
    Cm(CmCfg),
    Slp(SlpCfg),
    Gamma(Box<GammaLut>),
    SlpLut(Vec<u32>),
    Lut3d(Vec<u32>),
    Ud(UdCfg),
    CabcHist(Vec<u32>),
    CabcCurBl(u16),
    VsyncCount(u32),
    FrameNo(u32),
    CabcState(CabcState),
    Luts(LutsDump),
}

/// Pending table of a LUT, or the slot its base register points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LutSource<T> {
    /// Cached before the LUT RAM existed; written to slot 0 on reload.
    Table(Box<T>),
    /// Physical address of a populated slot.
    Slot(u32),
}

/// Last requested value of every cacheable setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhanceCache {
    pub enhance_en: EnhanceModules,
    pub scale: ScaleCfg,
    pub epf: EpfCfg,
    pub cm: CmCfg,
    pub slp: SlpCfg,
    pub ud: UdCfg,
    pub hsv_cfg: u32,
    pub gamma: Option<LutSource<GammaLut>>,
    pub hsv: Option<LutSource<HsvLuts>>,
    pub lut3d: Option<LutSource<ThreedLut>>,
    pub lut_select: Option<LutSelect>,
}
