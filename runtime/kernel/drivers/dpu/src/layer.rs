// Licensed under the Apache-2.0 license

//! Composition layers and their translation into layer slot register
//! images.

use crate::error::{DpuError, DpuResult};
use bitflags::bitflags;
use log::{debug, error};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use registers_dpu::bits::LayerCtrl;
use registers_dpu::regs::LayerReg;
use std::fmt;
use strum_macros::EnumIter;
use tock_registers::LocalRegisterCopy;

/// Control word of a palette (solid color) layer.
pub const PALLETE_LAYER_CTRL: u32 = 0x2005;

/// A DRM fourcc pixel format code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrmFormat(pub u32);

const fn fourcc(code: &[u8; 4]) -> DrmFormat {
    DrmFormat(
        code[0] as u32 | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24,
    )
}

impl DrmFormat {
    pub const XRGB8888: Self = fourcc(b"XR24");
    pub const XBGR8888: Self = fourcc(b"XB24");
    pub const ARGB8888: Self = fourcc(b"AR24");
    pub const ABGR8888: Self = fourcc(b"AB24");
    pub const RGBA8888: Self = fourcc(b"RA24");
    pub const BGRA8888: Self = fourcc(b"BA24");
    pub const RGBX8888: Self = fourcc(b"RX24");
    pub const BGRX8888: Self = fourcc(b"BX24");
    pub const RGB565: Self = fourcc(b"RG16");
    pub const BGR565: Self = fourcc(b"BG16");
    pub const NV12: Self = fourcc(b"NV12");
    pub const NV21: Self = fourcc(b"NV21");
    pub const NV16: Self = fourcc(b"NV16");
    pub const NV61: Self = fourcc(b"NV61");
    pub const YUV420: Self = fourcc(b"YU12");

    /// Bytes per pixel of the first plane, 0 for unknown formats.
    pub fn cpp(self) -> u32 {
        match self {
            Self::XRGB8888
            | Self::XBGR8888
            | Self::ARGB8888
            | Self::ABGR8888
            | Self::RGBA8888
            | Self::BGRA8888
            | Self::RGBX8888
            | Self::BGRX8888 => 4,
            Self::RGB565 | Self::BGR565 => 2,
            Self::NV12 | Self::NV21 | Self::NV16 | Self::NV61 | Self::YUV420 => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for DrmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.to_le_bytes() {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DrmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrmFormat({})", self)
    }
}

bitflags! {
    /// DRM plane rotation property.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct DrmRotation: u32 {
        const ROTATE_0 = 1 << 0;
        const ROTATE_90 = 1 << 1;
        const ROTATE_180 = 1 << 2;
        const ROTATE_270 = 1 << 3;
        const REFLECT_X = 1 << 4;
        const REFLECT_Y = 1 << 5;
    }
}

/// Rotation codes understood by the layer control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, EnumIter)]
#[repr(u32)]
pub enum DpuRotation {
    Rot0 = 0,
    Rot90 = 1,
    Rot180 = 2,
    Rot270 = 3,
    Rot0Mirror = 4,
    Rot90Mirror = 5,
    Rot180Mirror = 6,
    Rot270Mirror = 7,
}

impl DpuRotation {
    /// Maps a DRM rotation. Combinations the hardware cannot do are logged
    /// and fall back to no rotation.
    pub fn from_drm(rotation: DrmRotation) -> Self {
        const R90_Y: u32 = DrmRotation::REFLECT_Y.bits() | DrmRotation::ROTATE_90.bits();
        const R90_X: u32 = DrmRotation::REFLECT_X.bits() | DrmRotation::ROTATE_90.bits();
        match rotation.bits() {
            0 => Self::Rot0,
            b if b == DrmRotation::ROTATE_0.bits() => Self::Rot0,
            b if b == DrmRotation::ROTATE_90.bits() => Self::Rot90,
            b if b == DrmRotation::ROTATE_180.bits() => Self::Rot180,
            b if b == DrmRotation::ROTATE_270.bits() => Self::Rot270,
            b if b == DrmRotation::REFLECT_Y.bits() => Self::Rot180Mirror,
            R90_Y => Self::Rot90Mirror,
            b if b == DrmRotation::REFLECT_X.bits() => Self::Rot0Mirror,
            R90_X => Self::Rot270Mirror,
            b => {
                error!("rotation convert unsupport angle (drm)= 0x{:x}", b);
                Self::Rot0
            }
        }
    }

    /// Rotations that exchange width and height.
    pub fn is_transposed(self) -> bool {
        matches!(
            self,
            Self::Rot90 | Self::Rot270 | Self::Rot90Mirror | Self::Rot270Mirror
        )
    }
}

/// DRM plane blend modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, EnumIter)]
#[repr(u32)]
pub enum BlendMode {
    #[default]
    Premulti = 0,
    Coverage = 1,
    PixelNone = 2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// `w | h << 16`
    pub fn size_word(&self) -> u32 {
        (self.w & 0xffff) | (self.h << 16)
    }

    /// `x | y << 16`
    pub fn pos_word(&self) -> u32 {
        (self.x & 0xffff) | (self.y << 16)
    }
}

/// One plane of a flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Slot index; also the z-order.
    pub index: usize,
    pub planes: usize,
    pub addr: [u32; 4],
    pub pitch: [u32; 4],
    pub src: Rect,
    pub dst: Rect,
    pub format: DrmFormat,
    pub blending: BlendMode,
    pub rotation: DrmRotation,
    pub xfbc: bool,
    pub header_size_r: u32,
    pub y2r_coef: u32,
    pub alpha: u32,
    pub pallete_en: bool,
    pub pallete_color: u32,
    pub secure_en: bool,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            index: 0,
            planes: 1,
            addr: [0; 4],
            pitch: [0; 4],
            src: Rect::default(),
            dst: Rect::default(),
            format: DrmFormat::ARGB8888,
            blending: BlendMode::default(),
            rotation: DrmRotation::ROTATE_0,
            xfbc: false,
            header_size_r: 0,
            y2r_coef: 0,
            alpha: 0xff,
            pallete_en: false,
            pallete_color: 0,
            secure_en: false,
        }
    }
}

/// Control word for an image layer. Unknown formats are logged and leave
/// the format field zero.
pub fn img_ctrl(
    format: DrmFormat,
    blending: BlendMode,
    compression: bool,
    y2r_coef: u32,
    rotation: DrmRotation,
) -> u32 {
    let mut ctrl = LocalRegisterCopy::<u32, LayerCtrl::Register>::new(0);
    let argb = if compression {
        LayerCtrl::FORMAT::XfbcArgb8888
    } else {
        LayerCtrl::FORMAT::Argb8888
    };
    let rgb565 = if compression {
        LayerCtrl::FORMAT::XfbcRgb565
    } else {
        LayerCtrl::FORMAT::Rgb565
    };
    let yuv420 = if compression {
        LayerCtrl::FORMAT::XfbcYuv420
    } else {
        LayerCtrl::FORMAT::Yuv420TwoPlane
    };

    match format {
        DrmFormat::BGRA8888 => ctrl.modify(LayerCtrl::Y_ENDIAN::B3B2B1B0 + argb),
        DrmFormat::RGBX8888 | DrmFormat::RGBA8888 => {
            ctrl.modify(LayerCtrl::Y_ENDIAN::B3B2B1B0 + LayerCtrl::RB_SWITCH::SET + argb)
        }
        DrmFormat::ABGR8888 | DrmFormat::XBGR8888 => {
            ctrl.modify(LayerCtrl::RB_SWITCH::SET + argb)
        }
        DrmFormat::ARGB8888 | DrmFormat::XRGB8888 => ctrl.modify(argb),
        DrmFormat::BGR565 => ctrl.modify(LayerCtrl::RB_SWITCH_565::SET + rgb565),
        DrmFormat::RGB565 => ctrl.modify(rgb565),
        DrmFormat::NV12 => ctrl.modify(
            yuv420 + LayerCtrl::Y_ENDIAN::B0B1B2B3 + LayerCtrl::UV_ENDIAN::B0B1B2B3,
        ),
        DrmFormat::NV21 => ctrl.modify(
            yuv420 + LayerCtrl::Y_ENDIAN::B0B1B2B3 + LayerCtrl::UV_ENDIAN::B3B2B1B0,
        ),
        DrmFormat::NV16 => ctrl.modify(
            LayerCtrl::FORMAT::Yuv422TwoPlane
                + LayerCtrl::Y_ENDIAN::B3B2B1B0
                + LayerCtrl::UV_ENDIAN::B3B2B1B0,
        ),
        DrmFormat::NV61 => ctrl.modify(
            LayerCtrl::FORMAT::Yuv422TwoPlane
                + LayerCtrl::Y_ENDIAN::B0B1B2B3
                + LayerCtrl::UV_ENDIAN::B0B1B2B3,
        ),
        DrmFormat::YUV420 => ctrl.modify(
            LayerCtrl::FORMAT::Yuv420ThreePlane
                + LayerCtrl::Y_ENDIAN::B0B1B2B3
                + LayerCtrl::UV_ENDIAN::B0B1B2B3,
        ),
        other => error!("error: invalid format {}", other),
    }

    match blending {
        BlendMode::PixelNone => ctrl.modify(LayerCtrl::ALPHA_LAYER::SET),
        BlendMode::Coverage => {
            ctrl.modify(LayerCtrl::ALPHA_COMBO::SET + LayerCtrl::PREMULTI::CLEAR)
        }
        BlendMode::Premulti => ctrl.modify(LayerCtrl::ALPHA_COMBO::SET + LayerCtrl::PREMULTI::SET),
    }

    let rot: u32 = DpuRotation::from_drm(rotation).into();
    ctrl.modify(LayerCtrl::Y2R_COEF.val(y2r_coef) + LayerCtrl::ROTATION.val(rot & 0x7));
    ctrl.get()
}

impl Layer {
    /// Builds the register image of this layer's slot.
    pub fn to_reg(&self) -> DpuResult<LayerReg> {
        let mut reg = LayerReg {
            pos: self.dst.pos_word(),
            src_size: self.src.size_word(),
            dst_size: self.dst.size_word(),
            alpha: self.alpha,
            ..Default::default()
        };

        if self.pallete_en {
            reg.pallete = self.pallete_color;
            reg.ctrl = PALLETE_LAYER_CTRL;
            debug!(
                "dst_x = {}, dst_y = {}, dst_w = {}, dst_h = {}, pallete:{}",
                self.dst.x, self.dst.y, self.dst.w, self.dst.h, reg.pallete
            );
            return Ok(reg);
        }

        let mut ctrl = LocalRegisterCopy::<u32, LayerCtrl::Register>::new(0);
        if reg.src_size != reg.dst_size {
            if DpuRotation::from_drm(self.rotation).is_transposed() {
                reg.dst_size = (self.dst.h & 0xffff) | (self.dst.w << 16);
            }
            ctrl.modify(LayerCtrl::SCALE_EN::SET);
        }

        for (i, (dst, &addr)) in reg
            .addr
            .iter_mut()
            .zip(self.addr.iter())
            .take(self.planes.min(4))
            .enumerate()
        {
            if addr % 16 != 0 {
                error!("layer addr[{}] is not 16 bytes align, it's 0x{:08x}", i, addr);
            }
            *dst = addr;
        }

        reg.crop_start = (self.src.y << 16) | self.src.x;

        let cpp = self.format.cpp();
        if cpp == 0 {
            error!("layer[{}] bytes per pixel is invalid", self.index);
            return Err(DpuError::InvalidLayer {
                index: self.index,
                reason: "bytes per pixel is invalid",
            });
        }
        let pitch = self.pitch[0] / cpp;
        reg.pitch = if self.planes == 3 {
            // chroma pitch lives in the upper field
            pitch | (pitch << 15)
        } else {
            pitch
        };

        reg.ctrl = ctrl.get()
            | img_ctrl(
                self.format,
                self.blending,
                self.xfbc,
                self.y2r_coef,
                self.rotation,
            );
        Ok(reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_format_names() {
        assert_eq!(DrmFormat::XRGB8888.0, 0x3432_5258);
        assert_eq!(DrmFormat::NV12.to_string(), "NV12");
        assert_eq!(DrmFormat(0).cpp(), 0);
    }

    #[test]
    fn test_rotation_mapping() {
        let table = [
            (0, DpuRotation::Rot0),
            (DrmRotation::ROTATE_0.bits(), DpuRotation::Rot0),
            (DrmRotation::ROTATE_90.bits(), DpuRotation::Rot90),
            (DrmRotation::ROTATE_180.bits(), DpuRotation::Rot180),
            (DrmRotation::ROTATE_270.bits(), DpuRotation::Rot270),
            (DrmRotation::REFLECT_Y.bits(), DpuRotation::Rot180Mirror),
            (0x22, DpuRotation::Rot90Mirror),
            (DrmRotation::REFLECT_X.bits(), DpuRotation::Rot0Mirror),
            (0x12, DpuRotation::Rot270Mirror),
            (0x30, DpuRotation::Rot0),
        ];
        for (drm, expected) in table {
            assert_eq!(
                DpuRotation::from_drm(DrmRotation::from_bits_retain(drm)),
                expected,
                "drm rotation 0x{:x}",
                drm
            );
        }
    }

    #[test]
    fn test_img_ctrl_table() {
        let r0 = DrmRotation::ROTATE_0;
        let table = [
            (DrmFormat::ARGB8888, BlendMode::Premulti, false, 0x0001_0038),
            (DrmFormat::ARGB8888, BlendMode::Premulti, true, 0x0001_0088),
            (DrmFormat::XRGB8888, BlendMode::PixelNone, false, 0x0000_0034),
            (DrmFormat::BGRA8888, BlendMode::Coverage, false, 0x0000_0338),
            (DrmFormat::RGBA8888, BlendMode::Premulti, false, 0x0001_0738),
            (DrmFormat::RGBX8888, BlendMode::PixelNone, true, 0x0000_0784),
            (DrmFormat::ABGR8888, BlendMode::Coverage, false, 0x0000_0438),
            (DrmFormat::XBGR8888, BlendMode::PixelNone, false, 0x0000_0434),
            (DrmFormat::RGB565, BlendMode::PixelNone, false, 0x0000_0044),
            (DrmFormat::BGR565, BlendMode::PixelNone, true, 0x0000_1094),
            (DrmFormat::NV12, BlendMode::PixelNone, false, 0x0000_0014),
            (DrmFormat::NV12, BlendMode::PixelNone, true, 0x0000_00a4),
            (DrmFormat::NV21, BlendMode::PixelNone, false, 0x0000_0c14),
            (DrmFormat::NV16, BlendMode::PixelNone, false, 0x0000_0f04),
            (DrmFormat::NV61, BlendMode::PixelNone, false, 0x0000_0004),
            (DrmFormat::YUV420, BlendMode::PixelNone, false, 0x0000_0024),
            (DrmFormat::BGRX8888, BlendMode::PixelNone, false, 0x0000_0004),
        ];
        for (format, blend, xfbc, expected) in table {
            assert_eq!(
                img_ctrl(format, blend, xfbc, 0, r0),
                expected,
                "{} {:?} xfbc={}",
                format,
                blend,
                xfbc
            );
        }
    }

    #[test]
    fn test_img_ctrl_rotation_and_coef_fields() {
        for rot in DpuRotation::iter() {
            let drm = match rot {
                DpuRotation::Rot0 => DrmRotation::ROTATE_0,
                DpuRotation::Rot90 => DrmRotation::ROTATE_90,
                DpuRotation::Rot180 => DrmRotation::ROTATE_180,
                DpuRotation::Rot270 => DrmRotation::ROTATE_270,
                DpuRotation::Rot0Mirror => DrmRotation::REFLECT_X,
                DpuRotation::Rot90Mirror => DrmRotation::REFLECT_Y | DrmRotation::ROTATE_90,
                DpuRotation::Rot180Mirror => DrmRotation::REFLECT_Y,
                DpuRotation::Rot270Mirror => DrmRotation::REFLECT_X | DrmRotation::ROTATE_90,
            };
            for blend in BlendMode::iter() {
                let word = img_ctrl(DrmFormat::NV12, blend, false, 5, drm);
                assert_eq!(word, img_ctrl(DrmFormat::NV12, blend, false, 5, drm));
                assert_eq!((word >> 20) & 0x7, u32::from(rot));
                assert_eq!(word >> 28, 5);
            }
        }
    }

    #[test]
    fn test_pallete_layer_image() {
        let layer = Layer {
            index: 2,
            pallete_en: true,
            dst: Rect::new(10, 10, 100, 50),
            alpha: 0xff,
            pallete_color: 0x336699,
            addr: [0x1000, 0x2000, 0, 0],
            ..Default::default()
        };
        let reg = layer.to_reg().unwrap();
        assert_eq!(reg.ctrl, 0x2005);
        assert_eq!(reg.pos, 10 | (10 << 16));
        assert_eq!(reg.dst_size, 100 | (50 << 16));
        assert_eq!(reg.pallete, 0x336699);
        assert_eq!(reg.addr, [0; 4]);
    }

    #[test]
    fn test_transposed_scaling_swaps_destination() {
        let mut layer = Layer {
            src: Rect::new(0, 0, 100, 200),
            dst: Rect::new(0, 0, 300, 150),
            pitch: [400, 0, 0, 0],
            ..Default::default()
        };
        for (rotation, swapped) in [
            (DrmRotation::ROTATE_90, true),
            (DrmRotation::ROTATE_270, true),
            (DrmRotation::REFLECT_Y | DrmRotation::ROTATE_90, true),
            (DrmRotation::REFLECT_X | DrmRotation::ROTATE_90, true),
            (DrmRotation::ROTATE_0, false),
            (DrmRotation::ROTATE_180, false),
            (DrmRotation::REFLECT_X, false),
        ] {
            layer.rotation = rotation;
            let reg = layer.to_reg().unwrap();
            let expected = if swapped {
                150 | (300 << 16)
            } else {
                300 | (150 << 16)
            };
            assert_eq!(reg.dst_size, expected, "{:?}", rotation);
            assert_ne!(reg.ctrl & (1 << 24), 0);
        }

        // Same size never scales or swaps.
        layer.dst = Rect::new(0, 0, 100, 200);
        layer.rotation = DrmRotation::ROTATE_90;
        let reg = layer.to_reg().unwrap();
        assert_eq!(reg.dst_size, 100 | (200 << 16));
        assert_eq!(reg.ctrl & (1 << 24), 0);
    }

    #[test]
    fn test_image_layer_pitch_and_crop() {
        let layer = Layer {
            planes: 3,
            format: DrmFormat::YUV420,
            addr: [0x1000, 0x2000, 0x3000, 0],
            pitch: [720, 360, 360, 0],
            src: Rect::new(4, 8, 720, 480),
            dst: Rect::new(0, 0, 720, 480),
            ..Default::default()
        };
        let reg = layer.to_reg().unwrap();
        assert_eq!(reg.pitch, 720 | (720 << 15));
        assert_eq!(reg.crop_start, (8 << 16) | 4);
        assert_eq!(reg.addr, [0x1000, 0x2000, 0x3000, 0]);

        let rgb = Layer {
            pitch: [4 * 1080, 0, 0, 0],
            ..Default::default()
        };
        assert_eq!(rgb.to_reg().unwrap().pitch, 1080);
    }

    #[test]
    fn test_zero_cpp_layer_is_rejected() {
        let layer = Layer {
            index: 4,
            format: DrmFormat(0x2020_2020),
            ..Default::default()
        };
        assert!(matches!(
            layer.to_reg(),
            Err(DpuError::InvalidLayer { index: 4, .. })
        ));
    }
}
