// Licensed under the Apache-2.0 license

//! Coherent memory holding every lookup table the engine fetches by DMA.
//!
//! ```text
//! 0x00000  SLP curve
//! 0x01000  gamma slots, 4 KiB each
//! 0x03000  HSV slots, 4 KiB each
//! 0x06000  3D-LUT slots, 24 KiB each, up to the end of the region
//! ```

use crate::enhance::{
    pack_hsv_entry, pack_rgb_entry, unpack_hsv_entry, unpack_rgb_entry, GammaLut, HsvLuts,
    ThreedLut, GAMMA_ENTRIES, HSV_ENTRIES, HSV_TABLES, LUT3D_ENTRIES, LUT3D_TABLES,
    LUTS_CHUNK_SIZE,
};
use crate::error::{DpuError, DpuResult};
use crate::platform::{DmaAllocator, DmaBuffer};

pub const LUT_RAM_SIZE: usize = 29 * 4096;
pub const SLP_OFFSET: usize = 0;
pub const GAMMA_OFFSET: usize = 4096;
pub const HSV_OFFSET: usize = 3 * 4096;
pub const LUT3D_OFFSET: usize = 6 * 4096;
pub const GAMMA_SLOT_SIZE: usize = 4096;
pub const HSV_SLOT_SIZE: usize = 4096;
pub const LUT3D_SLOT_SIZE: usize = 6 * 4096;
pub const GAMMA_SLOTS: usize = (HSV_OFFSET - GAMMA_OFFSET) / GAMMA_SLOT_SIZE;
pub const HSV_SLOTS: usize = (LUT3D_OFFSET - HSV_OFFSET) / HSV_SLOT_SIZE;
pub const LUT3D_SLOTS: usize = (LUT_RAM_SIZE - LUT3D_OFFSET) / LUT3D_SLOT_SIZE;
/// Chunks covered by a whole image upload before the counter wraps.
pub const LUTS_CHUNKS: u32 = 58;

pub struct LutRam {
    buf: Box<dyn DmaBuffer>,
}

impl LutRam {
    pub fn alloc(dma: &dyn DmaAllocator) -> DpuResult<Self> {
        dma.alloc_coherent(LUT_RAM_SIZE)
            .map(|buf| Self { buf })
            .ok_or(DpuError::OutOfMemory("lut ram"))
    }

    pub fn phys_addr(&self) -> u32 {
        self.buf.phys_addr()
    }

    pub fn gamma_addr(&self, slot: usize) -> u32 {
        self.phys_addr() + (GAMMA_OFFSET + slot * GAMMA_SLOT_SIZE) as u32
    }

    pub fn hsv_addr(&self, slot: usize) -> u32 {
        self.phys_addr() + (HSV_OFFSET + slot * HSV_SLOT_SIZE) as u32
    }

    pub fn lut3d_addr(&self, slot: usize) -> u32 {
        self.phys_addr() + (LUT3D_OFFSET + slot * LUT3D_SLOT_SIZE) as u32
    }

    fn word_offset(&self, table: &'static str, region: usize, index: usize) -> DpuResult<usize> {
        let offset = region + index * 4;
        if offset + 4 > self.buf.len().min(LUT_RAM_SIZE) {
            return Err(DpuError::LutOutOfRange { table, index });
        }
        Ok(offset)
    }

    fn write_word(
        &self,
        table: &'static str,
        region: usize,
        index: usize,
        val: u32,
    ) -> DpuResult<()> {
        let offset = self.word_offset(table, region, index)?;
        Ok(self.buf.write_bytes(offset, &val.to_le_bytes())?)
    }

    fn read_word(&self, table: &'static str, region: usize, index: usize) -> DpuResult<u32> {
        let offset = self.word_offset(table, region, index)?;
        let mut bytes = [0u8; 4];
        self.buf.read_bytes(offset, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// The SLP curve is stored as packed 16-bit entries.
    pub fn write_slp(&self, lut: &[u16]) -> DpuResult<()> {
        let bytes: Vec<u8> = lut.iter().flat_map(|v| v.to_le_bytes()).collect();
        if SLP_OFFSET + bytes.len() > GAMMA_OFFSET {
            return Err(DpuError::LutOutOfRange {
                table: "slp",
                index: lut.len(),
            });
        }
        Ok(self.buf.write_bytes(SLP_OFFSET, &bytes)?)
    }

    /// Gamma entries sit on every other word of the slot.
    pub fn write_gamma(&self, slot: usize, lut: &GammaLut) -> DpuResult<()> {
        let region = GAMMA_OFFSET + slot * GAMMA_SLOT_SIZE;
        for j in 0..GAMMA_ENTRIES {
            let val = pack_rgb_entry(lut.r[j], lut.g[j], lut.b[j]);
            self.write_word("gamma", region, 2 * j, val)?;
        }
        Ok(())
    }

    pub fn read_gamma(&self, slot: usize) -> DpuResult<GammaLut> {
        let region = GAMMA_OFFSET + slot * GAMMA_SLOT_SIZE;
        let mut lut = GammaLut::default();
        for j in 0..GAMMA_ENTRIES {
            let (r, g, b) = unpack_rgb_entry(self.read_word("gamma", region, 2 * j)?);
            lut.r[j] = r;
            lut.g[j] = g;
            lut.b[j] = b;
        }
        Ok(lut)
    }

    /// The four HSV tables are interleaved entry by entry.
    pub fn write_hsv(&self, slot: usize, luts: &HsvLuts) -> DpuResult<()> {
        let region = HSV_OFFSET + slot * HSV_SLOT_SIZE;
        for (i, table) in luts.tables.iter().enumerate() {
            for j in 0..HSV_ENTRIES {
                let val = pack_hsv_entry(table.h_o[j], table.s_g[j]);
                self.write_word("hsv", region, j * HSV_TABLES + i, val)?;
            }
        }
        Ok(())
    }

    pub fn read_hsv(&self, slot: usize) -> DpuResult<HsvLuts> {
        let region = HSV_OFFSET + slot * HSV_SLOT_SIZE;
        let mut luts = HsvLuts::default();
        for (i, table) in luts.tables.iter_mut().enumerate() {
            for j in 0..HSV_ENTRIES {
                let val = self.read_word("hsv", region, j * HSV_TABLES + i)?;
                (table.h_o[j], table.s_g[j]) = unpack_hsv_entry(val);
            }
        }
        Ok(luts)
    }

    /// The eight 3D-LUT sub-tables are interleaved entry by entry.
    pub fn write_lut3d(&self, slot: usize, lut: &ThreedLut, entry_indexed: bool) -> DpuResult<()> {
        let region = LUT3D_OFFSET + slot * LUT3D_SLOT_SIZE;
        for i in 0..LUT3D_TABLES {
            for j in 0..LUT3D_ENTRIES {
                let val = lut.entry(i, j, entry_indexed);
                self.write_word("lut3d", region, i + LUT3D_TABLES * j, val)?;
            }
        }
        Ok(())
    }

    /// Decodes sub-table `sub` of the slot selected by `mode`.
    pub fn read_lut3d(&self, mode: usize, sub: usize) -> DpuResult<Vec<(u16, u16, u16)>> {
        let base = mode * LUT3D_SLOT_SIZE / 4 + sub;
        (0..LUT3D_ENTRIES)
            .map(|j| {
                self.read_word("lut3d", LUT3D_OFFSET, base + LUT3D_TABLES * j)
                    .map(unpack_rgb_entry)
            })
            .collect()
    }

    /// Copies chunk `n` of a whole image upload. Chunks start at the gamma
    /// region; any chunk that would run past the end is rejected.
    pub fn write_chunk(&self, n: u32, data: &[u8; LUTS_CHUNK_SIZE]) -> DpuResult<()> {
        let offset = GAMMA_OFFSET + n as usize * LUTS_CHUNK_SIZE;
        if offset + LUTS_CHUNK_SIZE > LUT_RAM_SIZE {
            return Err(DpuError::LutOutOfRange {
                table: "luts",
                index: n as usize,
            });
        }
        Ok(self.buf.write_bytes(offset, data)?)
    }
}
