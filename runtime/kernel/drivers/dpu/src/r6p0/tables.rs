// Licensed under the Apache-2.0 license

//! Fixed tuning tables for the r6p0 block.

use crate::enhance::SLP_LUT_ENTRIES;
use registers_dpu::regs::SCL_COEF_WORDS;

/// CABC configuration used while entering and leaving CABC. The dynamic
/// words computed from the histogram replace these once running.
pub const CABC_FIXED_CFG: [u32; 5] = [
    0x0020_0000,
    0x0000_0040,
    0x0040_0000,
    0x0001_0020,
    0x0000_03fc,
];

/// Scaler taps per phase.
const SCL_TAPS: usize = 4;
/// Filter phases covered by the coefficient table.
const SCL_PHASES: usize = SCL_COEF_WORDS * 2 / SCL_TAPS;
/// Sum of the taps of one phase.
const SCL_UNITY: u16 = 256;

/// Two-tap linear interpolation laid out as four taps per phase.
const fn scl_coef() -> [u16; SCL_COEF_WORDS * 2] {
    let mut coef = [0u16; SCL_COEF_WORDS * 2];
    let step = SCL_UNITY / SCL_PHASES as u16;
    let mut phase = 0;
    while phase < SCL_PHASES {
        let frac = step * phase as u16;
        coef[phase * SCL_TAPS + 1] = SCL_UNITY - frac;
        coef[phase * SCL_TAPS + 2] = frac;
        phase += 1;
    }
    coef
}

pub const SCL_COEF: [u16; SCL_COEF_WORDS * 2] = scl_coef();

/// Scaler table as register words, two taps per word, low tap first.
pub fn scl_coef_words() -> [u32; SCL_COEF_WORDS] {
    let mut words = [0u32; SCL_COEF_WORDS];
    for (j, word) in words.iter_mut().enumerate() {
        *word = SCL_COEF[2 * j] as u32 + ((SCL_COEF[2 * j + 1] as u32) << 16);
    }
    words
}

/// Identity tone curve loaded into the SLP LUT on every reload, 12 bits
/// per entry.
const fn slp_lut() -> [u16; SLP_LUT_ENTRIES] {
    let mut lut = [0u16; SLP_LUT_ENTRIES];
    let mut i = 0;
    while i < SLP_LUT_ENTRIES {
        lut[i] = (i as u16) << 4 | (i as u16) >> 4;
        i += 1;
    }
    lut
}

pub const SLP_LUT: [u16; SLP_LUT_ENTRIES] = slp_lut();

/// Largest corner radius the corner LUTs hold.
pub const MAX_CORNER_RADIUS: u32 = 255;

/// Transparent pixel count of each row of a rounded corner, top row first.
pub fn corner_rows(radius: u32) -> Vec<u32> {
    let r = radius.min(MAX_CORNER_RADIUS) as u64;
    (0..r)
        .map(|i| {
            // Distance from the circle center to the middle of row i.
            let dy2 = (2 * (r - i) - 1).pow(2);
            let r2 = (2 * r).pow(2);
            let mut dx = 0u64;
            while (dx + 1) * (dx + 1) * 4 <= r2 - dy2 {
                dx += 1;
            }
            (r - dx) as u32
        })
        .collect()
}
