// Licensed under the Apache-2.0 license

//! Core clock hint from the worst layer overlap on screen.

use super::DpuR6p0;
use crate::error::DpuResult;
use crate::layer::Rect;
use crate::regs::DpuRegs;
use log::{debug, error};
use registers_dpu::regs::{layer_offset, LAYER_COUNT, LAYER_DST_SIZE, LAYER_ENABLE, LAYER_POS};

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x + a.w > b.x && b.x + b.w > a.x && a.y + a.h > b.y && b.y + b.h > a.y
}

fn intersection(a: &Rect, b: &Rect) -> Rect {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let w = (a.x + a.w).min(b.x + b.w).saturating_sub(x);
    let h = (a.y + a.h).min(b.y + b.h).saturating_sub(y);
    Rect::new(x, y, w, h)
}

/// Largest number of layers stacked on one point, counted per layer.
///
/// Each layer starts from its own rectangle and shrinks it as overlapping
/// layers are found. The shrunken rectangle decides whether the next layer
/// overlaps, but it is always rebuilt from the starting layer and the one
/// just matched, not from the running intersection.
pub fn max_overlap(layers: &[Rect]) -> usize {
    layers
        .iter()
        .enumerate()
        .map(|(i, base)| {
            let mut area = *base;
            let mut count = 1;
            for (j, other) in layers.iter().enumerate() {
                if i != j && overlaps(&area, other) {
                    area = intersection(base, other);
                    count += 1;
                }
            }
            count
        })
        .max()
        .unwrap_or(0)
}

/// Destination rectangles of the enabled layer slots.
pub fn active_layers(regs: &DpuRegs) -> DpuResult<Vec<Rect>> {
    let enabled = regs.read(LAYER_ENABLE)?;
    let mut layers = Vec::new();
    for i in (0..LAYER_COUNT).filter(|i| enabled & (1 << i) != 0) {
        let pos = regs.read(layer_offset(i) + LAYER_POS)?;
        let size = regs.read(layer_offset(i) + LAYER_DST_SIZE)?;
        layers.push(Rect::new(
            pos & 0xffff,
            pos >> 16,
            size & 0xffff,
            size >> 16,
        ));
    }
    Ok(layers)
}

impl DpuR6p0 {
    /// Publishes the clock the current layer stack needs.
    pub(super) fn dvfs_work(&self) -> DpuResult<()> {
        let _st = self.lock();
        if !self.inited() {
            error!("dpu is not initialized");
            return Ok(());
        }
        let overlap = max_overlap(&active_layers(&self.regs)?);
        let freq = self.dvfs_table.frequency(overlap);
        debug!("dvfs: {} overlapped layers, {} Hz", overlap, freq);
        self.dvfs.call_chain(freq);
        Ok(())
    }
}
