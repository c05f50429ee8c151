// Licensed under the Apache-2.0 license

//! Write-back: the blended frame is captured into reserved memory once
//! the screen has been static for a few vsyncs, then replayed as a single
//! layer so the other layers stop fetching.

use super::{first_err, DpuR6p0, DpuState};
use crate::error::DpuResult;
use crate::events::HwEvent;
use crate::layer::DrmFormat;
use log::{debug, error, info, warn};
use registers_dpu::bits::{DpuCtrl, WbCfg, WbCtrl};
use registers_dpu::regs::{
    BLEND_SIZE, PANEL_SIZE, WB_BASE_ADDR, WB_CFG, WB_CTRL, WB_LAYER_INDEX, WB_PITCH,
};
use std::sync::atomic::Ordering;
use tock_registers::LocalRegisterCopy;

/// Vsyncs a flip must stay on screen before it is captured.
const WB_VSYNC_COUNT: u32 = 4;

fn align(val: u32, to: u32) -> u32 {
    val.div_ceil(to) * to
}

fn align16(val: u32) -> u32 {
    align(val, 16)
}

/// Header bytes of a compressed 32 bpp frame.
pub fn xfbc8888_header_size(w: u32, h: u32) -> u32 {
    align(align16(w) * align16(h) / 16, 128)
}

pub fn xfbc8888_payload_size(w: u32, h: u32) -> u32 {
    align16(w) * align16(h) * 4
}

/// Bytes reserved for one captured frame, compressed or not.
pub fn xfbc8888_buffer_size(w: u32, h: u32) -> u64 {
    u64::from(xfbc8888_header_size(w, h)) + u64::from(xfbc8888_payload_size(w, h))
}

/// Blend size split into `(width, height)`.
fn split_size(val: u32) -> (u32, u32) {
    (val & 0xffff, val >> 16)
}

impl DpuR6p0 {
    /// Capture configuration word. Compression carries the header size in
    /// 128 byte units.
    fn wb_cfg(&self, st: &DpuState) -> u32 {
        let mut cfg = LocalRegisterCopy::<u32, WbCfg::Register>::new(0);
        if st.params.wb_xfbc_en {
            cfg.modify(WbCfg::HEADER_SIZE.val(st.wb.layer.header_size_r) + WbCfg::XFBC_EN::SET);
        }
        cfg.get()
    }

    /// Starts a capture of the next frame. `debug` captures at panel size
    /// without compression.
    pub(super) fn wb_trigger(&self, st: &mut DpuState, count: u8, debug: bool) -> DpuResult<()> {
        let (w, h) = split_size(self.regs.read(BLEND_SIZE)?);

        if st.wb.size_changed {
            let layer = &mut st.wb.layer;
            layer.dst.w = w;
            layer.dst.h = h;
            layer.src.w = w;
            layer.src.h = h;
            layer.pitch[0] = align16(w) * 4;
            layer.header_size_r = xfbc8888_header_size(w, h) / 128;
            self.regs.write(WB_PITCH, align16(w))?;
            self.regs.write(WB_CFG, self.wb_cfg(st))?;
        }

        if debug {
            let (panel_w, _) = split_size(self.regs.read(PANEL_SIZE)?);
            self.regs.write(WB_PITCH, align16(panel_w))?;
            self.regs.write(WB_CFG, 0)?;
        }

        let mut result = Ok(());
        if debug || st.wb.size_changed {
            first_err(
                &mut result,
                self.kick_and_wait(DpuCtrl::REG_UPDATE::SET, HwEvent::Update),
            );
            st.wb.size_changed = false;
        }

        if debug {
            self.regs.write_field(WB_CTRL, WbCtrl::DEBUG_TRIGGER::SET)?;
        } else {
            self.regs.modify(WB_CTRL, WbCtrl::TRIGGER::SET)?;
        }
        debug!("write back trigger, count {}", count);
        result
    }

    /// Replaces every layer with the captured frame.
    fn wb_flip(&self, st: &mut DpuState) -> DpuResult<()> {
        self.clean_all()?;
        let layer = st.wb.layer.clone();
        self.program_layer(st, &layer)?;
        let result = self.kick_and_wait(DpuCtrl::REG_UPDATE::SET, HwEvent::Update);
        debug!("write back flip");
        result
    }

    pub(super) fn wb_work(&self) -> DpuResult<()> {
        let mut st = self.lock();
        if !self.inited() {
            error!("dpu is not initialized");
            return Ok(());
        }
        if st.disable_flip {
            warn!("dpu flip is disabled");
            return Ok(());
        }

        let wb_en = self.wb_en.load(Ordering::SeqCst);
        if wb_en
            && self.vsync_count.load(Ordering::SeqCst) > self.max_vsync_count.load(Ordering::SeqCst)
        {
            self.wb_trigger(&mut st, 1, false)
        } else if !wb_en {
            self.wb_flip(&mut st)
        } else {
            Ok(())
        }
    }

    /// Points the capture engine at the reserved buffer and prepares the
    /// replay layer. Without a usable buffer write-back stays off.
    pub(super) fn write_back_config(&self, st: &mut DpuState) -> DpuResult<()> {
        let (blend_w, _) = split_size(self.regs.read(BLEND_SIZE)?);

        if st.wb.configured {
            self.regs.write(WB_BASE_ADDR, st.wb.base)?;
            self.regs.write(WB_PITCH, align16(blend_w))?;
            self.regs.write(WB_CFG, self.wb_cfg(st))?;
            debug!("write back has configed");
            return Ok(());
        }

        let vm = st.panel.vm;
        let needed = xfbc8888_buffer_size(vm.hactive, vm.vactive);
        info!("use wb_reserved memory for writeback, size:0x{:x}", needed);

        let base = match st.dt.wb_memory {
            None => {
                error!("no sprd,wb-memory specified");
                self.max_vsync_count.store(0, Ordering::SeqCst);
                return Ok(());
            }
            Some(mem) if mem.size < needed => {
                error!("unable to obtain enough wb memory");
                self.max_vsync_count.store(0, Ordering::SeqCst);
                return Ok(());
            }
            Some(mem) => mem.base,
        };

        st.wb.base = base;
        let layer = &mut st.wb.layer;
        layer.index = WB_LAYER_INDEX;
        layer.planes = 1;
        layer.alpha = 0xff;
        layer.format = DrmFormat::ABGR8888;
        layer.addr[0] = base;

        self.regs.write(WB_BASE_ADDR, base)?;
        self.regs.write(WB_PITCH, align16(blend_w))?;
        if st.params.wb_xfbc_en {
            st.wb.layer.xfbc = true;
            self.regs.write(WB_CFG, self.wb_cfg(st))?;
        }

        st.params.max_vsync_count = WB_VSYNC_COUNT;
        self.max_vsync_count.store(WB_VSYNC_COUNT, Ordering::SeqCst);
        st.wb.configured = true;
        debug!("write back buffer at 0x{:08x}", base);
        Ok(())
    }
}
