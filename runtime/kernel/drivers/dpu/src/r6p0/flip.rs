// Licensed under the Apache-2.0 license

//! Layer composition: the flip sequence, slot programming and the super
//! resolution scaler that follows a mode change.

use super::{first_err, DpuR6p0, DpuState};
use crate::error::{DpuError, DpuResult};
use crate::events::HwEvent;
use crate::layer::Layer;
use crate::DisplayMode;
use log::{debug, error, info};
use registers_dpu::bits::DpuCtrl;
use registers_dpu::regs::{
    layer_offset, LayerReg, BG_COLOR, BLEND_SIZE, DPU_CTRL, DPU_ENHANCE_CFG, DPU_INT_EN, DPU_SECURE,
    LAYER_ADDR0, LAYER_ALPHA, LAYER_COUNT, LAYER_CROP_START, LAYER_CTRL, LAYER_DST_SIZE,
    LAYER_ENABLE, LAYER_PALLETE, LAYER_PITCH, LAYER_POS, LAYER_SRC_SIZE, SCL_EN,
};
use registers_dpu::{DpuIrq, EnhanceModules};
use std::sync::atomic::Ordering;
use std::time::Duration;

impl DpuR6p0 {
    /// Writes a slot image. Palette layers fetch no memory, so their plane
    /// addresses, crop and pitch are left alone.
    fn write_layer_reg(&self, index: usize, reg: &LayerReg, pallete: bool) -> DpuResult<()> {
        let base = layer_offset(index);
        if !pallete {
            for (n, addr) in reg.addr.iter().enumerate() {
                self.regs.write(base + LAYER_ADDR0 + 4 * n as u32, *addr)?;
            }
        }
        self.regs.write(base + LAYER_POS, reg.pos)?;
        self.regs.write(base + LAYER_SRC_SIZE, reg.src_size)?;
        self.regs.write(base + LAYER_DST_SIZE, reg.dst_size)?;
        self.regs.write(base + LAYER_ALPHA, reg.alpha)?;
        if pallete {
            self.regs.write(base + LAYER_PALLETE, reg.pallete)?;
        } else {
            self.regs.write(base + LAYER_CROP_START, reg.crop_start)?;
            self.regs.write(base + LAYER_PITCH, reg.pitch)?;
        }
        self.regs.write(base + LAYER_CTRL, reg.ctrl)
    }

    /// Programs one layer slot and enables it.
    ///
    /// Protected layers never touch the slot registers from here: the
    /// secure world programs them. Any other layer first takes the engine
    /// back to the normal world if it was left in secure mode.
    pub(super) fn program_layer(&self, st: &mut DpuState, layer: &Layer) -> DpuResult<()> {
        if layer.index >= LAYER_COUNT {
            error!("layer index {} out of range", layer.index);
            return Err(DpuError::InvalidLayer {
                index: layer.index,
                reason: "index out of range",
            });
        }
        let image = layer.to_reg()?;

        let hw_secure = self.regs.read(DPU_SECURE)? != 0;
        if layer.secure_en || st.params.secure_debug {
            let settle = Duration::from_micros(st.params.time.into());
            return st
                .secure
                .protect_layer(hw_secure, settle, &image)
                .map_err(|e| {
                    error!("layer[{}] secure hand-off failed: {}", layer.index, e);
                    DpuError::Secure(e)
                });
        }

        if hw_secure {
            if let Err(e) = st.secure.release() {
                error!("dpu leave secure mode failed: {}", e);
            }
        }

        self.regs.write(layer_offset(layer.index) + LAYER_CTRL, 0)?;
        self.write_layer_reg(layer.index, &image, layer.pallete_en)?;
        self.regs.set_bits(LAYER_ENABLE, 1 << layer.index)?;

        debug!(
            "layer[{}] {} {}x{}+{}+{} ctrl 0x{:08x}",
            layer.index,
            layer.format,
            layer.dst.w,
            layer.dst.h,
            layer.dst.x,
            layer.dst.y,
            image.ctrl
        );
        Ok(())
    }

    /// Enables the scaler when the blended frame is smaller than the panel.
    pub(super) fn sr_config(&self, st: &mut DpuState) -> DpuResult<()> {
        self.regs.write(BLEND_SIZE, st.enhance.scale.blend_size())?;
        if st.need_scale {
            st.enhance.enhance_en |= EnhanceModules::SCL;
            self.regs.write(SCL_EN, 1)?;
        } else {
            st.enhance.enhance_en.remove(EnhanceModules::SCL);
            self.regs.write(SCL_EN, 0)?;
        }
        self.regs
            .write(DPU_ENHANCE_CFG, st.enhance.enhance_en.bits())
    }

    /// Switches the scaler once the first frame at the new mode arrives.
    fn scaling(&self, st: &mut DpuState, layers: &[Layer]) -> DpuResult<()> {
        if !st.mode_changed {
            return Ok(());
        }
        let Some(top) = layers.last() else {
            return Ok(());
        };
        for layer in layers {
            debug!(
                "layer[{}]: src {}x{} dst {}x{}",
                layer.index, layer.src.w, layer.src.h, layer.dst.w, layer.dst.h
            );
        }
        if top.dst.w <= st.enhance.scale.in_w {
            self.sr_config(st)?;
            st.mode_changed = false;
            info!(
                "do scaling enhace: 0x{:x}, top layer({}x{})",
                st.enhance.enhance_en.bits(),
                top.dst.w,
                top.dst.h
            );
        }
        Ok(())
    }

    /// Composes `layers` and waits for the hardware to latch them.
    ///
    /// A layer that fails to translate is dropped. A failed secure hand-off
    /// drops that layer too and is reported once the rest of the frame has
    /// been committed.
    pub(super) fn flip_locked(&self, st: &mut DpuState, layers: &[Layer]) -> DpuResult<()> {
        self.vsync_count.store(0, Ordering::SeqCst);
        if self.max_vsync_count.load(Ordering::SeqCst) > 0 && layers.len() > 1 {
            self.wb_en.store(true, Ordering::SeqCst);
        }

        let mut result = Ok(());
        // eDPI has no shadow registers; they only latch on the RUN edge.
        if st.is_edpi() {
            first_err(&mut result, self.wait_stop_done(st));
        }

        self.regs.write(BG_COLOR, 0)?;
        self.clean_all()?;
        self.scaling(st, layers)?;

        for layer in layers {
            match self.program_layer(st, layer) {
                Err(e @ DpuError::Secure(_)) => first_err(&mut result, Err(e)),
                Err(DpuError::InvalidLayer { .. }) => {}
                other => other?,
            }
        }

        if st.single_run {
            self.regs
                .modify(DPU_CTRL, DpuCtrl::REG_UPDATE::SET + DpuCtrl::RUN::SET)?;
        } else if st.is_edpi() {
            self.regs.modify(DPU_CTRL, DpuCtrl::RUN::SET)?;
            st.is_stopped = false;
        } else {
            if !st.is_stopped {
                if st.first_frame {
                    first_err(
                        &mut result,
                        self.kick_and_wait(DpuCtrl::ALL_UPDATE::SET, HwEvent::AllUpdate),
                    );
                    st.first_frame = false;
                } else {
                    first_err(
                        &mut result,
                        self.kick_and_wait(DpuCtrl::REG_UPDATE::SET, HwEvent::Update),
                    );
                }
            }
            self.regs.set_bits(DPU_INT_EN, DpuIrq::ERR.bits())?;
        }

        // Re-arm the sources the interrupt handler masked.
        self.regs.set_bits(DPU_INT_EN, DpuIrq::FBC_ERR.bits())?;
        result
    }

    pub(super) fn modeset_locked(&self, st: &mut DpuState, mode: DisplayMode) {
        st.enhance.scale.in_w = mode.hdisplay;
        st.enhance.scale.in_h = mode.vdisplay;
        let vm = st.panel.vm;
        st.need_scale = mode.hdisplay != vm.hactive || mode.vdisplay != vm.vactive;
        st.mode_changed = true;
        st.wb.size_changed = true;
        info!("begin switch to {} x {}", mode.hdisplay, mode.vdisplay);
    }
}
