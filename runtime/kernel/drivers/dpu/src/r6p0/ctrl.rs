// Licensed under the Apache-2.0 license

//! Power sequencing, interface setup and the run/stop handshake.

use super::dsc::DscPreset;
use super::luts::LutRam;
use super::tables::{corner_rows, scl_coef_words};
use super::{first_err, DpuR6p0, DpuState};
use crate::error::{DpuError, DpuResult};
use crate::events::{HwEvent, EVENT_TIMEOUT};
use crate::platform::DsiWorkMode;
use crate::InterfaceType;
use log::{error, info, warn};
use registers_dpu::bits::{CornerConfig, DpiCtrl, DpuCfg0, DpuCfg1, DpuCtrl, DpuMode, Size, Timing};
use registers_dpu::regs::{
    BG_COLOR, BLEND_SIZE, BOT_CORNER_LUT_ADDR, BOT_CORNER_LUT_WDATA, CORNER_CONFIG, DPI_CTRL,
    DPI_H_TIMING, DPI_V_TIMING, DPU_CFG0, DPU_CFG1, DPU_CTRL, DPU_INT_CLR, DPU_INT_EN, DPU_MODE,
    LAYER_ENABLE, PANEL_SIZE, SCL_COEF_HOR_CFG, SCL_COEF_VER_CFG, TOP_CORNER_LUT_ADDR,
    TOP_CORNER_LUT_WDATA,
};
use registers_dpu::DpuIrq;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tock_registers::LocalRegisterCopy;

/// One TE period. Lets the panel catch up after the first command mode
/// frame so no garbage shows when the backlight comes on.
const PANEL_SETTLE: Duration = Duration::from_millis(20);

/// `sync | back_porch << 8 | front_porch << 20`
pub(super) fn timing(sync: u32, back_porch: u32, front_porch: u32) -> u32 {
    let mut reg = LocalRegisterCopy::<u32, Timing::Register>::new(0);
    reg.modify(
        Timing::SYNC.val(sync) + Timing::BACK_PORCH.val(back_porch)
            + Timing::FRONT_PORCH.val(front_porch),
    );
    reg.get()
}

/// `width | height << 16`
pub(super) fn size(width: u32, height: u32) -> u32 {
    let mut reg = LocalRegisterCopy::<u32, Size::Register>::new(0);
    reg.modify(Size::WIDTH.val(width) + Size::HEIGHT.val(height));
    reg.get()
}

impl DpuR6p0 {
    /// Waits for the stop acknowledgement unless already stopped. The
    /// engine counts as stopped afterwards even when the wait times out.
    pub(super) fn wait_stop_done(&self, st: &mut DpuState) -> DpuResult<()> {
        if st.is_stopped {
            return Ok(());
        }
        let done = self.events.stop.wait(EVENT_TIMEOUT);
        self.events.stop.clear();
        st.is_stopped = true;
        if !done {
            error!("dpu wait for stop done time out!");
            return Err(DpuError::Timeout(HwEvent::Stop));
        }
        Ok(())
    }

    pub(super) fn stop_locked(&self, st: &mut DpuState) -> DpuResult<()> {
        if st.is_dpi() {
            self.regs.modify(DPU_CTRL, DpuCtrl::STOP::SET)?;
        }
        let result = self.wait_stop_done(st);
        info!("dpu stop");
        result
    }

    pub(super) fn run_locked(&self, st: &mut DpuState) -> DpuResult<()> {
        self.regs
            .modify(DPU_CTRL, DpuCtrl::REG_UPDATE::SET + DpuCtrl::RUN::SET)?;
        st.is_stopped = false;
        info!("dpu run");

        if st.is_edpi() && !st.panel_ready {
            let result = self.wait_stop_done(st);
            thread::sleep(PANEL_SETTLE);
            st.panel_ready = true;
            return result;
        }
        Ok(())
    }

    pub(super) fn clean_all(&self) -> DpuResult<()> {
        self.regs.write(LAYER_ENABLE, 0)
    }

    pub(super) fn init_locked(&self, st: &mut DpuState) -> DpuResult<()> {
        let vm = st.panel.vm;
        let command_mode = self.dsi.work_mode() == DsiWorkMode::Command;

        st.dsc = DscPreset::for_panel(st.dt.lcd_name.as_deref());
        if st.dsc.dual_dsi {
            self.regs.write_field(DPU_MODE, DpuMode::DUAL_DSI::SET)?;
        }
        if st.dsc.enabled {
            st.dsc.program(&self.regs, &vm, command_mode)?;
        }

        self.regs.write(BG_COLOR, 0)?;
        let panel_size = size(vm.hactive, vm.vactive);
        self.regs.write(PANEL_SIZE, panel_size)?;
        self.regs.write(BLEND_SIZE, panel_size)?;

        self.regs.write(DPU_CFG0, 0)?;
        st.single_run = command_mode && st.dsc.enabled;
        if st.single_run {
            self.regs.modify(DPU_CFG0, DpuCfg0::SINGLE_RUN::SET)?;
        }

        let qos = st.qos;
        self.regs.write_field(
            DPU_CFG1,
            DpuCfg1::AWQOS_HIGH.val(qos.awqos_high.into())
                + DpuCfg1::AWQOS_LOW.val(qos.awqos_low.into())
                + DpuCfg1::ARQOS_HIGH.val(qos.arqos_high.into())
                + DpuCfg1::ARQOS_LOW.val(qos.arqos_low.into())
                + DpuCfg1::FIXED18::SET
                + DpuCfg1::FIXED22::SET
                + DpuCfg1::FIXED23::SET,
        )?;

        if st.is_stopped {
            self.clean_all()?;
        }

        for (n, word) in scl_coef_words().iter().enumerate() {
            self.regs.write(SCL_COEF_HOR_CFG + 4 * n as u32, *word)?;
            self.regs.write(SCL_COEF_VER_CFG + 4 * n as u32, *word)?;
        }

        self.regs.write(DPU_INT_CLR, 0xffff)?;

        if st.luts.is_none() {
            match LutRam::alloc(self.dma.as_ref()) {
                Ok(ram) => st.luts = Some(ram),
                Err(e) => error!("DPU lUTS table alloc buffer fail: {}", e),
            }
        }

        self.enhance_reload(st)?;
        self.write_back_config(st)?;

        if let Some(radius) = st.dt.corner_radius {
            self.corner_init(radius)?;
        }

        st.cabc.set_frame_no(0);
        self.is_inited.store(true, Ordering::SeqCst);
        info!("dpu init {}x{}", vm.hactive, vm.vactive);
        Ok(())
    }

    pub(super) fn uninit_locked(&self, st: &mut DpuState) -> DpuResult<()> {
        self.is_inited.store(false, Ordering::SeqCst);
        st.panel_ready = false;
        self.regs.write(DPU_INT_EN, 0)?;
        self.regs.write(DPU_INT_CLR, 0xff)
    }

    fn corner_init(&self, radius: u32) -> DpuResult<()> {
        let mut cfg = LocalRegisterCopy::<u32, CornerConfig::Register>::new(0);
        cfg.modify(CornerConfig::TOP_RADIUS.val(radius) + CornerConfig::BOT_RADIUS.val(radius));
        self.regs.write_reg(CORNER_CONFIG, cfg)?;

        let rows = corner_rows(radius);
        for (i, (top, bottom)) in rows.iter().zip(rows.iter().rev()).enumerate() {
            self.regs.write(TOP_CORNER_LUT_ADDR, i as u32)?;
            self.regs.write(TOP_CORNER_LUT_WDATA, *top)?;
            self.regs.write(BOT_CORNER_LUT_ADDR, i as u32)?;
            self.regs.write(BOT_CORNER_LUT_WDATA, *bottom)?;
        }

        self.regs.modify(
            CORNER_CONFIG,
            CornerConfig::TOP_EN::SET + CornerConfig::BOT_EN::SET,
        )
    }

    /// Interface setup: timing and interrupt sources for DPI, TE for eDPI.
    pub(super) fn dpi_init(&self, st: &mut DpuState) -> DpuResult<()> {
        let vm = st.panel.vm;
        let mut int_mask = match st.panel.interface {
            InterfaceType::Dpi => {
                self.regs.modify(DPU_CFG0, DpuCfg0::EDPI::CLEAR)?;
                self.regs.modify(DPI_CTRL, DpiCtrl::HALT_EN::SET)?;
                if st.single_run {
                    self.regs.modify(DPI_CTRL, DpiCtrl::SINGLE_RUN::SET)?;
                }

                self.regs.write(
                    DPI_H_TIMING,
                    timing(vm.hsync_len, vm.hback_porch, vm.hfront_porch),
                )?;
                self.regs.write(
                    DPI_V_TIMING,
                    timing(vm.vsync_len, vm.vback_porch, vm.vfront_porch),
                )?;
                if vm.vsync_len + vm.vback_porch < 32 {
                    warn!("Warning: (vsync + vbp) < 32, underflow risk!");
                }

                DpuIrq::ALL_UPDATE_DONE
                    | DpuIrq::REG_UPDATE_DONE
                    | DpuIrq::LAY_REG_UPDATE_DONE
                    | DpuIrq::PQ_REG_UPDATE_DONE
                    | DpuIrq::DONE
                    | DpuIrq::DPI_VSYNC
                    | DpuIrq::TE
                    | DpuIrq::ERR
                    | DpuIrq::WB_DONE
                    | DpuIrq::WB_FAIL
            }
            InterfaceType::Edpi => {
                self.regs.modify(DPU_CFG0, DpuCfg0::EDPI::SET)?;
                self.regs
                    .modify(DPI_CTRL, DpiCtrl::TE_EXT::SET + DpiCtrl::TE_EN::SET)?;
                DpuIrq::DONE | DpuIrq::TE
            }
        };
        int_mask |= DpuIrq::FBC_ERR;
        self.regs.write(DPU_INT_EN, int_mask.bits())
    }

    pub(super) fn bg_color_locked(&self, st: &mut DpuState, color: u32) -> DpuResult<()> {
        let mut result = Ok(());
        if st.is_edpi() {
            first_err(&mut result, self.wait_stop_done(st));
        }

        self.regs.write(BG_COLOR, color)?;
        self.clean_all()?;

        if st.single_run {
            self.regs
                .modify(DPU_CTRL, DpuCtrl::REG_UPDATE::SET + DpuCtrl::RUN::SET)?;
        } else if st.is_edpi() {
            self.regs.modify(DPU_CTRL, DpuCtrl::RUN::SET)?;
            st.is_stopped = false;
        } else if !st.is_stopped {
            first_err(
                &mut result,
                self.kick_and_wait(DpuCtrl::REG_UPDATE::SET, HwEvent::Update),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_and_size_words() {
        assert_eq!(timing(4, 40, 60), 4 | 40 << 8 | 60 << 20);
        assert_eq!(size(1080, 2400), 2400 << 16 | 1080);
    }
}
