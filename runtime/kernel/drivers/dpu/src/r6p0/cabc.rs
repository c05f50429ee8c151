// Licensed under the Apache-2.0 license

//! Content adaptive backlight control, driven one frame at a time from
//! deferred work.

use super::cabc_sm::{cabc_state, request_state};
use super::tables::CABC_FIXED_CFG;
use super::{DpuR6p0, DpuState};
use crate::enhance::CabcState;
use crate::error::DpuResult;
use log::{debug, info, warn};
use registers_dpu::bits::EnhanceUpdate;
use registers_dpu::regs::{cabc_cfg, cabc_hist, CABC_HIST_WORDS, DPU_ENHANCE_CFG, ENHANCE_UPDATE};
use registers_dpu::EnhanceModules;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

/// Full scale of `bl_fix`.
const BL_FIX_SCALE: u32 = 1020;

/// Backlight level after applying the CABC gain.
pub fn scaled_backlight(bl_fix: u16, cur_bl: u16) -> u16 {
    let level = u32::from(bl_fix) * u32::from(cur_bl) / BL_FIX_SCALE;
    u16::try_from(level).unwrap_or(u16::MAX)
}

impl DpuR6p0 {
    fn write_cabc_cfg(&self, cfg: &[u32; 5]) -> DpuResult<()> {
        for (n, word) in cfg.iter().enumerate() {
            self.regs.write(cabc_cfg(n), *word)?;
        }
        Ok(())
    }

    fn histogram_empty(&self) -> DpuResult<bool> {
        for n in 0..CABC_HIST_WORDS {
            if self.regs.read(cabc_hist(n))? != 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// One step of the CABC loop.
    pub(super) fn cabc_trigger(&self, st: &mut DpuState) -> DpuResult<()> {
        if st.cabc.frame_no() != 0 && self.histogram_empty()? {
            return Ok(());
        }

        match cabc_state(&st.cabc.sm) {
            CabcState::Working => {}
            CabcState::Stopping => {
                if st.cabc.backlight.is_some() {
                    st.cabc.para = Default::default();
                    self.write_cabc_cfg(&CABC_FIXED_CFG)?;
                    self.cabc_bl_set.store(true, Ordering::SeqCst);
                    request_state(&mut st.cabc.sm, CabcState::Disabled)?;
                    st.enhance.enhance_en.remove(EnhanceModules::CABC);
                    self.regs
                        .write(DPU_ENHANCE_CFG, st.enhance.enhance_en.bits())?;
                    info!("cabc stopped");
                }
                return Ok(());
            }
            CabcState::Disabled => return Ok(()),
        }

        if st.cabc.frame_no() == 0 {
            if st.cabc.backlight.is_none() {
                match st
                    .dt
                    .backlight
                    .as_deref()
                    .and_then(|name| self.backlights.find(name))
                {
                    Some(bl) => st.cabc.backlight = Some(bl),
                    None => warn!("dpu backlight node not found"),
                }
            }
            if let Some(bl) = &st.cabc.backlight {
                st.cabc.para.cur_bl = bl.normalized_level();
            }
            self.write_cabc_cfg(&CABC_FIXED_CFG)?;
            st.enhance.enhance_en |= EnhanceModules::CABC;
            self.regs
                .set_bits(DPU_ENHANCE_CFG, st.enhance.enhance_en.bits())?;
            st.cabc.set_frame_no(1);
        } else {
            let cfg = st.cabc.para.cfg;
            self.write_cabc_cfg(&cfg)?;
            if st.cabc.backlight.is_some() {
                self.cabc_bl_set.store(true, Ordering::SeqCst);
            }
            if st.cabc.frame_no() == 1 {
                st.cabc.set_frame_no(2);
            }
        }
        Ok(())
    }

    pub(super) fn cabc_work(&self) -> DpuResult<()> {
        let mut st = self.lock();
        if !self.inited() {
            return Ok(());
        }
        self.cabc_trigger(&mut st)?;
        self.regs.modify(ENHANCE_UPDATE, EnhanceUpdate::CABC::SET)
    }

    /// Applies the backlight level computed by the last trigger, after the
    /// frame carrying the matching pixel gain is out.
    pub(super) fn cabc_bl_work(&self) {
        let delay = self.lock().params.cabc_bl_set_delay;
        thread::sleep(Duration::from_millis(delay.into()));

        let mut st = self.lock();
        if let Some(bl) = st.cabc.backlight.clone() {
            if cabc_state(&st.cabc.sm) == CabcState::Working {
                let cur_bl = bl.normalized_level();
                st.cabc.para.cur_bl = cur_bl;
                let level = scaled_backlight(st.cabc.para.bl_fix, cur_bl);
                bl.set_cabc(level, cur_bl);
                debug!("cabc backlight {} (from {})", level, cur_bl);
            } else {
                bl.set_brightness(bl.brightness());
            }
        }
        self.cabc_bl_set.store(false, Ordering::SeqCst);
    }
}
