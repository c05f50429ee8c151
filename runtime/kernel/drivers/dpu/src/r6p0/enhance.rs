// Licensed under the Apache-2.0 license

//! Picture quality settings: live programming, the power-off backup path,
//! the replay after `init` and hardware read-back.

use super::cabc_sm::{cabc_state, request_state};
use super::luts::{LutRam, GAMMA_SLOTS, HSV_SLOTS, LUT3D_SLOTS, LUTS_CHUNKS};
use super::tables::SLP_LUT;
use super::{first_err, DpuR6p0, DpuState};
use crate::enhance::{
    unpack_hsv_entry, unpack_rgb_entry, CabcState, CmCfg, EnhanceId, EnhanceParam, EnhanceValue,
    EpfCfg, GammaLut, HsvLuts, HsvParams, LutSelect, LutSource, LutsDump, LutsUpdate, ScaleCfg,
    SlpCfg, UdCfg, CABC_MODE_FULL_FRAME, CABC_MODE_UI, CABC_MODE_VIDEO, GAMMA_ENTRIES,
    HSV_ENTRIES, LUT3D_ENTRIES, LUT3D_TABLES, LUTS_CHUNK_SIZE, SLP_LTM_WORD, SLP_LUT_ENTRIES,
};
use crate::error::{DpuError, DpuResult};
use crate::events::HwEvent;
use crate::workqueue::Work;
use log::{debug, error, info};
use registers_dpu::bits::{DpuCtrl, EnhanceUpdate};
use registers_dpu::regs::{
    cabc_hist, cm_coef, hsv_lut_addr, hsv_lut_raddr, slp_cfg, threed_lut_addr, threed_lut_rdata,
    BLEND_SIZE, CABC_HIST_WORDS, CM_COEF_WORDS, DPU_CTRL, DPU_ENHANCE_CFG, ENHANCE_UPDATE,
    EPF_EPSILON, GAMMA_LUT_ADDR, GAMMA_LUT_BASE_ADDR, GAMMA_LUT_RDATA, HSV_CFG,
    HSV_LUT_BASE_ADDR, HSV_LUT_PORTS, SCL_EN, SLP_CFG_WORDS, SLP_LUT_ADDR, SLP_LUT_BASE_ADDR,
    SLP_LUT_RDATA, THREED_LUT_BASE_ADDR, UD_CFG0,
};
use registers_dpu::EnhanceModules;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

/// Read ports need a moment after the address is latched.
const LUT_READ_SETTLE: Duration = Duration::from_micros(1);

fn epf_reg(n: usize) -> u32 {
    EPF_EPSILON + 4 * n as u32
}

fn ud_reg(n: usize) -> u32 {
    UD_CFG0 + 4 * n as u32
}

fn lut_ram(luts: &Option<LutRam>) -> DpuResult<&LutRam> {
    luts.as_ref().ok_or(DpuError::OutOfMemory("lut ram"))
}

/// Maps the CABC mode bits onto the video classification. The first
/// matching bit wins; anything else keeps the current value.
pub fn cabc_video_mode(mode: u32) -> Option<u8> {
    if mode & CABC_MODE_UI != 0 {
        Some(0)
    } else if mode & CABC_MODE_FULL_FRAME != 0 {
        Some(1)
    } else if mode & CABC_MODE_VIDEO != 0 {
        Some(2)
    } else {
        None
    }
}

/// Physical address of the slot `sel` points at. A 3D-LUT selection
/// carries its slot in the high byte and the sub-table in the low byte.
fn select_addr(ram: &LutRam, sel: &LutSelect) -> DpuResult<u32> {
    let out_of_range = |table: &'static str, index: usize| -> DpuResult<u32> {
        Err(DpuError::LutOutOfRange { table, index })
    };
    match *sel {
        LutSelect::Gamma { index } => match usize::from(index) {
            slot if slot < GAMMA_SLOTS => Ok(ram.gamma_addr(slot)),
            slot => out_of_range("gamma", slot),
        },
        LutSelect::Hsv { index, .. } => match usize::from(index) {
            slot if slot < HSV_SLOTS => Ok(ram.hsv_addr(slot)),
            slot => out_of_range("hsv", slot),
        },
        LutSelect::Lut3d { index } => {
            let (slot, sub) = lut3d_select(index);
            if slot >= LUT3D_SLOTS || sub >= LUT3D_TABLES {
                return out_of_range("lut3d", usize::from(index));
            }
            Ok(ram.lut3d_addr(slot))
        }
    }
}

fn lut3d_select(index: u16) -> (usize, usize) {
    (usize::from(index >> 8), usize::from(index & 0xff))
}

/// Writes a cached table to its first slot if it has not reached LUT RAM
/// yet, and returns the slot address the base register should hold.
fn resolve_lut<T>(
    src: &mut Option<LutSource<T>>,
    luts: &Option<LutRam>,
    write: impl FnOnce(&LutRam, &T) -> DpuResult<u32>,
) -> DpuResult<Option<u32>> {
    let addr = match src {
        Some(LutSource::Table(table)) => write(lut_ram(luts)?, table)?,
        Some(LutSource::Slot(addr)) => *addr,
        None => return Ok(None),
    };
    *src = Some(LutSource::Slot(addr));
    Ok(Some(addr))
}

impl DpuR6p0 {
    fn write_words(&self, offset: impl Fn(usize) -> u32, words: &[u32]) -> DpuResult<()> {
        for (n, word) in words.iter().enumerate() {
            self.regs.write(offset(n), *word)?;
        }
        Ok(())
    }

    fn read_words<const N: usize>(&self, offset: impl Fn(usize) -> u32) -> DpuResult<[u32; N]> {
        let mut words = [0u32; N];
        for (n, word) in words.iter_mut().enumerate() {
            *word = self.regs.read(offset(n))?;
        }
        Ok(words)
    }

    fn enable_modules(&self, modules: EnhanceModules) -> DpuResult<()> {
        self.regs.set_bits(DPU_ENHANCE_CFG, modules.bits())
    }

    fn set_slp(&self, st: &mut DpuState, slp: SlpCfg) -> DpuResult<()> {
        st.enhance.slp = slp.with_cabc_override(cabc_state(&st.cabc.sm));
        self.write_words(slp_cfg, &st.enhance.slp.pack())?;
        self.enable_modules(EnhanceModules::SLP)?;
        info!("enhance slp set");
        Ok(())
    }

    /// CABC requests never touch the generic cache and never trigger an
    /// update; they only steer the CABC loop.
    fn cabc_request(&self, st: &mut DpuState, param: EnhanceParam) -> DpuResult<()> {
        match param {
            EnhanceParam::CabcMode(mode) => {
                if let Some(video_mode) = cabc_video_mode(mode) {
                    st.cabc.para.video_mode = video_mode;
                }
                info!("enhance CABC mode: 0x{:x}", mode);
            }
            EnhanceParam::CabcParam(param) => {
                st.cabc.para.bl_fix = param.bl_fix;
                st.cabc.para.cfg = param.cfg;
            }
            EnhanceParam::CabcRun => {
                if cabc_state(&st.cabc.sm) != CabcState::Disabled {
                    self.wq.schedule(Work::CabcTrigger);
                }
            }
            EnhanceParam::CabcState(state) => {
                request_state(&mut st.cabc.sm, state)?;
                info!("enhance CABC state: {}", state);
            }
            other => debug!("not a cabc request: {:?}", other.id()),
        }
        Ok(())
    }

    /// Streams the next chunk of a whole LUT RAM image. The chunk counter
    /// advances even when the chunk is rejected.
    fn write_luts_chunk(st: &mut DpuState, chunk: &[u8; LUTS_CHUNK_SIZE]) -> DpuResult<()> {
        if st.luts_chunk == LUTS_CHUNKS {
            st.luts_chunk = 0;
        }
        let n = st.luts_chunk;
        st.luts_chunk += 1;
        lut_ram(&st.luts)?.write_chunk(n, chunk)
    }

    fn ensure_luts(&self, st: &mut DpuState) -> DpuResult<()> {
        if st.luts.is_none() {
            let ram = LutRam::alloc(self.dma.as_ref()).inspect_err(|e| {
                error!("DPU lUTS table alloc buffer fail: {}", e);
            })?;
            st.luts = Some(ram);
        }
        Ok(())
    }

    /// Records which slot each LUT should use. Only the base registers of
    /// a powered engine are touched, and only when `live` is set.
    fn select_luts(&self, st: &mut DpuState, sel: LutSelect, live: bool) -> DpuResult<()> {
        let addr = select_addr(lut_ram(&st.luts)?, &sel)?;
        match sel {
            LutSelect::Gamma { .. } => {
                st.enhance.gamma = Some(LutSource::Slot(addr));
                st.enhance.enhance_en |= EnhanceModules::GAMMA_DITHER;
                if live {
                    self.regs.write(GAMMA_LUT_BASE_ADDR, addr)?;
                    self.enable_modules(EnhanceModules::GAMMA_DITHER)?;
                }
            }
            LutSelect::Hsv { params, .. } => {
                st.enhance.hsv_cfg = params.pack();
                st.enhance.hsv = Some(LutSource::Slot(addr));
                st.enhance.enhance_en |= EnhanceModules::HSV;
                if live {
                    self.regs.write(HSV_CFG, st.enhance.hsv_cfg)?;
                    self.regs.write(HSV_LUT_BASE_ADDR, addr)?;
                    self.enable_modules(EnhanceModules::HSV)?;
                }
            }
            LutSelect::Lut3d { .. } => {
                st.enhance.lut3d = Some(LutSource::Slot(addr));
                st.enhance.enhance_en |= EnhanceModules::LUT3D;
                if live {
                    self.regs.write(THREED_LUT_BASE_ADDR, addr)?;
                    self.enable_modules(EnhanceModules::LUT3D)?;
                }
            }
        }
        st.enhance.lut_select = Some(sel);
        Ok(())
    }

    /// Caches `param` while the engine is powered off.
    pub(super) fn enhance_backup(&self, st: &mut DpuState, param: EnhanceParam) -> DpuResult<()> {
        let state = cabc_state(&st.cabc.sm);
        let cache = &mut st.enhance;
        match param {
            EnhanceParam::Enable(modules) => {
                cache.enhance_en |= modules;
                info!("enhance module enable backup: 0x{:x}", modules.bits());
            }
            EnhanceParam::Disable(modules) => {
                cache.enhance_en.remove(modules);
                info!("enhance module disable backup: 0x{:x}", modules.bits());
            }
            EnhanceParam::Scl(scale) => {
                cache.scale = scale;
                cache.enhance_en |= EnhanceModules::SCL;
                info!("enhance scaling backup");
            }
            EnhanceParam::Hsv(luts) => {
                cache.hsv = Some(LutSource::Table(luts));
                cache.enhance_en |= EnhanceModules::HSV;
                info!("enhance hsv backup");
            }
            EnhanceParam::Cm(cm) => {
                cache.cm = cm;
                cache.enhance_en |= EnhanceModules::CM;
                info!("enhance cm backup");
            }
            EnhanceParam::Slp(slp) => {
                cache.slp = slp.with_cabc_override(state);
                cache.enhance_en |= EnhanceModules::SLP;
                info!("enhance slp backup");
            }
            EnhanceParam::Ltm(slp) => {
                cache.slp = slp.with_cabc_override(state);
                cache.enhance_en |= EnhanceModules::SLP | EnhanceModules::LTM;
                info!("enhance ltm backup");
            }
            EnhanceParam::Gamma(lut) => {
                cache.gamma = Some(LutSource::Table(lut));
                cache.enhance_en |= EnhanceModules::GAMMA_DITHER;
                info!("enhance gamma backup");
            }
            EnhanceParam::Epf(epf) => {
                cache.epf = epf;
                cache.enhance_en |= EnhanceModules::EPF;
                info!("enhance epf backup");
            }
            EnhanceParam::Lut3d(lut) => {
                cache.lut3d = Some(LutSource::Table(lut));
                cache.enhance_en |= EnhanceModules::LUT3D;
                info!("enhance lut3d backup");
            }
            EnhanceParam::Ud(ud) => {
                cache.ud = ud;
                cache.enhance_en |= EnhanceModules::UD_ALL;
                info!("enhance ud backup");
            }
            EnhanceParam::UpdateLuts(update) => {
                self.ensure_luts(st)?;
                match update {
                    LutsUpdate::Select(sel) => self.select_luts(st, sel, false)?,
                    LutsUpdate::All(chunk) => Self::write_luts_chunk(st, &chunk)?,
                }
                info!("enhance ddr luts backup");
            }
            cabc => return self.cabc_request(st, cabc),
        }
        Ok(())
    }

    /// Programs `param` into a powered engine and latches it.
    pub(super) fn enhance_set_locked(
        &self,
        st: &mut DpuState,
        param: EnhanceParam,
    ) -> DpuResult<()> {
        let mut result = Ok(());
        if st.is_edpi() {
            first_err(&mut result, self.wait_stop_done(st));
        }

        match param {
            EnhanceParam::Enable(modules) => {
                self.enable_modules(modules)?;
                info!("enhance module enable: 0x{:x}", modules.bits());
            }
            EnhanceParam::Disable(modules) => {
                self.regs.clear_bits(DPU_ENHANCE_CFG, modules.bits())?;
                info!("enhance module disable: 0x{:x}", modules.bits());
            }
            EnhanceParam::Scl(scale) => {
                st.enhance.scale = scale;
                self.regs.write(BLEND_SIZE, scale.blend_size())?;
                self.enable_modules(EnhanceModules::SCL)?;
                self.regs.write(SCL_EN, 1)?;
                info!("enhance scaling: {}x{}", scale.in_w, scale.in_h);
            }
            EnhanceParam::Hsv(luts) => {
                let ram = lut_ram(&st.luts)?;
                ram.write_hsv(0, &luts)?;
                let addr = ram.hsv_addr(0);
                self.regs.write(HSV_LUT_BASE_ADDR, addr)?;
                st.enhance.hsv = Some(LutSource::Slot(addr));
                self.enable_modules(EnhanceModules::HSV)?;
                info!("enhance hsv set");
            }
            EnhanceParam::Cm(cm) => {
                st.enhance.cm = cm;
                self.write_words(cm_coef, &cm.pack())?;
                self.enable_modules(EnhanceModules::CM)?;
                info!("enhance cm set");
            }
            EnhanceParam::Ltm(slp) => {
                self.enable_modules(EnhanceModules::LTM)?;
                info!("enhance ltm set");
                self.set_slp(st, slp)?;
            }
            EnhanceParam::Slp(slp) => self.set_slp(st, slp)?,
            EnhanceParam::Gamma(lut) => {
                let ram = lut_ram(&st.luts)?;
                ram.write_gamma(0, &lut)?;
                let addr = ram.gamma_addr(0);
                self.regs.write(GAMMA_LUT_BASE_ADDR, addr)?;
                st.enhance.gamma = Some(LutSource::Slot(addr));
                self.enable_modules(EnhanceModules::GAMMA_DITHER)?;
                info!("enhance gamma set");
            }
            EnhanceParam::Epf(epf) => {
                st.enhance.epf = epf;
                self.write_words(epf_reg, &epf.pack())?;
                self.enable_modules(EnhanceModules::EPF)?;
                info!("enhance epf set");
            }
            EnhanceParam::Lut3d(lut) => {
                let ram = lut_ram(&st.luts)?;
                ram.write_lut3d(0, &lut, st.params.lut3d_entry_indexed)?;
                let addr = ram.lut3d_addr(0);
                self.regs.write(THREED_LUT_BASE_ADDR, addr)?;
                st.enhance.lut3d = Some(LutSource::Slot(addr));
                self.enable_modules(EnhanceModules::LUT3D)?;
                info!("enhance lut3d set");
            }
            EnhanceParam::Ud(ud) => {
                st.enhance.ud = ud;
                self.write_words(ud_reg, &ud.pack())?;
                self.enable_modules(EnhanceModules::UD_ALL)?;
                info!("enhance ud set");
            }
            EnhanceParam::UpdateLuts(LutsUpdate::Select(sel)) => {
                first_err(&mut result, self.select_luts(st, sel, true));
            }
            EnhanceParam::UpdateLuts(LutsUpdate::All(chunk)) => {
                first_err(&mut result, Self::write_luts_chunk(st, &chunk));
            }
            cabc => {
                first_err(&mut result, self.cabc_request(st, cabc));
                return result;
            }
        }

        if st.is_dpi() && !st.is_stopped {
            first_err(
                &mut result,
                self.kick_and_wait(DpuCtrl::ALL_UPDATE::SET, HwEvent::AllUpdate),
            );
        } else if st.is_edpi() && st.panel_ready {
            // Settings must not start before the panel has finished its
            // own initialization.
            self.regs.modify(DPU_CTRL, DpuCtrl::RUN::SET)?;
            st.is_stopped = false;
        }

        let cfg = self.regs.read(DPU_ENHANCE_CFG)?;
        let scl = self.regs.read(SCL_EN)?;
        st.enhance.enhance_en = EnhanceModules::from_bits_retain(cfg | scl << 13);
        result
    }

    /// Replays every cached setting after a power-up.
    pub(super) fn enhance_reload(&self, st: &mut DpuState) -> DpuResult<()> {
        let mut result = Ok(());
        let en = st.enhance.enhance_en;

        if let Some(ram) = &st.luts {
            ram.write_slp(&SLP_LUT)?;
            self.regs.write(SLP_LUT_BASE_ADDR, ram.phys_addr())?;
            self.regs.modify(ENHANCE_UPDATE, EnhanceUpdate::SLP_LUT::SET)?;
        }

        if en.contains(EnhanceModules::SCL) {
            let scale = st.enhance.scale;
            self.regs.write(BLEND_SIZE, scale.blend_size())?;
            self.regs.write(SCL_EN, 1)?;
            info!(
                "enhance scaling from {}x{} to {}x{}",
                scale.in_w, scale.in_h, st.panel.vm.hactive, st.panel.vm.vactive
            );
        }

        if en.contains(EnhanceModules::EPF) {
            self.write_words(epf_reg, &st.enhance.epf.pack())?;
            info!("enhance epf reload");
        }

        if en.contains(EnhanceModules::HSV) {
            self.regs.write(HSV_CFG, st.enhance.hsv_cfg)?;
            let slot = resolve_lut(&mut st.enhance.hsv, &st.luts, |ram, luts| {
                ram.write_hsv(0, luts)?;
                Ok(ram.hsv_addr(0))
            });
            match slot {
                Ok(Some(addr)) => self.regs.write(HSV_LUT_BASE_ADDR, addr)?,
                Ok(None) => {}
                Err(e) => {
                    error!("enhance hsv reload failed: {}", e);
                    first_err(&mut result, Err(e));
                }
            }
            self.regs.modify(ENHANCE_UPDATE, EnhanceUpdate::HSV::SET)?;
            info!("enhance hsv reload");
        }

        if en.contains(EnhanceModules::CM) {
            self.write_words(cm_coef, &st.enhance.cm.pack())?;
            info!("enhance cm reload");
        }

        if en.contains(EnhanceModules::SLP) {
            self.write_words(slp_cfg, &st.enhance.slp.pack())?;
            info!("enhance slp reload");
        }

        if en.contains(EnhanceModules::GAMMA) {
            let slot = resolve_lut(&mut st.enhance.gamma, &st.luts, |ram, lut| {
                ram.write_gamma(0, lut)?;
                Ok(ram.gamma_addr(0))
            });
            match slot {
                Ok(Some(addr)) => self.regs.write(GAMMA_LUT_BASE_ADDR, addr)?,
                Ok(None) => {}
                Err(e) => {
                    error!("enhance gamma reload failed: {}", e);
                    first_err(&mut result, Err(e));
                }
            }
            self.regs.modify(ENHANCE_UPDATE, EnhanceUpdate::GAMMA::SET)?;
            info!("enhance gamma reload");
        }

        if en.contains(EnhanceModules::LTM) {
            let words = st.enhance.slp.pack();
            self.regs.write(slp_cfg(SLP_LTM_WORD), words[SLP_LTM_WORD])?;
            info!("enhance ltm reload");
        }

        if en.contains(EnhanceModules::LUT3D) {
            let entry_indexed = st.params.lut3d_entry_indexed;
            let slot = resolve_lut(&mut st.enhance.lut3d, &st.luts, |ram, lut| {
                ram.write_lut3d(0, lut, entry_indexed)?;
                Ok(ram.lut3d_addr(0))
            });
            match slot {
                Ok(Some(addr)) => self.regs.write(THREED_LUT_BASE_ADDR, addr)?,
                Ok(None) => {}
                Err(e) => {
                    error!("enhance lut3d reload failed: {}", e);
                    first_err(&mut result, Err(e));
                }
            }
            self.regs.modify(ENHANCE_UPDATE, EnhanceUpdate::LUT3D::SET)?;
            info!("enhance lut3d reload");
        }

        if en.contains(EnhanceModules::UD) {
            self.write_words(ud_reg, &st.enhance.ud.pack())?;
            info!("enhance ud reload");
        }

        self.regs.write(DPU_ENHANCE_CFG, en.bits())?;
        st.first_frame = true;
        result
    }

    /// Runs `read` with the engine stopped so the LUT read ports are
    /// usable, then restarts it.
    fn with_engine_stopped<T>(
        &self,
        st: &mut DpuState,
        read: impl FnOnce(&Self) -> DpuResult<T>,
    ) -> DpuResult<T> {
        let mut result = self.stop_locked(st);
        let value = read(self);
        first_err(&mut result, self.run_locked(st));
        let value = value?;
        result.map(|_| value)
    }

    fn read_port(&self, addr_reg: u32, data_reg: u32, index: usize) -> DpuResult<u32> {
        self.regs.write(addr_reg, index as u32)?;
        thread::sleep(LUT_READ_SETTLE);
        self.regs.read(data_reg)
    }

    fn read_gamma_port(&self) -> DpuResult<GammaLut> {
        let mut lut = GammaLut::default();
        for i in 0..GAMMA_ENTRIES {
            let (r, g, b) = unpack_rgb_entry(self.read_port(GAMMA_LUT_ADDR, GAMMA_LUT_RDATA, i)?);
            lut.r[i] = r;
            lut.g[i] = g;
            lut.b[i] = b;
        }
        Ok(lut)
    }

    fn read_hsv_ports(&self) -> DpuResult<HsvLuts> {
        let mut luts = HsvLuts::default();
        for (port, table) in luts.tables.iter_mut().enumerate().take(HSV_LUT_PORTS) {
            for j in 0..HSV_ENTRIES {
                let val = self.read_port(hsv_lut_addr(port), hsv_lut_raddr(port), j)?;
                (table.h_o[j], table.s_g[j]) = unpack_hsv_entry(val);
            }
        }
        Ok(luts)
    }

    /// Reads a setting back from hardware or from the engine's bookkeeping.
    pub(super) fn enhance_get_locked(
        &self,
        st: &mut DpuState,
        id: EnhanceId,
    ) -> DpuResult<EnhanceValue> {
        let value = match id {
            EnhanceId::Enable => EnhanceValue::Modules(EnhanceModules::from_bits_retain(
                self.regs.read(DPU_ENHANCE_CFG)?,
            )),
            EnhanceId::Scl => {
                EnhanceValue::Scl(ScaleCfg::from_blend_size(self.regs.read(BLEND_SIZE)?))
            }
            EnhanceId::Epf => EnhanceValue::Epf(EpfCfg::unpack(self.read_words(epf_reg)?)),
            EnhanceId::Cm => {
                EnhanceValue::Cm(CmCfg::unpack(self.read_words::<CM_COEF_WORDS>(cm_coef)?))
            }
            EnhanceId::Slp | EnhanceId::Ltm => {
                EnhanceValue::Slp(SlpCfg::unpack(self.read_words::<SLP_CFG_WORDS>(slp_cfg)?))
            }
            EnhanceId::Ud => EnhanceValue::Ud(UdCfg::unpack(self.read_words(ud_reg)?)),
            EnhanceId::Hsv => {
                let (params, luts) = self.with_engine_stopped(st, |dpu| {
                    let params = HsvParams::unpack(dpu.regs.read(HSV_CFG)?);
                    Ok((params, dpu.read_hsv_ports()?))
                })?;
                EnhanceValue::Hsv(params, Box::new(luts))
            }
            EnhanceId::Gamma => {
                let lut = self.with_engine_stopped(st, |dpu| dpu.read_gamma_port())?;
                EnhanceValue::Gamma(Box::new(lut))
            }
            EnhanceId::SlpLut => {
                let lut = self.with_engine_stopped(st, |dpu| {
                    (0..SLP_LUT_ENTRIES)
                        .map(|i| dpu.read_port(SLP_LUT_ADDR, SLP_LUT_RDATA, i))
                        .collect::<DpuResult<Vec<u32>>>()
                })?;
                EnhanceValue::SlpLut(lut)
            }
            EnhanceId::Lut3d => {
                let lut = self.with_engine_stopped(st, |dpu| {
                    (0..LUT3D_ENTRIES)
                        .map(|j| dpu.read_port(threed_lut_addr(0), threed_lut_rdata(0), j))
                        .collect::<DpuResult<Vec<u32>>>()
                })?;
                EnhanceValue::Lut3d(lut)
            }
            EnhanceId::CabcHistV2 => {
                let mut hist = Vec::with_capacity(CABC_HIST_WORDS);
                for n in 0..CABC_HIST_WORDS {
                    hist.push(self.regs.read(cabc_hist(n))?);
                    thread::sleep(LUT_READ_SETTLE);
                }
                EnhanceValue::CabcHist(hist)
            }
            EnhanceId::CabcCurBl => EnhanceValue::CabcCurBl(st.cabc.para.cur_bl),
            EnhanceId::VsyncCount => {
                EnhanceValue::VsyncCount(self.vsync_count.load(Ordering::SeqCst))
            }
            EnhanceId::FrameNo => EnhanceValue::FrameNo(st.cabc.frame_no()),
            EnhanceId::CabcState => EnhanceValue::CabcState(cabc_state(&st.cabc.sm)),
            EnhanceId::UpdateLuts => {
                let sel = st
                    .enhance
                    .lut_select
                    .ok_or(DpuError::InvalidArgument("no lut selected"))?;
                let ram = lut_ram(&st.luts)?;
                info!("dump luts {:?}", sel);
                EnhanceValue::Luts(match sel {
                    LutSelect::Gamma { index } => {
                        LutsDump::Gamma(Box::new(ram.read_gamma(index.into())?))
                    }
                    LutSelect::Hsv { index, .. } => {
                        LutsDump::Hsv(Box::new(ram.read_hsv(index.into())?))
                    }
                    LutSelect::Lut3d { index } => {
                        let (slot, sub) = lut3d_select(index);
                        LutsDump::Lut3d(ram.read_lut3d(slot, sub)?)
                    }
                })
            }
            EnhanceId::Disable
            | EnhanceId::CabcParam
            | EnhanceId::SrEpf
            | EnhanceId::CabcMode
            | EnhanceId::CabcHist
            | EnhanceId::CabcRun => {
                return Err(DpuError::InvalidArgument("enhance setting is write only"))
            }
        };
        info!("enhance {:?} get", id);
        Ok(value)
    }
}
