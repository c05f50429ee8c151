// Licensed under the Apache-2.0 license

//! The r6p0 display engine.
//!
//! Caller operations and deferred work serialize on the state mutex. The
//! interrupt handler never takes it; everything it shares with the rest of
//! the engine is atomic.

mod cabc;
mod cabc_sm;
mod ctrl;
mod dsc;
mod dvfs;
mod enhance;
mod flip;
mod isr;
mod luts;
mod secure;
mod tables;
mod writeback;

pub use luts::{LUTS_CHUNKS, LUT_RAM_SIZE};
pub use tables::corner_rows;

use crate::config::{
    DeviceTreeConfig, DpuConfig, DvfsTable, ModuleParam, ModuleParams, Qos,
};
use crate::enhance::{CabcPara, EnhanceCache, EnhanceId, EnhanceParam, EnhanceValue};
use crate::error::{DpuError, DpuResult};
use crate::events::{HwEvent, HwEvents};
use crate::layer::{DrmFormat, Layer};
use crate::platform::{BacklightRegistry, BacklightSink, DmaAllocator, DsiHost, DvfsNotifierChain, Platform};
use crate::regs::DpuRegs;
use crate::workqueue::{Work, WorkQueue};
use crate::{Capability, DisplayMode, DpuCore, DpuStatus, InterfaceType, PanelConfig};
use cabc_sm::{cabc_state, new_state_machine, CabcStateMachine};
use disp_trusty::TrustyChannel;
use dsc::DscPreset;
use log::{error, info};
use luts::LutRam;
use registers_dpu::bits::DpuCtrl;
use registers_dpu::regs::{cabc_cfg, DPU_CTRL, DPU_INT_EN, DPU_VERSION};
use registers_dpu::DpuIrq;
use secure::SecureGateway;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tock_registers::fields::FieldValue;

/// Layers a single flip may carry.
pub const MAX_LAYERS: usize = 6;

pub const PRIMARY_FORMATS: &[DrmFormat] = &[
    DrmFormat::XRGB8888,
    DrmFormat::XBGR8888,
    DrmFormat::ARGB8888,
    DrmFormat::ABGR8888,
    DrmFormat::RGBA8888,
    DrmFormat::BGRA8888,
    DrmFormat::RGBX8888,
    DrmFormat::BGRX8888,
    DrmFormat::RGB565,
    DrmFormat::BGR565,
    DrmFormat::NV12,
    DrmFormat::NV21,
    DrmFormat::NV16,
    DrmFormat::NV61,
    DrmFormat::YUV420,
];

/// Capture target and the layer that replays it.
struct WriteBack {
    layer: Layer,
    base: u32,
    configured: bool,
    size_changed: bool,
}

struct Cabc {
    sm: CabcStateMachine,
    para: CabcPara,
    backlight: Option<Arc<dyn BacklightSink>>,
}

impl Cabc {
    fn frame_no(&self) -> u32 {
        self.sm.context().inner_ctx.frame_no
    }

    fn set_frame_no(&mut self, frame_no: u32) {
        self.sm.context_mut().inner_ctx.frame_no = frame_no;
    }
}

/// Everything guarded by the refresh lock.
struct DpuState {
    dt: DeviceTreeConfig,
    qos: Qos,
    params: ModuleParams,
    panel: PanelConfig,
    is_stopped: bool,
    panel_ready: bool,
    single_run: bool,
    first_frame: bool,
    disable_flip: bool,
    dsc: DscPreset,
    enhance: EnhanceCache,
    need_scale: bool,
    mode_changed: bool,
    luts: Option<LutRam>,
    luts_chunk: u32,
    wb: WriteBack,
    cabc: Cabc,
    secure: SecureGateway,
}

impl DpuState {
    fn new(config: &DpuConfig, trusty: Box<dyn TrustyChannel>) -> Self {
        let params = config.params.clone();
        Self {
            dt: DeviceTreeConfig::default(),
            qos: Qos::default(),
            panel: PanelConfig::default(),
            is_stopped: true,
            panel_ready: true,
            single_run: false,
            first_frame: false,
            disable_flip: false,
            dsc: DscPreset::default(),
            enhance: EnhanceCache::default(),
            need_scale: false,
            mode_changed: false,
            luts: None,
            luts_chunk: 0,
            wb: WriteBack {
                layer: Layer::default(),
                base: 0,
                configured: false,
                size_changed: true,
            },
            cabc: Cabc {
                sm: new_state_machine(params.cabc_state, params.frame_no),
                para: CabcPara::default(),
                backlight: None,
            },
            secure: SecureGateway::new(trusty),
            params,
        }
    }

    fn is_edpi(&self) -> bool {
        self.panel.interface == InterfaceType::Edpi
    }

    fn is_dpi(&self) -> bool {
        self.panel.interface == InterfaceType::Dpi
    }
}

pub struct DpuR6p0 {
    regs: DpuRegs,
    events: HwEvents,
    state: Mutex<DpuState>,
    vsync_count: AtomicU32,
    max_vsync_count: AtomicU32,
    wb_en: AtomicBool,
    cabc_bl_set: AtomicBool,
    is_inited: AtomicBool,
    wq: WorkQueue,
    dsi: Arc<dyn DsiHost>,
    backlights: BacklightRegistry,
    dma: Arc<dyn DmaAllocator>,
    dvfs: DvfsNotifierChain,
    dvfs_table: DvfsTable,
}

impl DpuR6p0 {
    pub fn new(regs: DpuRegs, platform: Platform, config: &DpuConfig) -> Arc<Self> {
        let Platform {
            dsi,
            backlights,
            dma,
            dvfs,
            trusty,
        } = platform;
        Arc::new_cyclic(|engine: &Weak<Self>| {
            let engine = engine.clone();
            let wq = WorkQueue::spawn("dpu-r6p0", move |work| match engine.upgrade() {
                Some(dpu) => {
                    dpu.run_work(work);
                    true
                }
                None => false,
            });
            Self {
                regs,
                events: HwEvents::default(),
                vsync_count: AtomicU32::new(0),
                max_vsync_count: AtomicU32::new(config.params.max_vsync_count),
                wb_en: AtomicBool::new(false),
                cabc_bl_set: AtomicBool::new(false),
                is_inited: AtomicBool::new(false),
                state: Mutex::new(DpuState::new(config, trusty)),
                wq,
                dsi,
                backlights,
                dma,
                dvfs,
                dvfs_table: config.dvfs,
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, DpuState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn inited(&self) -> bool {
        self.is_inited.load(Ordering::SeqCst)
    }

    /// Sets `bits` in the control register and waits for the matching
    /// completion. The flag is cleared before the write so an interrupt that
    /// fires immediately is still seen.
    fn kick_and_wait(
        &self,
        bits: FieldValue<u32, DpuCtrl::Register>,
        event: HwEvent,
    ) -> DpuResult<()> {
        self.events.flag(event).clear();
        self.regs.modify(DPU_CTRL, bits)?;
        self.events.wait(event).inspect_err(|_| {
            error!("dpu wait for {} done time out!", event);
        })
    }

    fn run_work(&self, work: Work) {
        let result = match work {
            Work::WriteBack => self.wb_work(),
            Work::CabcTrigger => self.cabc_work(),
            Work::CabcBacklight => {
                self.cabc_bl_work();
                Ok(())
            }
            Work::Dvfs => self.dvfs_work(),
        };
        if let Err(e) = result {
            error!("{:?} work failed: {}", work, e);
        }
    }
}

/// Keeps the first error of a multi-step operation while the remaining
/// steps still run.
fn first_err(first: &mut DpuResult<()>, result: DpuResult<()>) {
    if first.is_ok() {
        *first = result;
    }
}

impl DpuCore for DpuR6p0 {
    fn parse_dt(&self, dt: &DeviceTreeConfig) -> DpuResult<()> {
        let mut st = self.lock();
        if let Some(radius) = dt.corner_radius {
            if radius > tables::MAX_CORNER_RADIUS {
                return Err(DpuError::Config(format!(
                    "corner radius {} exceeds {}",
                    radius,
                    tables::MAX_CORNER_RADIUS
                )));
            }
            info!("round corner support, radius = {}.", radius);
        }
        st.qos = Qos::from_config(dt.qos.as_ref());
        st.dt = dt.clone();
        Ok(())
    }

    fn version(&self) -> DpuResult<u32> {
        self.regs.read(DPU_VERSION)
    }

    fn init(&self, panel: &PanelConfig) -> DpuResult<()> {
        let mut st = self.lock();
        st.panel = *panel;
        self.init_locked(&mut st)
    }

    fn uninit(&self) -> DpuResult<()> {
        let mut st = self.lock();
        self.uninit_locked(&mut st)
    }

    fn run(&self) -> DpuResult<()> {
        let mut st = self.lock();
        self.run_locked(&mut st)
    }

    fn stop(&self) -> DpuResult<()> {
        let mut st = self.lock();
        self.stop_locked(&mut st)
    }

    fn isr(&self) -> u32 {
        self.handle_irq()
    }

    fn ifconfig(&self) -> DpuResult<()> {
        let mut st = self.lock();
        self.dpi_init(&mut st)
    }

    fn capability(&self) -> Capability {
        Capability {
            max_layers: MAX_LAYERS,
            formats: PRIMARY_FORMATS,
        }
    }

    fn flip(&self, layers: &[Layer]) -> DpuResult<()> {
        let mut st = self.lock();
        self.flip_locked(&mut st, layers)
    }

    fn bg_color(&self, color: u32) -> DpuResult<()> {
        let mut st = self.lock();
        self.bg_color_locked(&mut st, color)
    }

    fn enable_vsync(&self) -> DpuResult<()> {
        let _st = self.lock();
        self.regs.set_bits(DPU_INT_EN, DpuIrq::DPI_VSYNC.bits())
    }

    fn disable_vsync(&self) {}

    fn enhance_set(&self, param: EnhanceParam) -> DpuResult<()> {
        let mut st = self.lock();
        if self.inited() {
            self.enhance_set_locked(&mut st, param)
        } else {
            self.enhance_backup(&mut st, param)
        }
    }

    fn enhance_get(&self, id: EnhanceId) -> DpuResult<EnhanceValue> {
        let mut st = self.lock();
        self.enhance_get_locked(&mut st, id)
    }

    fn modeset(&self, mode: DisplayMode) -> DpuResult<()> {
        let mut st = self.lock();
        self.modeset_locked(&mut st, mode);
        Ok(())
    }

    fn write_back(&self, count: u8, debug: bool) -> DpuResult<()> {
        let mut st = self.lock();
        self.wb_trigger(&mut st, count, debug)
    }

    fn dma_request(&self) -> DpuResult<()> {
        let _st = self.lock();
        self.regs.write(cabc_cfg(5), 1)
    }

    fn module_params(&self) -> ModuleParams {
        let st = self.lock();
        ModuleParams {
            max_vsync_count: self.max_vsync_count.load(Ordering::SeqCst),
            cabc_state: cabc_state(&st.cabc.sm),
            frame_no: st.cabc.frame_no(),
            ..st.params.clone()
        }
    }

    fn set_module_param(&self, param: ModuleParam) {
        let mut st = self.lock();
        match param {
            ModuleParam::Time(us) => st.params.time = us,
            ModuleParam::SecureDebug(on) => st.params.secure_debug = on,
            ModuleParam::MaxVsyncCount(n) => {
                st.params.max_vsync_count = n;
                self.max_vsync_count.store(n, Ordering::SeqCst);
            }
            ModuleParam::CabcBlSetDelay(ms) => st.params.cabc_bl_set_delay = ms,
        }
        info!("module param set: {:?}", param);
    }

    fn disable_flip(&self, disabled: bool) {
        self.lock().disable_flip = disabled;
    }

    fn status(&self) -> DpuStatus {
        let st = self.lock();
        DpuStatus {
            inited: self.inited(),
            stopped: st.is_stopped,
            panel_ready: st.panel_ready,
            flip_disabled: st.disable_flip,
            vsync_count: self.vsync_count.load(Ordering::SeqCst),
            max_vsync_count: self.max_vsync_count.load(Ordering::SeqCst),
            wb_en: self.wb_en.load(Ordering::SeqCst),
            cabc_bl_set: self.cabc_bl_set.load(Ordering::SeqCst),
            cabc_state: cabc_state(&st.cabc.sm),
            frame_no: st.cabc.frame_no(),
            enhance_en: st.enhance.enhance_en,
        }
    }
}

