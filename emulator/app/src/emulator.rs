/*++

Licensed under the Apache-2.0 license.

File Name:

    emulator.rs

Abstract:

    File contains the Emulator struct implementation: an emulated display
    subsystem driven through a scripted composition session.

--*/

use clap::{Parser, ValueEnum};
use dpu_driver::config::DpuConfig;
use dpu_driver::enhance::{CabcState, EnhanceParam};
use dpu_driver::error::DpuResult;
use dpu_driver::layer::{DrmFormat, Layer, Rect};
use dpu_driver::platform::DsiWorkMode;
use dpu_driver::{
    create_dpu_core, DpuCore, DpuStatus, InterfaceType, PanelConfig, VideoMode, DPU_R6P0,
};
use emulator_periph::{DisplaySystem, DisplaySystemArgs, IrqDispatcher, BACKLIGHT_NAME};
use log::{info, warn, LevelFilter};
use registers_dpu::regs::{cabc_hist, CABC_HIST_WORDS};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// One refresh at 60 Hz.
const FRAME_PERIOD: Duration = Duration::from_micros(16_667);

/// Vsyncs after the last frame, enough for write-back to capture it.
const STATIC_VSYNCS: u32 = 6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Interface {
    Dpi,
    Edpi,
}

impl From<Interface> for InterfaceType {
    fn from(interface: Interface) -> Self {
        match interface {
            Interface::Dpi => InterfaceType::Dpi,
            Interface::Edpi => InterfaceType::Edpi,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DsiMode {
    Video,
    Command,
}

impl From<DsiMode> for DsiWorkMode {
    fn from(mode: DsiMode) -> Self {
        match mode {
            DsiMode::Video => DsiWorkMode::Video,
            DsiMode::Command => DsiWorkMode::Command,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "Sprd DPU Emulator")]
pub struct EmulatorArgs {
    /// Board description and driver tunables (TOML)
    #[arg(short, long, env = "DPU_EMULATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Panel interface
    #[arg(long, value_enum, default_value_t = Interface::Dpi)]
    pub interface: Interface,

    /// Work mode of the DSI host
    #[arg(long, value_enum, default_value_t = DsiMode::Video)]
    pub dsi_mode: DsiMode,

    /// Frames to compose
    #[arg(short, long, default_value_t = 8)]
    pub frames: u32,

    /// Vsyncs each frame stays on screen
    #[arg(long, default_value_t = 2)]
    pub vsyncs_per_frame: u32,

    #[arg(long, default_value_t = 1080)]
    pub width: u32,

    #[arg(long, default_value_t = 2400)]
    pub height: u32,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// Compress write-back captures
    #[arg(long, default_value_t = false)]
    pub wb_xfbc: bool,

    /// Run the adaptive backlight loop alongside composition
    #[arg(long, default_value_t = false)]
    pub cabc: bool,
}

pub struct Emulator {
    pub system: DisplaySystem,
    pub core: Arc<dyn DpuCore>,
    args: EmulatorArgs,
    _irq: IrqDispatcher,
}

impl Emulator {
    /// Assembles the display subsystem described by the command line.
    /// Board settings missing from the config file fall back to the
    /// emulated board's own resources.
    pub fn from_args(args: EmulatorArgs) -> DpuResult<Self> {
        let system = DisplaySystem::new(DisplaySystemArgs {
            dsi_mode: args.dsi_mode.into(),
            ..Default::default()
        });

        let mut config = match &args.config {
            Some(path) => DpuConfig::load(path)?,
            None => DpuConfig::default(),
        };
        let dt = &mut config.device_tree;
        if dt.wb_memory.is_none() {
            dt.wb_memory = Some(system.wb_memory());
        }
        if dt.backlight.is_none() {
            dt.backlight = Some(BACKLIGHT_NAME.to_string());
        }
        if args.wb_xfbc {
            config.params.wb_xfbc_en = true;
        }

        let core = create_dpu_core(DPU_R6P0, system.regs(), system.platform(), &config)?;
        let irq = system.attach(core.clone());
        Ok(Self {
            system,
            core,
            args,
            _irq: irq,
        })
    }

    pub fn panel(&self) -> PanelConfig {
        PanelConfig {
            vm: VideoMode {
                hactive: self.args.width,
                vactive: self.args.height,
                hsync_len: 4,
                hback_porch: 40,
                hfront_porch: 60,
                vsync_len: 4,
                vback_porch: 32,
                vfront_porch: 16,
            },
            interface: self.args.interface.into(),
        }
    }

    /// Stack for `frame`: a wallpaper plus up to three more layers, the
    /// last of them a solid color.
    fn frame_layers(&self, frame: u32) -> Vec<Layer> {
        let (w, h) = (self.args.width, self.args.height);
        let base = self.system.dma.base();
        let image = |index: usize, dst: Rect| Layer {
            index,
            addr: [base + 0x1000 * index as u32, 0, 0, 0],
            pitch: [dst.w * 4, 0, 0, 0],
            src: Rect::new(0, 0, dst.w, dst.h),
            dst,
            format: DrmFormat::ARGB8888,
            ..Default::default()
        };

        let mut layers = vec![image(0, Rect::new(0, 0, w, h))];
        let count = 1 + frame as usize % 4;
        if count > 1 {
            layers.push(image(1, Rect::new(0, 0, w, h / 16)));
        }
        if count > 2 {
            layers.push(image(2, Rect::new(w / 8, h / 4, w * 3 / 4, h / 2)));
        }
        if count > 3 {
            layers.push(Layer {
                index: 3,
                dst: Rect::new(w / 4, h / 2, w / 2, h / 8),
                pallete_en: true,
                pallete_color: 0xff20_4080,
                ..Default::default()
            });
        }
        layers
    }

    /// Raises a vsync and lets one refresh period pass.
    fn tick(&self) {
        self.system.dpu.vsync();
        thread::sleep(FRAME_PERIOD);
    }

    /// Histogram the engine would have gathered over `frame`.
    fn feed_histogram(&self, frame: u32) {
        for n in 0..CABC_HIST_WORDS {
            let bin = (n as u32 + frame) % CABC_HIST_WORDS as u32;
            self.system.dpu.set_reg(cabc_hist(n), bin * 16);
        }
    }

    /// Powers the engine up, composes the scripted frames, and powers it
    /// down again. Returns the engine's state just before power down.
    pub fn run(&self) -> DpuResult<DpuStatus> {
        info!("dpu version 0x{:08x}", self.core.version()?);
        self.core.init(&self.panel())?;
        self.core.ifconfig()?;
        self.core.run()?;
        self.core.enable_vsync()?;

        if self.args.cabc {
            self.core
                .enhance_set(EnhanceParam::CabcState(CabcState::Working))?;
        }

        for frame in 0..self.args.frames {
            let layers = self.frame_layers(frame);
            match self.core.flip(&layers) {
                Ok(()) => info!("frame {}: {} layers", frame, layers.len()),
                Err(e) => warn!("frame {} flip failed: {}", frame, e),
            }
            if self.args.cabc {
                self.feed_histogram(frame);
                self.core.enhance_set(EnhanceParam::CabcRun)?;
            }
            for _ in 0..self.args.vsyncs_per_frame {
                self.tick();
            }
        }

        for _ in 0..STATIC_VSYNCS {
            self.tick();
        }

        let status = self.core.status();
        self.core.stop()?;
        self.core.uninit()?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> EmulatorArgs {
        let base = ["dpu-emulator", "--width", "64", "--height", "32", "--frames", "4"];
        EmulatorArgs::parse_from(base.iter().chain(extra.iter()))
    }

    #[test]
    fn test_default_args() {
        let args = EmulatorArgs::parse_from(["dpu-emulator"]);
        assert_eq!(args.interface, Interface::Dpi);
        assert_eq!(args.dsi_mode, DsiMode::Video);
        assert_eq!((args.width, args.height), (1080, 2400));
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_video_mode_session() {
        let emulator = Emulator::from_args(args(&["--cabc"])).unwrap();
        let status = emulator.run().unwrap();
        assert!(status.inited);
        assert!(status.vsync_count > 0);
        assert_eq!(status.max_vsync_count, 4);
        assert!(!emulator.core.status().inited);
    }

    #[test]
    fn test_command_mode_session_with_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[params]\ntime = 100\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let emulator = Emulator::from_args(args(&[
            "--interface",
            "edpi",
            "--dsi-mode",
            "command",
            "--config",
            &path,
        ]))
        .unwrap();
        assert_eq!(emulator.core.module_params().time, 100);
        let status = emulator.run().unwrap();
        assert!(!status.stopped);
    }
}
