// Licensed under the Apache-2.0 license

#[cfg(test)]
mod common;

use common::panel;
use dpu_driver::config::{DpuConfig, ModuleParam};
use dpu_driver::enhance::CabcState;
use dpu_driver::error::DpuError;
use dpu_driver::{create_dpu_core, InterfaceType, DPU_R6P0};
use emulator_periph::{DisplaySystem, DisplaySystemArgs, DPU_R6P0_VERSION};
use registers_dpu::regs::{CORNER_CONFIG, DPU_CFG1};
use std::io::Write;
use tempfile::NamedTempFile;

const BOARD: &str = r#"
[device-tree]
corner-radius = 8
backlight = "sprd_backlight"

[device-tree.qos]
arqos-low = 1
arqos-high = 2

[device-tree.wb-memory]
base = 0x90000000
size = 0x1000000

[params]
time = 200
cabc_state = "Working"
cabc_bl_set_delay = 3

[dvfs]
high = 600000000
"#;

fn load(contents: &str) -> DpuConfig {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    DpuConfig::load(file.path()).unwrap()
}

#[test]
fn test_board_file_drives_the_engine() {
    let config = load(BOARD);
    assert_eq!(config.dvfs.high, 600_000_000);
    assert_eq!(config.dvfs.low, 384_000_000);

    let system = DisplaySystem::new(DisplaySystemArgs::default());
    let core = create_dpu_core(DPU_R6P0, system.regs(), system.platform(), &config).unwrap();
    let _irq = system.attach(core.clone());
    assert_eq!(core.version().unwrap(), DPU_R6P0_VERSION);

    let params = core.module_params();
    assert_eq!(params.time, 200);
    assert_eq!(params.cabc_state, CabcState::Working);

    core.init(&panel(InterfaceType::Dpi)).unwrap();
    // Write-back found its reserved region.
    assert_eq!(core.status().max_vsync_count, 4);

    let dpu = &system.dpu;
    assert_eq!(dpu.reg(CORNER_CONFIG), 8 << 24 | 1 << 16 | 8 << 8 | 1);
    let cfg1 = dpu.reg(DPU_CFG1);
    assert_eq!(cfg1 & 0xf, 1);
    assert_eq!(cfg1 >> 4 & 0xf, 2);

    core.set_module_param(ModuleParam::MaxVsyncCount(6));
    core.set_module_param(ModuleParam::SecureDebug(true));
    let params = core.module_params();
    assert_eq!(params.max_vsync_count, 6);
    assert!(params.secure_debug);
    assert_eq!(core.status().max_vsync_count, 6);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        DpuConfig::load(&dir.path().join("absent.toml")),
        Err(DpuError::Config(_))
    ));
}

#[test]
fn test_unknown_engine() {
    let system = DisplaySystem::new(DisplaySystemArgs::default());
    let result = create_dpu_core(
        "dpu-r5p1",
        system.regs(),
        system.platform(),
        &DpuConfig::default(),
    );
    assert_eq!(
        result.err(),
        Some(DpuError::UnsupportedVersion("dpu-r5p1".into()))
    );
}

#[test]
fn test_oversized_corner_radius() {
    let config = load("[device-tree]\ncorner-radius = 4096\n");
    let system = DisplaySystem::new(DisplaySystemArgs::default());
    let result = create_dpu_core(DPU_R6P0, system.regs(), system.platform(), &config);
    assert!(matches!(result.err(), Some(DpuError::Config(_))));
}
