// Licensed under the Apache-2.0 license

#[cfg(test)]
mod common;

use common::{image_layer, setup, wait_for, TestDisplay, SETTLE_TIMEOUT};
use dpu_driver::layer::{Layer, Rect};
use dpu_driver::InterfaceType;
use emulator_periph::DisplaySystemArgs;
use registers_dpu::regs::{
    layer_offset, LAYER_ADDR0, LAYER_ENABLE, WB_BASE_ADDR, WB_CTRL, WB_LAYER_INDEX,
};
use std::time::Duration;

const FULL_SCREEN: Rect = Rect::new(0, 0, common::PANEL_WIDTH, common::PANEL_HEIGHT);

/// Vsyncs until a static frame is captured: the counter has to pass the
/// configured threshold of four.
const CAPTURE_VSYNCS: usize = 5;

fn two_layers(display: &TestDisplay) -> [Layer; 2] {
    [
        image_layer(&display.system, 0, FULL_SCREEN),
        image_layer(&display.system, 1, Rect::new(0, 0, 64, 8)),
    ]
}

fn wb_triggers(display: &TestDisplay) -> usize {
    display
        .system
        .dpu
        .take_writes()
        .iter()
        .filter(|(offset, val)| *offset == WB_CTRL && val & 1 != 0)
        .count()
}

#[test]
fn test_static_frame_is_captured_and_replayed() {
    let display = setup();
    let status = display.core.status();
    assert_eq!(status.max_vsync_count, 4);
    assert_eq!(
        display.system.dpu.reg(WB_BASE_ADDR),
        display.system.wb_memory().base
    );

    display.core.flip(&two_layers(&display)).unwrap();
    assert!(display.core.status().wb_en);

    for _ in 0..CAPTURE_VSYNCS {
        display.vsync();
    }

    let dpu = &display.system.dpu;
    assert!(wait_for(SETTLE_TIMEOUT, || dpu.reg(LAYER_ENABLE)
        == 1 << WB_LAYER_INDEX));
    assert_eq!(
        dpu.reg(layer_offset(WB_LAYER_INDEX) + LAYER_ADDR0),
        display.system.wb_memory().base
    );
    assert!(!display.core.status().wb_en);
}

#[test]
fn test_failed_capture_is_rearmed() {
    let display = setup();
    let dpu = &display.system.dpu;
    dpu.fail_next_write_back();
    display.core.flip(&two_layers(&display)).unwrap();

    for _ in 0..CAPTURE_VSYNCS {
        display.vsync();
    }
    assert!(wait_for(SETTLE_TIMEOUT, || display
        .core
        .status()
        .vsync_count
        == 0));
    let status = display.core.status();
    assert!(status.wb_en);
    assert_eq!(dpu.reg(LAYER_ENABLE), 0b11);

    for _ in 0..CAPTURE_VSYNCS {
        display.vsync();
    }
    assert!(wait_for(SETTLE_TIMEOUT, || dpu.reg(LAYER_ENABLE)
        == 1 << WB_LAYER_INDEX));
}

#[test]
fn test_single_layer_is_not_captured() {
    let display = setup();
    display.system.dpu.set_trace(true);
    display
        .core
        .flip(&[image_layer(&display.system, 0, FULL_SCREEN)])
        .unwrap();
    assert!(!display.core.status().wb_en);

    for _ in 0..CAPTURE_VSYNCS + 1 {
        display.vsync();
    }
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(wb_triggers(&display), 0);
    assert_eq!(display.system.dpu.reg(LAYER_ENABLE), 1);
}

#[test]
fn test_disabled_flip_keeps_layers() {
    let display = setup();
    display.core.disable_flip(true);
    display.system.dpu.set_trace(true);
    display.core.flip(&two_layers(&display)).unwrap();

    for _ in 0..CAPTURE_VSYNCS {
        display.vsync();
    }
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(wb_triggers(&display), 0);
    assert_eq!(display.system.dpu.reg(LAYER_ENABLE), 0b11);
    assert!(display.core.status().flip_disabled);
}

#[test]
fn test_missing_reserved_memory_disables_capture() {
    let display = TestDisplay::new(DisplaySystemArgs::default(), |config| {
        config.device_tree.wb_memory = None;
        config.params.max_vsync_count = 4;
    });
    display.power_on(InterfaceType::Dpi);
    assert_eq!(display.core.status().max_vsync_count, 0);

    display.core.flip(&two_layers(&display)).unwrap();
    assert!(!display.core.status().wb_en);
}

#[test]
fn test_debug_capture() {
    let display = setup();
    display.system.dpu.set_trace(true);
    display.core.write_back(1, true).unwrap();
    let writes = display.system.dpu.take_writes();
    assert!(writes.contains(&(WB_CTRL, 1 << 1)));
}
