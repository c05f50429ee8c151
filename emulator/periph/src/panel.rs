/*++

Licensed under the Apache-2.0 license.

File Name:

    panel.rs

Abstract:

    File contains the emulated DSI host and panel backlight.

--*/

use dpu_driver::platform::{BacklightSink, DsiHost, DsiWorkMode};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
pub struct EmulatedDsi {
    mode: DsiWorkMode,
}

impl EmulatedDsi {
    pub fn new(mode: DsiWorkMode) -> Self {
        Self { mode }
    }
}

impl DsiHost for EmulatedDsi {
    fn work_mode(&self) -> DsiWorkMode {
        self.mode
    }
}

/// Full scale of the CABC backlight domain.
const CABC_SCALE: u32 = 1020;

/// Something applied to the backlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightUpdate {
    Cabc { level: u16, reference: u16 },
    Brightness(u16),
}

#[derive(Debug)]
struct BacklightState {
    brightness: u16,
    max_brightness: u16,
    cabc_en: bool,
    updates: Vec<BacklightUpdate>,
}

/// A PWM backlight. Clones share the same device.
#[derive(Debug, Clone)]
pub struct EmulatedBacklight {
    state: Arc<Mutex<BacklightState>>,
}

impl EmulatedBacklight {
    pub fn new(brightness: u16, max_brightness: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(BacklightState {
                brightness,
                max_brightness: max_brightness.max(1),
                cabc_en: false,
                updates: Vec::new(),
            })),
        }
    }

    /// User brightness change, as from sysfs.
    pub fn set_user_brightness(&self, brightness: u16) {
        let mut state = self.lock();
        state.brightness = brightness.min(state.max_brightness);
    }

    pub fn cabc_enabled(&self) -> bool {
        self.lock().cabc_en
    }

    pub fn updates(&self) -> Vec<BacklightUpdate> {
        self.lock().updates.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BacklightState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EmulatedBacklight {
    fn default() -> Self {
        Self::new(255, 255)
    }
}

impl BacklightSink for EmulatedBacklight {
    fn normalized_level(&self) -> u16 {
        let state = self.lock();
        let level = u32::from(state.brightness) * CABC_SCALE / u32::from(state.max_brightness);
        u16::try_from(level).unwrap_or(u16::MAX)
    }

    fn set_cabc(&self, level: u16, reference: u16) {
        let mut state = self.lock();
        state.cabc_en = true;
        state.updates.push(BacklightUpdate::Cabc { level, reference });
        debug!("backlight cabc level {} of {}", level, reference);
    }

    fn set_brightness(&self, level: u16) {
        let mut state = self.lock();
        state.cabc_en = false;
        state.updates.push(BacklightUpdate::Brightness(level));
        debug!("backlight brightness {}", level);
    }

    fn brightness(&self) -> u16 {
        self.lock().brightness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_level() {
        let bl = EmulatedBacklight::new(128, 255);
        assert_eq!(bl.normalized_level(), 512);
        bl.set_user_brightness(300);
        assert_eq!(bl.brightness(), 255);
        assert_eq!(bl.normalized_level(), 1020);
    }

    #[test]
    fn test_cabc_then_plain_update() {
        let bl = EmulatedBacklight::default();
        bl.set_cabc(400, 800);
        assert!(bl.cabc_enabled());
        bl.set_brightness(bl.brightness());
        assert!(!bl.cabc_enabled());
        assert_eq!(
            bl.updates(),
            vec![
                BacklightUpdate::Cabc {
                    level: 400,
                    reference: 800
                },
                BacklightUpdate::Brightness(255)
            ]
        );
    }

    #[test]
    fn test_dsi_mode() {
        assert_eq!(
            EmulatedDsi::new(DsiWorkMode::Command).work_mode(),
            DsiWorkMode::Command
        );
    }
}
