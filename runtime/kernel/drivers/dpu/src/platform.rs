// Licensed under the Apache-2.0 license

//! Services the display engine borrows from the rest of the system.

use disp_trusty::TrustyChannel;
use emulator_bus::BusError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DsiWorkMode {
    /// Panel holds its own frame buffer and is refreshed on demand.
    Command,
    #[default]
    Video,
}

/// The DSI host the engine drives.
pub trait DsiHost: Send + Sync {
    fn work_mode(&self) -> DsiWorkMode;
}

/// Backlight device as seen by CABC.
pub trait BacklightSink: Send + Sync {
    /// Current brightness mapped onto the CABC scale.
    fn normalized_level(&self) -> u16;

    /// Applies a CABC scaled `level`, remembering the unscaled `reference`.
    fn set_cabc(&self, level: u16, reference: u16);

    /// Leaves CABC mode and applies a plain brightness update.
    fn set_brightness(&self, level: u16);

    fn brightness(&self) -> u16;
}

/// Backlight devices by name.
#[derive(Clone, Default)]
pub struct BacklightRegistry {
    devices: Arc<Mutex<HashMap<String, Arc<dyn BacklightSink>>>>,
}

impl BacklightRegistry {
    pub fn register(&self, name: &str, device: Arc<dyn BacklightSink>) {
        self.lock().insert(name.to_string(), device);
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn BacklightSink>> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn BacklightSink>>> {
        self.devices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Memory that both the CPU and the display engine can access.
pub trait DmaBuffer: Send {
    /// Bus address to program into base address registers.
    fn phys_addr(&self) -> u32;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_bytes(&self, offset: usize, src: &[u8]) -> Result<(), BusError>;

    fn read_bytes(&self, offset: usize, dst: &mut [u8]) -> Result<(), BusError>;
}

pub trait DmaAllocator: Send + Sync {
    /// Returns `None` when no coherent memory of `size` bytes is left.
    fn alloc_coherent(&self, size: usize) -> Option<Box<dyn DmaBuffer>>;
}

type DvfsListener = Box<dyn Fn(u32) + Send>;

/// Subscribers to core clock hints.
#[derive(Clone, Default)]
pub struct DvfsNotifierChain {
    listeners: Arc<Mutex<Vec<DvfsListener>>>,
}

impl DvfsNotifierChain {
    pub fn register<F: Fn(u32) + Send + 'static>(&self, listener: F) {
        self.lock().push(Box::new(listener));
    }

    pub fn call_chain(&self, freq: u32) {
        for listener in self.lock().iter() {
            listener(freq);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DvfsListener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The collaborators handed to an engine at construction.
pub struct Platform {
    pub dsi: Arc<dyn DsiHost>,
    pub backlights: BacklightRegistry,
    pub dma: Arc<dyn DmaAllocator>,
    pub dvfs: DvfsNotifierChain,
    pub trusty: Box<dyn TrustyChannel>,
}
