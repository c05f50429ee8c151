/*++

Licensed under the Apache-2.0 license.

File Name:

    shared.rs

Abstract:

    File contains a thread-safe handle to a bus. Each access is atomic with
    respect to other accesses, which is the guarantee MMIO gives a driver.

--*/

use crate::{Bus, BusError};
use emulator_types::{RvAddr, RvData, RvSize};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct SharedBus {
    inner: Arc<Mutex<dyn Bus + Send>>,
}

impl SharedBus {
    pub fn new<B: Bus + Send + 'static>(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    pub fn read(&self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        self.lock().read(size, addr)
    }

    pub fn write(&self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        self.lock().write(size, addr, val)
    }

    pub fn read_word(&self, addr: RvAddr) -> Result<RvData, BusError> {
        self.read(RvSize::Word, addr)
    }

    pub fn write_word(&self, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        self.write(RvSize::Word, addr, val)
    }

    fn lock(&self) -> MutexGuard<'_, dyn Bus + Send + 'static> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ram;
    use std::thread;

    #[test]
    fn test_shared_access_across_threads() {
        let bus = SharedBus::new(Ram::new(64));
        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let bus = bus.clone();
                thread::spawn(move || bus.write_word(i * 4, i + 1).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4u32 {
            assert_eq!(bus.read_word(i * 4).unwrap(), i + 1);
        }
    }
}
