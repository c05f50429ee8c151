// Licensed under the Apache-2.0 license

use crate::error::DpuResult;
use emulator_bus::SharedBus;
use log::{error, info};
use tock_registers::fields::FieldValue;
use tock_registers::{LocalRegisterCopy, RegisterLongName};

/// Number of words printed by a register dump.
const DUMP_WORDS: u32 = 256;

/// MMIO window onto the DPU register block. Every access goes straight to
/// the bus; nothing is cached.
#[derive(Clone)]
pub struct DpuRegs {
    bus: SharedBus,
    base: u32,
}

impl DpuRegs {
    pub fn new(bus: SharedBus, base: u32) -> Self {
        Self { bus, base }
    }

    pub fn read(&self, offset: u32) -> DpuResult<u32> {
        Ok(self.bus.read_word(self.base + offset)?)
    }

    pub fn write(&self, offset: u32, val: u32) -> DpuResult<()> {
        Ok(self.bus.write_word(self.base + offset, val)?)
    }

    /// `reg |= mask`
    pub fn set_bits(&self, offset: u32, mask: u32) -> DpuResult<()> {
        let val = self.read(offset)?;
        self.write(offset, val | mask)
    }

    /// `reg &= !mask`
    pub fn clear_bits(&self, offset: u32, mask: u32) -> DpuResult<()> {
        let val = self.read(offset)?;
        self.write(offset, val & !mask)
    }

    pub fn read_reg<R: RegisterLongName>(
        &self,
        offset: u32,
    ) -> DpuResult<LocalRegisterCopy<u32, R>> {
        Ok(LocalRegisterCopy::new(self.read(offset)?))
    }

    pub fn write_reg<R: RegisterLongName>(
        &self,
        offset: u32,
        reg: LocalRegisterCopy<u32, R>,
    ) -> DpuResult<()> {
        self.write(offset, reg.get())
    }

    /// Writes `field` into an otherwise zero register.
    pub fn write_field<R: RegisterLongName>(
        &self,
        offset: u32,
        field: FieldValue<u32, R>,
    ) -> DpuResult<()> {
        let mut reg = LocalRegisterCopy::<u32, R>::new(0);
        reg.modify(field);
        self.write_reg(offset, reg)
    }

    /// Read-modify-write of the fields in `field`.
    pub fn modify<R: RegisterLongName>(
        &self,
        offset: u32,
        field: FieldValue<u32, R>,
    ) -> DpuResult<()> {
        let mut reg = self.read_reg::<R>(offset)?;
        reg.modify(field);
        self.write_reg(offset, reg)
    }

    /// Logs the first 1 KiB of the block, four words per line.
    pub fn dump(&self) {
        info!("      0          4          8          C");
        for i in (0..DUMP_WORDS).step_by(4) {
            let mut words = [0u32; 4];
            for (n, word) in words.iter_mut().enumerate() {
                *word = match self.read((i + n as u32) * 4) {
                    Ok(v) => v,
                    Err(e) => {
                        error!("dump stopped at 0x{:04x}: {}", (i + n as u32) * 4, e);
                        return;
                    }
                };
            }
            info!(
                "{:04x}: 0x{:08x} 0x{:08x} 0x{:08x} 0x{:08x}",
                i * 4,
                words[0],
                words[1],
                words[2],
                words[3]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_bus::Ram;
    use registers_dpu::bits::DpuCtrl;

    fn regs() -> DpuRegs {
        DpuRegs::new(SharedBus::new(Ram::new(0x100)), 0x40)
    }

    #[test]
    fn test_bit_helpers() {
        let regs = regs();
        regs.write(0x8, 0xf0).unwrap();
        regs.set_bits(0x8, 0x1).unwrap();
        regs.clear_bits(0x8, 0x10).unwrap();
        assert_eq!(regs.read(0x8).unwrap(), 0xe1);
    }

    #[test]
    fn test_field_helpers() {
        let regs = regs();
        regs.write(0x8, 0x100).unwrap();
        regs.modify(0x8, DpuCtrl::RUN::SET + DpuCtrl::REG_UPDATE::SET)
            .unwrap();
        assert_eq!(regs.read(0x8).unwrap(), 0x111);
        regs.write_field(0x8, DpuCtrl::STOP::SET).unwrap();
        assert!(regs.read_reg::<DpuCtrl::Register>(0x8).unwrap().is_set(DpuCtrl::STOP));
        assert_eq!(regs.read(0x8).unwrap(), 0x2);
    }

    #[test]
    fn test_out_of_window_access_fails() {
        let regs = regs();
        assert!(regs.read(0x100).is_err());
    }
}
