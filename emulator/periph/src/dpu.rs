/*++

Licensed under the Apache-2.0 license.

File Name:

    dpu.rs

Abstract:

    File contains the emulated r6p0 display processing unit register block.

--*/

use crate::dma::DmaPool;
use crate::irq::IrqLine;
use emulator_bus::{Bus, BusError};
use emulator_types::{RvAddr, RvData, RvSize};
use log::{debug, trace};
use registers_dpu::bits::{DpuCfg0, DpuCtrl, WbCtrl};
use registers_dpu::regs::{
    hsv_lut_addr, hsv_lut_raddr, threed_lut_addr, threed_lut_rdata, DPU_BLOCK_SIZE, DPU_CFG0,
    DPU_CTRL, DPU_INT_CLR, DPU_INT_EN, DPU_INT_RAW, DPU_INT_STS, DPU_SECURE, DPU_VERSION,
    ENHANCE_UPDATE, GAMMA_LUT_ADDR, GAMMA_LUT_BASE_ADDR, GAMMA_LUT_RDATA, HSV_LUT_BASE_ADDR,
    HSV_LUT_PORTS, MMU_INT_CLR, MMU_INT_EN, MMU_INT_RAW, MMU_INT_STS, MMU_INV_ADDR_RD,
    MMU_INV_ADDR_WR, SLP_LUT_ADDR, SLP_LUT_BASE_ADDR, SLP_LUT_RDATA, THREED_LUT_BASE_ADDR,
    THREED_LUT_PORTS, WB_CTRL,
};
use registers_dpu::{DpuIrq, MmuIrq};
use std::sync::{Arc, Mutex, MutexGuard};
use tock_registers::LocalRegisterCopy;

/// Value of the version register.
pub const DPU_R6P0_VERSION: u32 = 0x0000_0600;

/// Entries per word of the packed HSV and 3D-LUT layouts in memory.
const HSV_TABLES: u32 = HSV_LUT_PORTS as u32;
const LUT3D_TABLES: u32 = THREED_LUT_PORTS as u32;

/// A LUT read port: the address register latches an index, the data
/// register returns the entry the engine fetched from memory.
#[derive(Debug, Clone, Copy)]
enum ReadPort {
    Gamma,
    Slp,
    Hsv(u32),
    Lut3d(u32),
}

impl ReadPort {
    fn decode(offset: u32) -> Option<(Self, u32)> {
        match offset {
            GAMMA_LUT_RDATA => Some((Self::Gamma, GAMMA_LUT_ADDR)),
            SLP_LUT_RDATA => Some((Self::Slp, SLP_LUT_ADDR)),
            _ => (0..HSV_LUT_PORTS)
                .find(|&p| hsv_lut_raddr(p) == offset)
                .map(|p| (Self::Hsv(p as u32), hsv_lut_addr(p)))
                .or_else(|| {
                    (0..THREED_LUT_PORTS)
                        .find(|&p| threed_lut_rdata(p) == offset)
                        .map(|p| (Self::Lut3d(p as u32), threed_lut_addr(p)))
                }),
        }
    }
}

struct DpuModel {
    regs: Vec<u32>,
    memory: DmaPool,
    irq: IrqLine,
    auto_ack: bool,
    fail_write_back: bool,
    enhance_updates: u32,
    trace: bool,
    writes: Vec<(u32, u32)>,
}

impl DpuModel {
    fn reg(&self, offset: u32) -> u32 {
        self.regs[(offset / 4) as usize]
    }

    fn set(&mut self, offset: u32, val: u32) {
        self.regs[(offset / 4) as usize] = val;
    }

    fn update_irq(&mut self) {
        let pending = self.reg(DPU_INT_RAW) & self.reg(DPU_INT_EN) != 0
            || self.reg(MMU_INT_RAW) & self.reg(MMU_INT_EN) != 0;
        self.irq.set_level(pending);
    }

    fn raise(&mut self, irq: DpuIrq) {
        let raw = self.reg(DPU_INT_RAW) | irq.bits();
        self.set(DPU_INT_RAW, raw);
        self.update_irq();
    }

    fn is_edpi(&self) -> bool {
        LocalRegisterCopy::<u32, DpuCfg0::Register>::new(self.reg(DPU_CFG0)).is_set(DpuCfg0::EDPI)
    }

    /// Applies the trigger bits of a control write. Triggers self-clear;
    /// with auto-ack enabled their completion interrupts fire at once.
    fn control(&mut self, val: u32) {
        let mut ctrl = LocalRegisterCopy::<u32, DpuCtrl::Register>::new(val);
        let mut done = DpuIrq::empty();
        if ctrl.is_set(DpuCtrl::REG_UPDATE) {
            done |= DpuIrq::REG_UPDATE_DONE | DpuIrq::LAY_REG_UPDATE_DONE;
        }
        if ctrl.is_set(DpuCtrl::ALL_UPDATE) {
            done |= DpuIrq::ALL_UPDATE_DONE;
        }
        if ctrl.is_set(DpuCtrl::STOP) {
            ctrl.modify(DpuCtrl::RUN::CLEAR);
            done |= DpuIrq::DONE;
        }
        // Command mode panels take a single frame per run.
        if ctrl.is_set(DpuCtrl::RUN) && self.is_edpi() {
            ctrl.modify(DpuCtrl::RUN::CLEAR);
            done |= DpuIrq::DONE;
        }
        ctrl.modify(DpuCtrl::STOP::CLEAR + DpuCtrl::ALL_UPDATE::CLEAR + DpuCtrl::REG_UPDATE::CLEAR);
        self.set(DPU_CTRL, ctrl.get());
        if self.auto_ack && !done.is_empty() {
            trace!("dpu ack {:?}", done);
            self.raise(done);
        }
    }

    fn write_back(&mut self, val: u32) {
        let ctrl = LocalRegisterCopy::<u32, WbCtrl::Register>::new(val);
        if !ctrl.is_set(WbCtrl::TRIGGER) && !ctrl.is_set(WbCtrl::DEBUG_TRIGGER) {
            return;
        }
        if self.fail_write_back {
            self.fail_write_back = false;
            self.raise(DpuIrq::WB_FAIL);
        } else if self.auto_ack {
            self.raise(DpuIrq::WB_DONE);
        }
    }

    /// Entry behind a read port, fetched from the table the matching base
    /// register points at.
    fn fetch(&self, port: ReadPort, index: u32) -> u32 {
        let word = |base: u32, n: u32| self.memory.read_word(base + 4 * n).unwrap_or(0);
        match port {
            ReadPort::Gamma => word(self.reg(GAMMA_LUT_BASE_ADDR), 2 * index),
            ReadPort::Slp => self
                .memory
                .read_half(self.reg(SLP_LUT_BASE_ADDR) + 2 * index)
                .map_or(0, u32::from),
            ReadPort::Hsv(p) => word(self.reg(HSV_LUT_BASE_ADDR), index * HSV_TABLES + p),
            ReadPort::Lut3d(p) => word(self.reg(THREED_LUT_BASE_ADDR), p + LUT3D_TABLES * index),
        }
    }

    fn read(&self, offset: u32) -> u32 {
        match offset {
            DPU_INT_STS => self.reg(DPU_INT_RAW) & self.reg(DPU_INT_EN),
            MMU_INT_STS => self.reg(MMU_INT_RAW) & self.reg(MMU_INT_EN),
            _ => match ReadPort::decode(offset) {
                Some((port, addr_reg)) => self.fetch(port, self.reg(addr_reg)),
                None => self.reg(offset),
            },
        }
    }

    fn write(&mut self, offset: u32, val: u32) {
        if self.trace {
            self.writes.push((offset, val));
        }
        match offset {
            DPU_CTRL => self.control(val),
            DPU_INT_CLR => {
                let raw = self.reg(DPU_INT_RAW) & !val;
                self.set(DPU_INT_RAW, raw);
            }
            MMU_INT_CLR => {
                let raw = self.reg(MMU_INT_RAW) & !val;
                self.set(MMU_INT_RAW, raw);
            }
            ENHANCE_UPDATE => self.enhance_updates |= val,
            WB_CTRL => self.write_back(val),
            // Owned by the secure world.
            DPU_SECURE | DPU_VERSION | DPU_INT_STS | DPU_INT_RAW | MMU_INT_STS | MMU_INT_RAW => {}
            _ => self.set(offset, val),
        }
        self.update_irq();
    }
}

/// The register block of one display engine. Clones share the same
/// hardware state, so a test can keep a handle while the bus owns another.
#[derive(Clone)]
pub struct EmulatedDpu {
    model: Arc<Mutex<DpuModel>>,
}

impl EmulatedDpu {
    pub fn new(irq: IrqLine, memory: DmaPool) -> Self {
        let mut regs = vec![0; (DPU_BLOCK_SIZE / 4) as usize];
        regs[(DPU_VERSION / 4) as usize] = DPU_R6P0_VERSION;
        Self {
            model: Arc::new(Mutex::new(DpuModel {
                regs,
                memory,
                irq,
                auto_ack: true,
                fail_write_back: false,
                enhance_updates: 0,
                trace: false,
                writes: Vec::new(),
            })),
        }
    }

    /// Register contents without read side effects.
    pub fn reg(&self, offset: u32) -> u32 {
        self.lock().reg(offset)
    }

    /// Backdoor write, for state the hardware produces by itself such as
    /// histograms.
    pub fn set_reg(&self, offset: u32, val: u32) {
        self.lock().set(offset, val);
    }

    pub fn raise(&self, irq: DpuIrq) {
        self.lock().raise(irq);
    }

    pub fn vsync(&self) {
        self.raise(DpuIrq::DPI_VSYNC);
    }

    /// Raises an IOMMU fault at `addr`.
    pub fn mmu_fault(&self, fault: MmuIrq, addr: u32) {
        let mut model = self.lock();
        if fault.intersects(MmuIrq::INV_RD | MmuIrq::UNS_RD) {
            model.set(MMU_INV_ADDR_RD, addr);
        } else {
            model.set(MMU_INV_ADDR_WR, addr);
        }
        let raw = model.reg(MMU_INT_RAW) | fault.bits();
        model.set(MMU_INT_RAW, raw);
        model.update_irq();
    }

    /// With auto-ack off, triggers are accepted but never completed.
    pub fn set_auto_ack(&self, on: bool) {
        self.lock().auto_ack = on;
    }

    /// Makes the next write-back capture fail.
    pub fn fail_next_write_back(&self) {
        self.lock().fail_write_back = true;
    }

    /// Secure world side of the firewall.
    pub fn set_secure(&self, secure: bool) {
        self.lock().set(DPU_SECURE, secure.into());
        debug!("dpu secure mode {}", secure);
    }

    pub fn is_secure(&self) -> bool {
        self.reg(DPU_SECURE) != 0
    }

    /// Enhancement update bits latched since the last call.
    pub fn take_enhance_updates(&self) -> u32 {
        std::mem::take(&mut self.lock().enhance_updates)
    }

    /// Starts or stops recording driver writes.
    pub fn set_trace(&self, on: bool) {
        let mut model = self.lock();
        model.trace = on;
        model.writes.clear();
    }

    /// Driver writes recorded since tracing started, as `(offset, value)`.
    pub fn take_writes(&self) -> Vec<(u32, u32)> {
        std::mem::take(&mut self.lock().writes)
    }

    fn lock(&self) -> MutexGuard<'_, DpuModel> {
        self.model.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Bus for EmulatedDpu {
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        if size != RvSize::Word || addr % 4 != 0 {
            return Err(BusError::LoadAddrMisaligned);
        }
        if addr >= DPU_BLOCK_SIZE {
            return Err(BusError::LoadAccessFault);
        }
        Ok(self.lock().read(addr))
    }

    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        if size != RvSize::Word || addr % 4 != 0 {
            return Err(BusError::StoreAddrMisaligned);
        }
        if addr >= DPU_BLOCK_SIZE {
            return Err(BusError::StoreAccessFault);
        }
        self.lock().write(addr, val);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registers_dpu::regs::{BLEND_SIZE, CABC_HIST};

    fn dpu() -> (EmulatedDpu, IrqLine, DmaPool) {
        let irq = IrqLine::default();
        let pool = DmaPool::new(0x8000_0000, 0x4000);
        (EmulatedDpu::new(irq.clone(), pool.clone()), irq, pool)
    }

    #[test]
    fn test_update_trigger_is_acknowledged() {
        let (mut dpu, irq, _) = dpu();
        dpu.write(RvSize::Word, DPU_INT_EN, DpuIrq::LAY_REG_UPDATE_DONE.bits())
            .unwrap();
        dpu.write(RvSize::Word, DPU_CTRL, 0x11).unwrap();
        // RUN stays set on a video mode panel, the update bit clears.
        assert_eq!(dpu.read(RvSize::Word, DPU_CTRL).unwrap(), 0x1);
        assert!(irq.is_asserted());

        let sts = dpu.read(RvSize::Word, DPU_INT_STS).unwrap();
        assert_eq!(sts, DpuIrq::LAY_REG_UPDATE_DONE.bits());
        dpu.write(RvSize::Word, DPU_INT_CLR, sts).unwrap();
        assert!(!irq.is_asserted());
        // The unmasked companion bit is still latched in the raw register.
        assert_eq!(
            dpu.read(RvSize::Word, DPU_INT_RAW).unwrap(),
            DpuIrq::REG_UPDATE_DONE.bits()
        );
    }

    #[test]
    fn test_command_mode_run_is_one_frame() {
        let (mut dpu, _, _) = dpu();
        dpu.write(RvSize::Word, DPU_CFG0, 1).unwrap();
        dpu.write(RvSize::Word, DPU_CTRL, 0x1).unwrap();
        assert_eq!(dpu.reg(DPU_CTRL), 0);
        assert_eq!(dpu.reg(DPU_INT_RAW), DpuIrq::DONE.bits());
    }

    #[test]
    fn test_no_ack() {
        let (mut dpu, irq, _) = dpu();
        dpu.set_auto_ack(false);
        dpu.write(RvSize::Word, DPU_INT_EN, u32::MAX).unwrap();
        dpu.write(RvSize::Word, DPU_CTRL, 0x4).unwrap();
        assert_eq!(dpu.reg(DPU_CTRL), 0);
        assert!(!irq.is_asserted());
    }

    #[test]
    fn test_write_back_failure() {
        let (mut dpu, _, _) = dpu();
        dpu.fail_next_write_back();
        dpu.write(RvSize::Word, WB_CTRL, 1).unwrap();
        dpu.write(RvSize::Word, WB_CTRL, 1).unwrap();
        assert_eq!(
            dpu.reg(DPU_INT_RAW),
            (DpuIrq::WB_FAIL | DpuIrq::WB_DONE).bits()
        );
    }

    #[test]
    fn test_lut_read_ports() {
        use dpu_driver::platform::DmaBuffer;

        let (mut dpu, _, pool) = dpu();
        let region = pool.alloc(0x2000).unwrap();
        // Gamma entry 3 sits on word 6 of the table.
        region.write_bytes(0x1000 + 24, &0x3ff_u32.to_le_bytes()).unwrap();
        // HSV entry 1 of port 2 is word 1 * 4 + 2.
        region.write_bytes(0x800 + 24, &0x1234_u32.to_le_bytes()).unwrap();
        region.write_bytes(4, &0xbeef_u16.to_le_bytes()).unwrap();

        dpu.write(RvSize::Word, GAMMA_LUT_BASE_ADDR, 0x8000_1000).unwrap();
        dpu.write(RvSize::Word, GAMMA_LUT_ADDR, 3).unwrap();
        assert_eq!(dpu.read(RvSize::Word, GAMMA_LUT_RDATA).unwrap(), 0x3ff);

        dpu.write(RvSize::Word, HSV_LUT_BASE_ADDR, 0x8000_0800).unwrap();
        dpu.write(RvSize::Word, hsv_lut_addr(2), 1).unwrap();
        assert_eq!(dpu.read(RvSize::Word, hsv_lut_raddr(2)).unwrap(), 0x1234);

        dpu.write(RvSize::Word, SLP_LUT_BASE_ADDR, 0x8000_0000).unwrap();
        dpu.write(RvSize::Word, SLP_LUT_ADDR, 2).unwrap();
        assert_eq!(dpu.read(RvSize::Word, SLP_LUT_RDATA).unwrap(), 0xbeef);
    }

    #[test]
    fn test_secure_register_is_read_only() {
        let (mut dpu, _, _) = dpu();
        dpu.write(RvSize::Word, DPU_SECURE, 1).unwrap();
        assert!(!dpu.is_secure());
        dpu.set_secure(true);
        assert_eq!(dpu.read(RvSize::Word, DPU_SECURE).unwrap(), 1);
    }

    #[test]
    fn test_trace_and_enhance_updates() {
        let (mut dpu, _, _) = dpu();
        dpu.set_trace(true);
        dpu.write(RvSize::Word, BLEND_SIZE, 0x10).unwrap();
        dpu.write(RvSize::Word, ENHANCE_UPDATE, 0x2).unwrap();
        dpu.write(RvSize::Word, ENHANCE_UPDATE, 0x4).unwrap();
        assert_eq!(dpu.reg(ENHANCE_UPDATE), 0);
        assert_eq!(dpu.take_enhance_updates(), 0x6);
        assert_eq!(dpu.take_enhance_updates(), 0);
        assert_eq!(
            dpu.take_writes(),
            vec![(BLEND_SIZE, 0x10), (ENHANCE_UPDATE, 2), (ENHANCE_UPDATE, 4)]
        );
        dpu.set_reg(CABC_HIST, 7);
        assert_eq!(dpu.read(RvSize::Word, CABC_HIST).unwrap(), 7);
    }

    #[test]
    fn test_mmu_fault() {
        let (mut dpu, irq, _) = dpu();
        dpu.write(RvSize::Word, MMU_INT_EN, 0xff).unwrap();
        dpu.mmu_fault(MmuIrq::INV_WR, 0x1234);
        assert!(irq.is_asserted());
        assert_eq!(dpu.read(RvSize::Word, MMU_INV_ADDR_WR).unwrap(), 0x1234);
        assert_eq!(
            dpu.read(RvSize::Word, MMU_INT_STS).unwrap(),
            MmuIrq::INV_WR.bits()
        );
        dpu.write(RvSize::Word, MMU_INT_CLR, 0xff).unwrap();
        assert!(!irq.is_asserted());
    }

    #[test]
    fn test_out_of_block() {
        let (mut dpu, _, _) = dpu();
        assert_eq!(
            dpu.read(RvSize::Word, DPU_BLOCK_SIZE),
            Err(BusError::LoadAccessFault)
        );
        assert_eq!(
            dpu.write(RvSize::Byte, 0, 0),
            Err(BusError::StoreAddrMisaligned)
        );
    }
}
