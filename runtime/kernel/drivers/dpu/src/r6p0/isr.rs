// Licensed under the Apache-2.0 license

//! Interrupt handling. Runs without the refresh lock and never blocks.

use super::DpuR6p0;
use crate::error::DpuResult;
use crate::events::HwEvent;
use crate::workqueue::Work;
use log::{debug, error};
use registers_dpu::regs::{
    DPU_INT_CLR, DPU_INT_EN, DPU_INT_STS, MMU_INT_CLR, MMU_INT_EN, MMU_INT_STS, MMU_INV_ADDR_RD,
    MMU_INV_ADDR_WR, MMU_UNS_ADDR_RD, MMU_UNS_ADDR_WR,
};
use registers_dpu::{DpuIrq, MmuIrq};
use std::sync::atomic::Ordering;

impl DpuR6p0 {
    pub(super) fn handle_irq(&self) -> u32 {
        match self.service_irq() {
            Ok(sts) => sts,
            Err(e) => {
                error!("dpu isr register access failed: {}", e);
                0
            }
        }
    }

    fn service_irq(&self) -> DpuResult<u32> {
        let reg_val = self.regs.read(DPU_INT_STS)?;
        self.regs.write(DPU_INT_CLR, reg_val)?;
        let sts = DpuIrq::from_bits_retain(reg_val);
        let mmu_val = self.regs.read(MMU_INT_STS)?;

        // Error sources stay masked until the next flip re-arms them.
        let mut int_mask = sts & DpuIrq::ERR;

        if sts.contains(DpuIrq::DPI_VSYNC) {
            let vsync = self.vsync_count.load(Ordering::SeqCst);
            if vsync == self.max_vsync_count.load(Ordering::SeqCst)
                && self.wb_en.load(Ordering::SeqCst)
            {
                self.wq.schedule(Work::WriteBack);
            }
            if self.cabc_bl_set.load(Ordering::SeqCst) {
                self.wq.schedule(Work::CabcBacklight);
            }
            self.vsync_count.fetch_add(1, Ordering::SeqCst);
        }

        if sts.contains(DpuIrq::LAY_REG_UPDATE_DONE) {
            self.wq.schedule(Work::Dvfs);
            self.events.signal(HwEvent::Update);
        }

        if sts.contains(DpuIrq::ALL_UPDATE_DONE) {
            self.events.signal(HwEvent::AllUpdate);
        }

        if sts.contains(DpuIrq::DONE) {
            self.events.signal(HwEvent::Stop);
        }

        if sts.contains(DpuIrq::WB_DONE) {
            // A flip that lands before the capture finishes makes the
            // captured frame stale, so only a completed cadence replays it.
            if self.wb_en.load(Ordering::SeqCst)
                && self.vsync_count.load(Ordering::SeqCst)
                    > self.max_vsync_count.load(Ordering::SeqCst)
            {
                self.wb_en.store(false, Ordering::SeqCst);
                self.wq.schedule(Work::WriteBack);
            }
            debug!("wb done");
        }

        if sts.contains(DpuIrq::WB_FAIL) {
            error!("dpu write back fail");
            self.wb_en.store(true, Ordering::SeqCst);
            self.vsync_count.store(0, Ordering::SeqCst);
        }

        if sts.contains(DpuIrq::FBC_PLD_ERR) {
            int_mask |= DpuIrq::FBC_PLD_ERR;
            error!("dpu afbc payload error");
        }

        if sts.contains(DpuIrq::FBC_HDR_ERR) {
            int_mask |= DpuIrq::FBC_HDR_ERR;
            error!("dpu afbc header error");
        }

        let mmu_mask = self.check_mmu_irq(MmuIrq::from_bits_truncate(mmu_val))?;

        self.regs.clear_bits(DPU_INT_EN, int_mask.bits())?;
        self.regs.write(MMU_INT_CLR, mmu_val)?;
        self.regs.clear_bits(MMU_INT_EN, mmu_mask.bits())?;

        Ok(reg_val)
    }

    /// Logs IOMMU faults with the offending addresses and a register dump.
    /// Returns the fault bits to mask.
    fn check_mmu_irq(&self, faults: MmuIrq) -> DpuResult<MmuIrq> {
        if faults.is_empty() {
            return Ok(faults);
        }
        error!("--- iommu interrupt err: 0x{:04x} ---", faults.bits());
        error!(
            "iommu invalid read error, addr: 0x{:08x}",
            self.regs.read(MMU_INV_ADDR_RD)?
        );
        error!(
            "iommu invalid write error, addr: 0x{:08x}",
            self.regs.read(MMU_INV_ADDR_WR)?
        );
        error!(
            "iommu unsecurity read error, addr: 0x{:08x}",
            self.regs.read(MMU_UNS_ADDR_RD)?
        );
        error!(
            "iommu unsecurity write error, addr: 0x{:08x}",
            self.regs.read(MMU_UNS_ADDR_WR)?
        );
        self.regs.dump();
        Ok(faults)
    }
}
