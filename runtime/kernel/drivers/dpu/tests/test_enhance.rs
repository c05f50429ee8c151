// Licensed under the Apache-2.0 license

#[cfg(test)]
mod common;

use common::{setup, wait_for, TestDisplay, SETTLE_TIMEOUT};
use dpu_driver::enhance::{
    pack_rgb_entry, CabcParam, CabcState, CmCfg, EnhanceId, EnhanceParam, EnhanceValue, EpfCfg,
    GammaLut, HsvLuts, LutSelect, LutsDump, LutsUpdate, ScaleCfg, SlpCfg, ThreedLut, UdCfg,
    GAMMA_ENTRIES, HSV_ENTRIES, LUT3D_ENTRIES, LUTS_CHUNK_SIZE,
};
use dpu_driver::error::DpuError;
use dpu_driver::r6p0::{LUTS_CHUNKS, LUT_RAM_SIZE};
use dpu_driver::InterfaceType;
use emulator_periph::{BacklightUpdate, DisplaySystemArgs};
use registers_dpu::regs::{
    cabc_cfg, cabc_hist, slp_cfg, BLEND_SIZE, DPU_ENHANCE_CFG, GAMMA_LUT_BASE_ADDR,
    HSV_LUT_BASE_ADDR, SCL_EN, SLP_CFG_WORDS, THREED_LUT_BASE_ADDR,
};
use registers_dpu::EnhanceModules;

fn gamma() -> Box<GammaLut> {
    let mut lut = GammaLut::default();
    for i in 0..GAMMA_ENTRIES {
        lut.r[i] = (i * 4) as u16;
        lut.g[i] = (1023 - i) as u16;
        lut.b[i] = (i * 2) as u16;
    }
    Box::new(lut)
}

fn pq_settings() -> Vec<EnhanceParam> {
    vec![
        EnhanceParam::Epf(EpfCfg {
            epsilon: [0x100, 0x200],
            gain: [1, 2, 3, 4, 5, 6, 7, 8],
            diff: [0x10, 0x20],
        }),
        EnhanceParam::Cm(CmCfg {
            coef: [[0x400, 0, 0, 0], [0, 0x400, 0, 0], [0, 0, 0x400, 0]],
        }),
        EnhanceParam::Ud(UdCfg {
            u: [0x80, 4, 8, 0x90, 12, 16],
        }),
        EnhanceParam::Gamma(gamma()),
    ]
}

fn slp(seed: u16) -> SlpCfg {
    let mut cfg = SlpCfg::default();
    for (i, param) in cfg.params.iter_mut().enumerate() {
        *param = (i as u16 + seed) & 0x7;
    }
    cfg
}

/// Every kind that is cached while powered off and replayed on power-up.
fn full_pq_settings() -> Vec<EnhanceParam> {
    let mut hsv = Box::<HsvLuts>::default();
    for (t, table) in hsv.tables.iter_mut().enumerate() {
        for j in 0..HSV_ENTRIES {
            table.h_o[j] = ((j + t) % 0x80) as u16;
            table.s_g[j] = (j * 3) as u16;
        }
    }
    let mut lut3d = Box::new(ThreedLut {
        r: [0; LUT3D_ENTRIES],
        g: [0; LUT3D_ENTRIES],
        b: [0; LUT3D_ENTRIES],
    });
    for i in 0..LUT3D_ENTRIES {
        lut3d.r[i] = (i % 1024) as u16;
        lut3d.g[i] = 512;
        lut3d.b[i] = (1023 - i % 1024) as u16;
    }

    let mut settings = pq_settings();
    settings.extend([
        EnhanceParam::Slp(slp(1)),
        EnhanceParam::Ltm(slp(2)),
        EnhanceParam::Hsv(hsv),
        EnhanceParam::Lut3d(lut3d),
        EnhanceParam::Scl(ScaleCfg {
            in_w: common::PANEL_WIDTH / 2,
            in_h: common::PANEL_HEIGHT / 2,
        }),
    ]);
    settings
}

fn read_back(display: &TestDisplay) -> Vec<EnhanceValue> {
    [
        EnhanceId::Enable,
        EnhanceId::Epf,
        EnhanceId::Cm,
        EnhanceId::Ud,
        EnhanceId::Gamma,
    ]
    .into_iter()
    .map(|id| display.core.enhance_get(id).unwrap())
    .collect()
}

/// Registers and LUT RAM the enhancement blocks run from.
fn pq_state(display: &TestDisplay) -> (Vec<u32>, Vec<u32>) {
    let dpu = &display.system.dpu;
    let mut regs: Vec<u32> = (0..SLP_CFG_WORDS).map(|n| dpu.reg(slp_cfg(n))).collect();
    regs.extend(
        [
            HSV_LUT_BASE_ADDR,
            THREED_LUT_BASE_ADDR,
            GAMMA_LUT_BASE_ADDR,
            BLEND_SIZE,
            SCL_EN,
            DPU_ENHANCE_CFG,
        ]
        .map(|offset| dpu.reg(offset)),
    );

    let dma = &display.system.dma;
    let ram = (0..LUT_RAM_SIZE as u32 / 4)
        .map(|n| dma.read_word(dma.base() + 4 * n).unwrap())
        .collect();
    (regs, ram)
}

#[test]
fn test_cached_settings_match_live_settings() {
    let cached = TestDisplay::new(DisplaySystemArgs::default(), |_| {});
    for param in full_pq_settings() {
        cached.core.enhance_set(param).unwrap();
    }
    cached.power_on(InterfaceType::Dpi);

    let live = setup();
    for param in full_pq_settings() {
        live.core.enhance_set(param).unwrap();
    }

    let (regs, ram) = pq_state(&cached);
    assert_eq!(regs[..SLP_CFG_WORDS], slp(2).pack());
    assert_eq!(
        regs[SLP_CFG_WORDS + 3],
        (common::PANEL_HEIGHT / 2) << 16 | common::PANEL_WIDTH / 2
    );
    assert_eq!(regs[SLP_CFG_WORDS + 4], 1);
    assert_eq!((regs, ram), pq_state(&live));

    let expected_modules = EnhanceModules::EPF
        | EnhanceModules::CM
        | EnhanceModules::UD_ALL
        | EnhanceModules::GAMMA_DITHER
        | EnhanceModules::SLP
        | EnhanceModules::LTM
        | EnhanceModules::HSV
        | EnhanceModules::LUT3D
        | EnhanceModules::SCL;
    let values = read_back(&cached);
    assert_eq!(values[0], EnhanceValue::Modules(expected_modules));
    assert_eq!(values[4], EnhanceValue::Gamma(gamma()));
    assert_eq!(values, read_back(&live));
    assert!(!live.core.status().stopped);
}

#[test]
fn test_disable_clears_modules() {
    let display = setup();
    for param in pq_settings() {
        display.core.enhance_set(param).unwrap();
    }
    display
        .core
        .enhance_set(EnhanceParam::Disable(EnhanceModules::GAMMA_DITHER))
        .unwrap();
    assert_eq!(
        display.core.enhance_get(EnhanceId::Enable).unwrap(),
        EnhanceValue::Modules(EnhanceModules::EPF | EnhanceModules::CM | EnhanceModules::UD_ALL)
    );
    assert!(matches!(
        display.core.enhance_get(EnhanceId::CabcRun),
        Err(DpuError::InvalidArgument(_))
    ));
}

#[test]
fn test_streamed_luts_are_selectable() {
    let display = setup();
    // The LUT RAM is the first allocation of the engine.
    let ram_base = display.system.dma.base();

    // Gamma slot 1 sits at 8 KiB, entries on every other word.
    let mut image = vec![0u8; LUT_RAM_SIZE];
    for i in 0..GAMMA_ENTRIES {
        let offset = 8192 + 8 * i;
        let word = pack_rgb_entry(i as u16, i as u16, (i * 3) as u16);
        image[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
    }
    assert_eq!(image.len(), LUTS_CHUNKS as usize * LUTS_CHUNK_SIZE);
    for chunk in image.chunks_exact(LUTS_CHUNK_SIZE) {
        let mut data = Box::new([0u8; LUTS_CHUNK_SIZE]);
        data.copy_from_slice(chunk);
        display
            .core
            .enhance_set(EnhanceParam::UpdateLuts(LutsUpdate::All(data)))
            .unwrap();
    }

    display
        .core
        .enhance_set(EnhanceParam::UpdateLuts(LutsUpdate::Select(
            LutSelect::Gamma { index: 1 },
        )))
        .unwrap();
    assert_eq!(
        display.system.dpu.reg(GAMMA_LUT_BASE_ADDR),
        ram_base + 8192
    );

    let Ok(EnhanceValue::Luts(LutsDump::Gamma(lut))) =
        display.core.enhance_get(EnhanceId::UpdateLuts)
    else {
        panic!("expected a gamma dump");
    };
    assert_eq!(lut.r[200], 200);
    assert_eq!(lut.b[100], 300);

    assert!(matches!(
        display.core.enhance_set(EnhanceParam::UpdateLuts(LutsUpdate::Select(
            LutSelect::Gamma { index: 2 }
        ))),
        Err(DpuError::LutOutOfRange { .. })
    ));
}

#[test]
fn test_cabc_cycle() {
    let display = setup();
    let core = &display.core;
    let system = &display.system;

    // Steps must follow the cycle.
    assert_eq!(
        core.enhance_set(EnhanceParam::CabcState(CabcState::Stopping)),
        Err(DpuError::InvalidCabcTransition {
            from: "Disabled".into(),
            to: "Stopping".into()
        })
    );
    core.enhance_set(EnhanceParam::CabcState(CabcState::Working))
        .unwrap();

    // First trigger latches the current backlight.
    core.enhance_set(EnhanceParam::CabcRun).unwrap();
    assert!(wait_for(SETTLE_TIMEOUT, || core.status().frame_no == 1));
    assert!(core.status().enhance_en.contains(EnhanceModules::CABC));
    assert_eq!(
        core.enhance_get(EnhanceId::CabcCurBl).unwrap(),
        EnhanceValue::CabcCurBl(1020)
    );

    // Following frames apply the calibration once the histogram is live.
    system.dpu.set_reg(cabc_hist(0), 0x10);
    let cfg = [1, 2, 3, 4, 5];
    core.enhance_set(EnhanceParam::CabcParam(CabcParam { bl_fix: 510, cfg }))
        .unwrap();
    core.enhance_set(EnhanceParam::CabcRun).unwrap();
    assert!(wait_for(SETTLE_TIMEOUT, || core.status().frame_no == 2));
    assert_eq!(system.dpu.reg(cabc_cfg(4)), 5);
    assert!(core.status().cabc_bl_set);

    display.vsync();
    assert!(wait_for(SETTLE_TIMEOUT, || system
        .backlight
        .updates()
        .contains(&BacklightUpdate::Cabc {
            level: 510,
            reference: 1020
        })));
    assert!(wait_for(SETTLE_TIMEOUT, || !core.status().cabc_bl_set));

    assert!(matches!(
        core.enhance_set(EnhanceParam::CabcState(CabcState::Disabled)),
        Err(DpuError::InvalidCabcTransition { .. })
    ));

    // Stopping hands the backlight back on the next trigger.
    core.enhance_set(EnhanceParam::CabcState(CabcState::Stopping))
        .unwrap();
    core.enhance_set(EnhanceParam::CabcRun).unwrap();
    assert!(wait_for(SETTLE_TIMEOUT, || core.status().cabc_state
        == CabcState::Disabled));
    assert!(!core.status().enhance_en.contains(EnhanceModules::CABC));

    display.vsync();
    assert!(wait_for(SETTLE_TIMEOUT, || system.backlight.updates().last()
        == Some(&BacklightUpdate::Brightness(255))));
    assert!(!system.backlight.cabc_enabled());
}
