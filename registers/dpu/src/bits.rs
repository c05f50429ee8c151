// Licensed under the Apache-2.0 license

//! Types that represent individual registers (bitfields).

use tock_registers::register_bitfields;

register_bitfields! [
    u32,

    /// Top level control. Trigger bits self-clear.
    pub DpuCtrl [
        RUN OFFSET(0) NUMBITS(1) [],
        STOP OFFSET(1) NUMBITS(1) [],
        ALL_UPDATE OFFSET(2) NUMBITS(1) [],
        REG_UPDATE OFFSET(4) NUMBITS(1) [],
    ],

    pub DpuMode [
        DUAL_DSI OFFSET(0) NUMBITS(1) [],
    ],

    pub DpuCfg0 [
        EDPI OFFSET(0) NUMBITS(1) [],
        SINGLE_RUN OFFSET(1) NUMBITS(1) [],
    ],

    /// AXI QoS nibbles plus the outstanding-transaction controls that are
    /// always set.
    pub DpuCfg1 [
        ARQOS_LOW OFFSET(0) NUMBITS(4) [],
        ARQOS_HIGH OFFSET(4) NUMBITS(4) [],
        AWQOS_LOW OFFSET(8) NUMBITS(4) [],
        AWQOS_HIGH OFFSET(12) NUMBITS(4) [],
        FIXED18 OFFSET(18) NUMBITS(1) [],
        FIXED22 OFFSET(22) NUMBITS(1) [],
        FIXED23 OFFSET(23) NUMBITS(1) [],
    ],

    /// Width in the low half, height in the high half.
    pub Size [
        WIDTH OFFSET(0) NUMBITS(16) [],
        HEIGHT OFFSET(16) NUMBITS(16) [],
    ],

    pub Timing [
        SYNC OFFSET(0) NUMBITS(8) [],
        BACK_PORCH OFFSET(8) NUMBITS(12) [],
        FRONT_PORCH OFFSET(20) NUMBITS(12) [],
    ],

    pub DpiCtrl [
        SINGLE_RUN OFFSET(0) NUMBITS(1) [],
        TE_EN OFFSET(8) NUMBITS(1) [],
        TE_EXT OFFSET(10) NUMBITS(1) [],
        HALT_EN OFFSET(16) NUMBITS(1) [],
    ],

    pub LayerCtrl [
        ALPHA_LAYER OFFSET(2) NUMBITS(1) [],
        ALPHA_COMBO OFFSET(3) NUMBITS(1) [],
        FORMAT OFFSET(4) NUMBITS(4) [
            Yuv422TwoPlane = 0,
            Yuv420TwoPlane = 1,
            Yuv420ThreePlane = 2,
            Argb8888 = 3,
            Rgb565 = 4,
            XfbcArgb8888 = 8,
            XfbcRgb565 = 9,
            XfbcYuv420 = 10,
        ],
        Y_ENDIAN OFFSET(8) NUMBITS(2) [
            B0B1B2B3 = 0,
            B3B2B1B0 = 3,
        ],
        RB_SWITCH OFFSET(10) NUMBITS(1) [],
        UV_ENDIAN OFFSET(10) NUMBITS(2) [
            B0B1B2B3 = 0,
            B3B2B1B0 = 3,
        ],
        RB_SWITCH_565 OFFSET(12) NUMBITS(1) [],
        PREMULTI OFFSET(16) NUMBITS(1) [],
        ROTATION OFFSET(20) NUMBITS(3) [],
        SCALE_EN OFFSET(24) NUMBITS(1) [],
        Y2R_COEF OFFSET(28) NUMBITS(4) [],
    ],

    pub WbCtrl [
        TRIGGER OFFSET(0) NUMBITS(1) [],
        DEBUG_TRIGGER OFFSET(1) NUMBITS(1) [],
    ],

    pub WbCfg [
        XFBC_EN OFFSET(0) NUMBITS(1) [],
        HEADER_SIZE OFFSET(16) NUMBITS(16) [],
    ],

    pub CornerConfig [
        TOP_EN OFFSET(0) NUMBITS(1) [],
        TOP_RADIUS OFFSET(8) NUMBITS(8) [],
        BOT_EN OFFSET(16) NUMBITS(1) [],
        BOT_RADIUS OFFSET(24) NUMBITS(8) [],
    ],

    /// Latches a newly written LUT or CABC configuration.
    pub EnhanceUpdate [
        CABC OFFSET(0) NUMBITS(1) [],
        GAMMA OFFSET(1) NUMBITS(1) [],
        HSV OFFSET(2) NUMBITS(1) [],
        LUT3D OFFSET(3) NUMBITS(1) [],
        SLP_LUT OFFSET(4) NUMBITS(1) [],
    ],

    pub HsvCfg [
        H0 OFFSET(0) NUMBITS(8) [],
        H1 OFFSET(8) NUMBITS(2) [],
        H2 OFFSET(12) NUMBITS(2) [],
    ],

    /// Gamma and 3D-LUT entries share this packing.
    pub RgbEntry [
        B OFFSET(0) NUMBITS(10) [],
        G OFFSET(10) NUMBITS(10) [],
        R OFFSET(20) NUMBITS(10) [],
    ],

    pub HsvEntry [
        S_G OFFSET(0) NUMBITS(9) [],
        H_O OFFSET(9) NUMBITS(7) [],
    ],
];
