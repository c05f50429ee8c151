// Licensed under the Apache-2.0 license

use crate::events::HwEvent;
use disp_trusty::TrustyError;
use emulator_bus::BusError;
use thiserror::Error;

pub type DpuResult<T> = Result<T, DpuError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DpuError {
    #[error("dpu wait for {0} done time out")]
    Timeout(HwEvent),
    #[error("dpu is not initialized")]
    NotInitialized,
    #[error("register access failed: {0}")]
    Bus(#[from] BusError),
    #[error("secure layer hand-off failed: {0}")]
    Secure(#[from] TrustyError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unable to allocate {0}")]
    OutOfMemory(&'static str),
    #[error("layer[{index}] is invalid: {reason}")]
    InvalidLayer { index: usize, reason: &'static str },
    #[error("cabc cannot move from {from} to {to}")]
    InvalidCabcTransition { from: String, to: String },
    #[error("{table} lut access at word {index} is out of range")]
    LutOutOfRange { table: &'static str, index: usize },
    #[error("unsupported dpu version {0}")]
    UnsupportedVersion(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
