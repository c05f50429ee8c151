/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Register definitions for the r6p0 display processing unit.

--*/

mod flags;

pub mod bits;
pub mod regs;

pub use flags::{DpuIrq, EnhanceModules, MmuIrq};
