/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the emulated bus.

--*/

mod bus;
mod ram;
mod shared;

pub use bus::{Bus, BusError};
pub use ram::Ram;
pub use shared::SharedBus;
