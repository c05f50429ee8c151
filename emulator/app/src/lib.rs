/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Library interface for the display engine emulator.

--*/

pub mod emulator;

pub use emulator::{DsiMode, Emulator, EmulatorArgs, Interface};
