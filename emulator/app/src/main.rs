/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the display engine emulator.

--*/

use clap::Parser;
use emulator::{Emulator, EmulatorArgs};
use simple_logger::SimpleLogger;
use std::io;

fn main() -> io::Result<()> {
    let cli = EmulatorArgs::parse();
    let _ = SimpleLogger::new().with_level(cli.log_level).init();

    let emulator = Emulator::from_args(cli).map_err(io::Error::other)?;
    let status = emulator.run().map_err(io::Error::other)?;

    println!("vsyncs:        {}", status.vsync_count);
    println!("wb threshold:  {}", status.max_vsync_count);
    println!("wb pending:    {}", status.wb_en);
    println!("cabc:          {} (frame {})", status.cabc_state, status.frame_no);
    println!("enhance:       0x{:04x}", status.enhance_en.bits());
    Ok(())
}
