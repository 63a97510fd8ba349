//! Prism Terminal Demo - Rotating Cube
//!
//! Draws a cube, beads and an axle through the prism pipeline into the
//! terminal. Set `RUST_LOG=debug` to see stage construction logs on stderr.
//! Controls:
//!   - WASD / Arrow Keys: Rotate the cube
//!   - E/R: Roll rotation
//!   - Q/ESC: Quit
use prism_terminal::TerminalApp;
use std::io;

fn main() -> io::Result<()> {
    env_logger::init();
    println!("Prism Terminal Renderer - Loading...");

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(2.0)?;
    if let Err(err) = app.run() {
        log::error!("terminal renderer failed: {err}");
        return Err(err);
    }

    println!("Thank you for using Prism Terminal Renderer!");
    Ok(())
}
