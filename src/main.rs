//! # Voxel World Demo Entry Point
//!
//! Runs the library's headless demo.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

fn main() {
    if let Err(err) = voxel_world::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
