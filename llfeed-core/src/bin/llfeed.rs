//! Command-line driver over the reference machine.

use llfeed_core::{main_with, Reference};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    std::process::exit(main_with(&args, Reference::new));
}
