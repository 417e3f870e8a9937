//!
//! Vulkan Example - Compute Headless
//!
//! Run a compute shader over a storage buffer without any window, then read the result back.
//!

mod example;

fn main() {

    vkexamples::init_logger();

    if let Err(e) = example::run() {
        log::error!("{}", e);
        ::std::process::exit(1);
    }
}
