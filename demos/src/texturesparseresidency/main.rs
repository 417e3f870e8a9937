//!
//! Vulkan Example - Sparse texture residency
//!
//! Bind and release memory pages of a partially resident texture, without any window.
//! Each step logs how many pages of the texture are resident.
//!

mod example;

fn main() {

    vkexamples::init_logger();

    if let Err(e) = example::run() {
        log::error!("{}", e);
        ::std::process::exit(1);
    }
}
