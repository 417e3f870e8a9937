//!
//! Vulkan Example - Render Headless
//!
//! Render a scene to an offscreen framebuffer without any window, then save it as a ppm file.
//!

mod data;
mod example;

fn main() {

    vkexamples::init_logger();

    if let Err(e) = example::run() {
        log::error!("{}", e);
        ::std::process::exit(1);
    }
}
