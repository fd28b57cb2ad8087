pub mod flash;
pub mod htmx;

pub use flash::{Flash, FlashLevel, push_flash, take_flashes};
pub use htmx::HtmxRequest;
