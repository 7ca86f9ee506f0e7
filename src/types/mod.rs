//! Value types shared by the coordinator components.

mod device_color;
mod discovery_method;
mod rgba;

pub use device_color::DeviceColor;
pub use discovery_method::DiscoveryMethod;
pub use rgba::Rgba;
