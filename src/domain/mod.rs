// Domain layer: payload types and ports (interfaces) for the vision and search providers.

pub mod image;
pub mod model;
pub mod ports;
