// Domain layer: core models and ports (interfaces). No storage SDK types leak in here.

pub mod model;
pub mod ports;
