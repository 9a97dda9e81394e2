// Domain layer: request/reply models and the persistence port. No HTTP types here.

pub mod model;
pub mod ports;
