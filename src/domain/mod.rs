// Domain layer: probe port and the values it produces. Concrete probes live in adapters.

pub mod model;
pub mod ports;
