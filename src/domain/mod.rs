// Domain layer: profile records and the ports the pipeline is assembled from.

pub mod model;
pub mod ports;
