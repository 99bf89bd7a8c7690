pub mod snapshot;
pub mod topology;
