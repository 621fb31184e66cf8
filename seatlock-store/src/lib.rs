pub mod app_config;
pub mod registry;

pub use registry::{RegistryConfig, SeatRegistry};
