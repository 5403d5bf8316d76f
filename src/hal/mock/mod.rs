pub mod driver;

pub use driver::{DriverStats, SimulatedDriver};
