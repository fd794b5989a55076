pub mod config;
pub mod errors;
pub mod response;
pub mod telemetry;
pub mod tracing;
pub mod validation;

pub use self::tracing::*;
pub use config::*;
pub use errors::*;
pub use response::*;
pub use telemetry::*;
pub use validation::*;
