pub mod dynamodb;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod tables;

pub use dynamodb::*;
pub use gateway::*;
pub use memory::*;
pub use models::*;
pub use tables::*;
