pub mod errors;
pub mod list;
pub mod task;
pub mod timestamp;

pub use errors::*;
pub use list::*;
pub use task::*;
pub use timestamp::*;
