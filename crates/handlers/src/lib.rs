pub mod constraints;
pub mod context;
pub mod list;
pub mod pipeline;
pub mod runtime;
pub mod task;

pub use constraints::Constraints;
pub use context::HandlerContext;
pub use pipeline::{HandlerFailure, HandlerResult};
