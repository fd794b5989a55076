pub mod create;
pub mod delete;
pub mod update;

pub use create::create_task;
pub use delete::delete_task;
pub use update::update_task;
