pub mod create;
pub mod delete;
pub mod get;
pub mod list_all;
pub mod update;

pub use create::create_list;
pub use delete::delete_list;
pub use get::get_list;
pub use list_all::list_lists;
pub use update::update_list;
