pub mod list_merge;
pub mod pagination;
pub mod task;
