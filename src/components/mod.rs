pub mod task_row;
pub mod toast;
