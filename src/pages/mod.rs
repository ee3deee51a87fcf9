pub mod task_form;
pub mod task_list;
