pub mod confirm_delete;
pub mod input_bar;
pub mod status_bar;
pub mod task_detail;
pub mod task_list;
