mod file_list;

pub use file_list::{format_size_mb, FileListView};
