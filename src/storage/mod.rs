mod file_storage;

pub use file_storage::{default_data_dir, read_json_or_default, write_json, Result, StoreError};
