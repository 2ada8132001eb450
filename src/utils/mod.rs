pub mod json_file_storage;
