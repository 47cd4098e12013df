pub mod color;
pub mod datetime;
pub mod file_size;
