pub mod csv_file;
pub mod delimited;
pub mod excel_read;
pub mod excel_write;
pub mod source;
