pub mod csv_reader;
pub mod error;
pub mod json_writer;

// Re-export commonly used types
pub use csv_reader::CsvCustomerStream;
pub use error::IoError;
pub use json_writer::JsonLinesWriter;
