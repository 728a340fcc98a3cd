pub mod csv;

pub use self::csv::{to_csv, write_records, CsvOptions};
