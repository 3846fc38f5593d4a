pub mod events_csv;
pub mod file;
pub mod stdin;
