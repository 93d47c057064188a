//! Decoding of execution events from raw transaction logs.

pub mod program_data;

pub use program_data::{decode_record, parse_program_data_logs, LogTag, ProgramEvent};
