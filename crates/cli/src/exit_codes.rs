//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success, report written                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, date range, file type)   |
//! | 3    | Input is missing a required column                   |
//! | 4    | Input has no usable rows                             |
//! | 5    | Nothing reconciled, no report written                |
//! | 6    | Config file unreadable or invalid                    |
//! | 7    | File read/write failure                              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the mapping functions below

use callbill_io::IoError;
use callbill_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid date range, unsupported file type.
pub const EXIT_USAGE: u8 = 2;

/// A required column could not be resolved in an input file.
pub const EXIT_SCHEMA: u8 = 3;

/// An input file (or every input file) has no data rows, or the client
/// list has no enabled numbers.
pub const EXIT_EMPTY: u8 = 4;

/// Reconciliation produced zero rows.
pub const EXIT_NO_MATCH: u8 = 5;

/// Config file could not be read, parsed, or validated.
pub const EXIT_CONFIG: u8 = 6;

/// Reading an input or writing an artifact failed.
pub const EXIT_IO: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Schema { .. } => EXIT_SCHEMA,
        ReconError::EmptyDataset { .. } => EXIT_EMPTY,
        ReconError::NoMatch(_) => EXIT_NO_MATCH,
        ReconError::InvalidDateRange(_) => EXIT_USAGE,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
    }
}

/// Map a file error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Unsupported { .. } => EXIT_USAGE,
        IoError::Read { .. }
        | IoError::Csv { .. }
        | IoError::Spreadsheet { .. }
        | IoError::Write { .. } => EXIT_IO,
    }
}
