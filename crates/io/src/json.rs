// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use callbill_recon::RunOutput;

use crate::error::IoError;

/// Export the whole run (meta, summary, sheets) as pretty-printed JSON.
pub fn export(output: &RunOutput, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, output).map_err(|e| IoError::write(path, e))?;
    Ok(())
}
