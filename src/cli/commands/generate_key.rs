//! `ws secrets generate-key` — create a random master key.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::crypto::resolve::MASTER_KEY_FILE_ENV;
use crate::errors::Result;
use crate::ops;
use crate::writer::write_secure_file;

/// Execute the `generate-key` command.
pub fn execute(length: usize, output_path: Option<&Path>, mode: &str, force: bool) -> Result<()> {
    let key = Zeroizing::new(ops::generate_master_key(length)?);

    let Some(path) = output_path else {
        println!("{}", key.as_str());
        return Ok(());
    };

    let contents = Zeroizing::new(format!("{}\n", key.as_str()));
    write_secure_file(path, contents.as_bytes(), mode, force)?;

    output::success(&format!(
        "Generated a {length}-byte master key at {}",
        path.display()
    ));
    output::tip(&format!(
        "export {MASTER_KEY_FILE_ENV}={}",
        path.display()
    ));
    Ok(())
}
