//! `ws secrets hash-password` — print an argon2id PHC hash.

use crate::cli::read_password;
use crate::errors::Result;
use crate::ops;

/// Execute the `hash-password` command.
pub fn execute() -> Result<()> {
    let password = read_password()?;
    let hash = ops::generate_password_hash(password.as_bytes())?;
    println!("{hash}");
    Ok(())
}
