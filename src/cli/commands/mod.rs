//! Command implementations, one module per subcommand.

pub mod completions;
pub mod decrypt;
pub mod encrypt;
pub mod generate_key;
pub mod hash_password;
pub mod list;
