//! Configuration: the optional `secrets.toml` settings file and the
//! filesystem `Layout` derived from it.

pub mod layout;
pub mod settings;

pub use layout::{AllowList, Layout};
pub use settings::Settings;
