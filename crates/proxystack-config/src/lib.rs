//! Stack inputs for proxystack
//!
//! Everything the stack declaration needs comes from the process environment,
//! optionally seeded from a `.env` file. Loading is all-or-nothing: either
//! every required key is present or [`ConfigError::MissingConfiguration`]
//! lists the ones that are not.

pub mod env_file;
pub mod error;
pub mod inputs;

pub use env_file::{EnvFile, find_env_file};
pub use error::*;
pub use inputs::{IpAllowList, REQUIRED_KEYS, StackInputs};
