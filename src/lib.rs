//! seance-archive - incremental archiver for Council of State sessions.
//!
//! Walks the paginated session listing, records every session once with the
//! time it was first seen, extracts each session's discussions and attached
//! files, and downloads the attachments selected by name.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod source;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
