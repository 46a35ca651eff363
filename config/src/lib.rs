use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

mod helpers;
pub(crate) mod parse;
mod validate;

pub mod ast {
    pub use crate::validate::*;
}

pub fn parse(text: String) -> Result<ast::Schedule> {
    let parsed: parse::Schedule = toml::from_str(text.as_str())
        .context("Failed to parse schedule parameters from config file.")?;
    let validated = ast::Schedule::validate(parsed)
        .context("Failed to validate schedule parameters from config file.")?;
    debug!("{validated:#?}");
    Ok(validated)
}

/// Read and validate the schedule stored at `path`. A leading `~/` is
/// expanded to the home directory.
pub fn read(path: impl AsRef<Path>) -> Result<ast::Schedule> {
    let path = helpers::expand_home(path.as_ref());
    let text = std::fs::read_to_string(&path)
        .context(format!("Unable to open file located at {}", path.display()))?;
    parse(text)
}
