use std::path::{Path, PathBuf};

use anyhow::{Result, bail, ensure};

pub(crate) fn expand_home(path: &Path) -> PathBuf {
    if let Some(stripped) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home_dir) = home::home_dir() {
            return home_dir.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub(crate) fn verify_nonnegative(val: i64) -> Result<u64> {
    if val.is_negative() {
        bail!("Value must not be negative but found {val}")
    } else {
        Ok(val.unsigned_abs())
    }
}

pub(crate) fn verify_positive(val: i64) -> Result<u64> {
    ensure!(val > 0, "Value must be greater than zero but found {val}");
    Ok(val.unsigned_abs())
}
