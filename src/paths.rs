use std::path::PathBuf;

use anyhow::{Context, Result};

fn data_home() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("playsession"))
}

pub fn database_file_path() -> Result<PathBuf> {
    Ok(data_home()?.join("playsession.db"))
}

pub fn log_file_path() -> Result<PathBuf> {
    Ok(data_home()?.join("playsession.log"))
}
