use std::path::PathBuf;

use anyhow::{Context, Result};

fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("novelmark"))
}

pub fn database_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("novelmark.db"))
}

pub fn catalog_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("novels.json"))
}
