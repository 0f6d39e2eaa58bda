use std::path::Path;

use anyhow::{bail, Result};

use agescroll_core::AppConfig;

/// Write the default configuration
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config already exists at {}\nUse --force to overwrite it.",
            path.display()
        );
    }

    AppConfig::default().save_to(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

pub fn path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}
