use std::path::PathBuf;

use anyhow::{bail, Result};

use agescroll_core::MediaStore;

use super::list::print_catalog;

/// Reject missing paths before anything is sent to the store
pub fn check_files(files: &[PathBuf]) -> Result<()> {
    for file in files {
        if !file.is_file() {
            bail!("Not a file: {}", file.display());
        }
    }
    Ok(())
}

pub async fn run(store: &dyn MediaStore, files: &[PathBuf]) -> Result<()> {
    check_files(files)?;

    println!("Uploading {} file(s)...", files.len());
    let receipt = store.upload_photos(files).await?;
    println!("{}\n", receipt.message);

    // The store assigns names on upload; show what it holds now
    let catalog = store.list_photos().await?;
    print_catalog(&catalog);

    Ok(())
}
