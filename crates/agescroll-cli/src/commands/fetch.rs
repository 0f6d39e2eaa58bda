use std::path::PathBuf;

use anyhow::{Context, Result};

use agescroll_core::{MediaStore, PhotoId};

pub async fn run(store: &dyn MediaStore, id: &str, output: Option<PathBuf>) -> Result<()> {
    let photo = PhotoId::new(id);
    let bytes = store.fetch_photo(&photo).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(photo.as_str()));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Saved {} ({} bytes) to {}", photo, bytes.len(), path.display());
    Ok(())
}
