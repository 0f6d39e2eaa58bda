use anyhow::Result;

use agescroll_core::{MediaCatalog, MediaStore};

pub async fn run(store: &dyn MediaStore) -> Result<()> {
    let catalog = store.list_photos().await?;
    print_catalog(&catalog);
    Ok(())
}

/// Print the catalog in timeline order
pub fn print_catalog(catalog: &MediaCatalog) {
    if catalog.is_empty() {
        println!("No images available.");
        println!("\nTo add photos, run:");
        println!("  agescroll upload <FILES>...");
        return;
    }

    println!("Photos ({}):\n", catalog.len());
    for (i, photo) in catalog.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, photo);
    }
}
