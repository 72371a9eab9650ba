use pkgimage::core::{ImageError, ImageResult};
use pkgimage::image::ImageIdentifier;
use pkgimage::package::package_hash;
use serde_json::json;
use std::path::Path;

pub fn run(image: &Path, json: bool) -> ImageResult<()> {
    let image = super::load_image(image)?;

    if json {
        let output = serde_json::to_string_pretty(&to_json(&image))
            .map_err(|e| ImageError::Config(format!("Failed to serialize image: {}", e)))?;
        println!("{}", output);
    } else {
        println!("{}", image.id());
    }
    Ok(())
}

fn to_json(image: &ImageIdentifier) -> serde_json::Value {
    let packages: Vec<serde_json::Value> = image
        .packages()
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "version": p.version.to_string(),
                "architecture": p.architecture,
                "os": p.os,
                "hash": package_hash(p),
            })
        })
        .collect();

    json!({
        "id": image.id(),
        "packages": packages,
        "repositories": image.repositories(),
    })
}
