use super::ConfigOverrides;
use pkgimage::core::ImageResult;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run(
    image: &Path,
    overrides: &ConfigOverrides,
    cancel: &CancellationToken,
) -> ImageResult<()> {
    let image = super::load_image(image)?;
    let services = super::services(overrides)?;

    image.cache(&services, cancel).await?;

    println!(
        "Cached {} package(s) of image {}",
        image.packages().len(),
        image.id()
    );
    Ok(())
}
