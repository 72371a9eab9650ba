use super::ConfigOverrides;
use pkgimage::core::ImageResult;
use pkgimage::image::DeployOutcome;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run(
    image: &Path,
    target: &Path,
    overrides: &ConfigOverrides,
    cancel: &CancellationToken,
) -> ImageResult<()> {
    let image = super::load_image(image)?;
    let services = super::services(overrides)?;

    match image.deploy(&services, target, cancel).await? {
        DeployOutcome::UpToDate => {
            println!("{} is up to date", target.display());
        }
        DeployOutcome::Deployed { removed, installed } => {
            for package in &removed {
                println!("  - {}", package);
            }
            for package in &installed {
                println!("  + {}", package);
            }
            println!(
                "Deployed image {} to {} ({} removed, {} installed)",
                image.id(),
                target.display(),
                removed.len(),
                installed.len()
            );
        }
    }
    Ok(())
}
