use pkgimage::core::ImageResult;
use pkgimage::di::InstallationQuery;
use pkgimage::installation::DirectoryInstallation;
use pkgimage::package::PackageDef;
use std::path::Path;

pub fn run(target: &Path) -> ImageResult<()> {
    let packages = DirectoryInstallation::new().installed_packages(target)?;

    if packages.is_empty() {
        println!("No packages installed in {}", target.display());
        return Ok(());
    }

    println!("Packages installed in {}:", target.display());
    for package in &packages {
        println!("  {}", describe(package));
    }
    Ok(())
}

fn describe(package: &PackageDef) -> String {
    let mut line = package.identity().to_string();
    if package.class.is_system_wide() {
        line.push_str(" [system-wide]");
    }
    line
}
