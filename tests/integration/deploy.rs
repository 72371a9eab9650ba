#![cfg(unix)]

use super::*;
use predicates::prelude::*;

fn image_with(ctx: &TestContext, file: &str, packages: &[(&str, &str, Vec<&str>)]) -> PathBuf {
    let mut content = String::from("packages:\n");
    for (name, version, dependencies) in packages {
        let path = ctx.package_file(name, version, dependencies);
        content.push_str(&file_entry(name, version, &path, dependencies));
    }
    ctx.image(file, &content)
}

fn installer_log(ctx: &TestContext) -> Vec<String> {
    std::fs::read_to_string(ctx.target().join("installer.log"))
        .unwrap_or_default()
        .lines()
        .map(|line| {
            let (action, path) = line.split_once(' ').unwrap();
            let file = std::path::Path::new(path).file_name().unwrap();
            format!("{} {}", action, file.to_string_lossy())
        })
        .collect()
}

#[test]
fn deploy_installs_in_dependency_order() {
    let ctx = TestContext::new();
    let installer = ctx.script_installer("");
    let image = image_with(
        &ctx,
        "image.yaml",
        &[("App", "1.0.0", vec!["Core"]), ("Core", "1.0.0", vec![])],
    );

    ctx.pkgimage()
        .arg("deploy")
        .arg(&image)
        .arg("--target")
        .arg(ctx.target())
        .arg("--installer")
        .arg(&installer)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 removed, 2 installed"));

    assert_eq!(
        installer_log(&ctx),
        vec!["install Core-1.0.0.pkg", "install App-1.0.0.pkg"]
    );

    ctx.pkgimage()
        .arg("installed")
        .arg(ctx.target())
        .assert()
        .success()
        .stdout(predicate::str::contains("App version 1.0.0"));
}

#[test]
fn redeploying_same_image_is_a_no_op() {
    let ctx = TestContext::new();
    let installer = ctx.script_installer("");
    let image = image_with(&ctx, "image.yaml", &[("Core", "1.0.0", vec![])]);

    for _ in 0..2 {
        ctx.pkgimage()
            .arg("deploy")
            .arg(&image)
            .arg("--target")
            .arg(ctx.target())
            .arg("--installer")
            .arg(&installer)
            .assert()
            .success();
    }

    assert_eq!(installer_log(&ctx), vec!["install Core-1.0.0.pkg"]);
}

#[test]
fn deploy_replaces_removed_packages() {
    let ctx = TestContext::new();
    let installer = ctx.script_installer("");
    let first = image_with(
        &ctx,
        "first.yaml",
        &[("Core", "1.0.0", vec![]), ("Legacy", "1.0.0", vec!["Core"])],
    );
    let second = image_with(&ctx, "second.yaml", &[("Core", "2.0.0", vec![])]);

    for image in [&first, &second] {
        ctx.pkgimage()
            .arg("deploy")
            .arg(image)
            .arg("--target")
            .arg(ctx.target())
            .arg("--installer")
            .arg(&installer)
            .assert()
            .success();
    }

    let log = installer_log(&ctx);
    assert_eq!(
        &log[2..],
        [
            "uninstall Legacy-1.0.0.pkg.yaml".to_string(),
            "install Core-2.0.0.pkg".to_string()
        ]
    );
}

#[test]
fn deploy_reports_installer_errors() {
    let ctx = TestContext::new();
    let installer = ctx.script_installer(
        "echo 'error: payload of Core is corrupt' >&2\necho 'error: disk full' >&2\nexit 4",
    );
    let image = image_with(&ctx, "image.yaml", &[("Core", "1.0.0", vec![])]);

    ctx.pkgimage()
        .arg("deploy")
        .arg(&image)
        .arg("--target")
        .arg(ctx.target())
        .arg("--installer")
        .arg(&installer)
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("failure in installing packages")
                .and(predicate::str::contains("payload of Core is corrupt"))
                .and(predicate::str::contains("disk full"))
                .and(predicate::str::contains("exited with code 4")),
        );
}

#[test]
fn deploy_with_missing_installer() {
    let ctx = TestContext::new();
    let image = image_with(&ctx, "image.yaml", &[("Core", "1.0.0", vec![])]);

    ctx.pkgimage()
        .arg("deploy")
        .arg(&image)
        .arg("--target")
        .arg(ctx.target())
        .arg("--installer")
        .arg(ctx.temp.child("no-such-installer").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Installer not found"));
}
