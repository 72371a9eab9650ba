use super::*;
use predicates::prelude::*;

#[test]
fn installed_empty_target() {
    let ctx = TestContext::new();

    ctx.pkgimage()
        .arg("installed")
        .arg(ctx.target())
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed"));
}

#[test]
fn installed_lists_recorded_packages() {
    let ctx = TestContext::new();
    let packages = ctx.temp.child("target").child(".pkgimage").child("packages");
    packages
        .child("Core.yaml")
        .write_str("name: Core\nversion: \"1.2.0\"\nclass: system-wide\n")
        .unwrap();
    packages
        .child("App.yaml")
        .write_str("name: App\nversion: \"3.0\"\ndependencies: [Core]\n")
        .unwrap();

    ctx.pkgimage()
        .arg("installed")
        .arg(ctx.target())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("App version 3.0.0")
                .and(predicate::str::contains("Core version 1.2.0"))
                .and(predicate::str::contains("[system-wide]")),
        );
}

#[test]
fn installed_rejects_broken_definition() {
    let ctx = TestContext::new();
    ctx.temp
        .child("target")
        .child(".pkgimage")
        .child("packages")
        .child("Broken.yaml")
        .write_str("name: [")
        .unwrap();

    ctx.pkgimage()
        .arg("installed")
        .arg(ctx.target())
        .assert()
        .failure();
}
