use super::*;
use predicates::prelude::*;

#[test]
fn cache_with_file_sources() {
    let ctx = TestContext::new();
    let core = ctx.package_file("Core", "1.0.0", &[]);
    let app = ctx.package_file("App", "1.0.0", &["Core"]);
    let image = ctx.image(
        "image.yaml",
        &format!(
            "packages:\n{}{}",
            file_entry("Core", "1.0.0", &core, &[]),
            file_entry("App", "1.0.0", &app, &["Core"])
        ),
    );

    ctx.pkgimage()
        .arg("cache")
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached 2 package(s)"));
}

#[test]
fn cache_fails_for_missing_file() {
    let ctx = TestContext::new();
    let missing = ctx.temp.child("packages").child("Gone.pkg").to_path_buf();
    let image = ctx.image(
        "image.yaml",
        &format!("packages:\n{}", file_entry("Gone", "1.0.0", &missing, &[])),
    );

    ctx.pkgimage()
        .arg("cache")
        .arg(&image)
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("Failed to fetch 1 package(s)")
                .and(predicate::str::contains("Gone 1.0.0")),
        );
}

#[test]
fn cache_from_directory_repository() {
    let ctx = TestContext::new();
    let repo = ctx.temp.child("repo");
    repo.child("Core.1.0.0.AnyCPU.pkg").write_str("payload").unwrap();
    let image = ctx.image(
        "image.yaml",
        &format!(
            "repositories: [{}]\npackages:\n  - name: Core\n    version: \"1.0.0\"\n",
            repo.path().display()
        ),
    );

    ctx.pkgimage()
        .arg("cache")
        .arg(&image)
        .arg("--cache-dir")
        .arg(ctx.temp.child("custom-cache").path())
        .assert()
        .success();

    let cached: Vec<_> = std::fs::read_dir(ctx.temp.child("custom-cache").child("packages").path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(cached.len(), 1);
    let name = cached[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Core.1.0.0."));
    assert!(name.ends_with(".pkg"));
    assert_eq!(std::fs::read_to_string(&cached[0]).unwrap(), "payload");
}
