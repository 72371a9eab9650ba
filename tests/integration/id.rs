use super::*;
use predicates::prelude::*;

const FORWARD: &str = r#"
repositories: [https://packages.example.com]
packages:
  - name: Core
    version: "1.0.0"
    hash: core-hash
  - name: App
    version: "2.0.0"
    hash: app-hash
    dependencies: [Core]
"#;

const REVERSED: &str = r#"
repositories: [https://packages.example.com]
packages:
  - name: App
    version: "2.0.0"
    hash: app-hash
    dependencies: [Core]
  - name: Core
    version: "1.0.0"
    hash: core-hash
"#;

fn id_of(ctx: &TestContext, image: &std::path::Path) -> String {
    let output = ctx.pkgimage().arg("id").arg(image).output().unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn id_does_not_depend_on_package_order() {
    let ctx = TestContext::new();
    let forward = ctx.image("forward.yaml", FORWARD);
    let reversed = ctx.image("reversed.yaml", REVERSED);

    let id = id_of(&ctx, &forward);
    assert!(!id.is_empty());
    assert_eq!(id, id_of(&ctx, &reversed));
}

#[test]
fn id_changes_with_package_content() {
    let ctx = TestContext::new();
    let original = ctx.image("image.yaml", FORWARD);
    let changed = ctx.image("changed.yaml", &FORWARD.replace("core-hash", "core-hash-2"));

    assert_ne!(id_of(&ctx, &original), id_of(&ctx, &changed));
}

#[test]
fn id_json_output() {
    let ctx = TestContext::new();
    let image = ctx.image("image.yaml", FORWARD);

    let output = ctx
        .pkgimage()
        .arg("id")
        .arg(&image)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["packages"][0]["name"], "App");
    assert_eq!(value["packages"][1]["name"], "Core");
    assert_eq!(value["id"], id_of(&ctx, &image).as_str());
}

#[test]
fn id_rejects_duplicate_packages() {
    let ctx = TestContext::new();
    let image = ctx.image(
        "image.yaml",
        "packages:\n  - name: A\n    version: \"1.0\"\n  - name: A\n    version: \"2.0\"\n",
    );

    ctx.pkgimage()
        .arg("id")
        .arg(&image)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("listed more than once"));
}

#[test]
fn id_missing_image_file() {
    let ctx = TestContext::new();

    ctx.pkgimage()
        .arg("id")
        .arg("missing.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
