//! Stamps the binary with the commit it was built from (`--version`).

use std::path::Path;
use std::process::Command;

fn git_describe(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let described = String::from_utf8(out.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}

fn main() {
    let manifest = std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default();
    let workspace = Path::new(&manifest).join("..");

    let revision = git_describe(&workspace).unwrap_or_else(|| String::from("no-git"));
    println!("cargo:rustc-env=STMTSCAN_BUILD_SHA={revision}");

    let head = workspace.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }
    println!("cargo:rerun-if-changed=build.rs");
}
