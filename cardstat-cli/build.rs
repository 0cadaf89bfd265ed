use std::path::Path;
use std::process::Command;

/// `git describe` of the workspace, e.g. `a1b2c3d-dirty`
fn describe(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()?;
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (out.status.success() && !text.is_empty()).then(|| text.to_string())
}

fn main() {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let workspace = Path::new(&manifest).join("..");
    let build = describe(&workspace).unwrap_or_else(|| "dev".into());
    println!("cargo:rustc-env=CARDSTAT_BUILD_SHA={build}");
}
