// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-changed=resources/shell");

    // Packaged builds pass the version in explicitly
    let version = if let Ok(v) = std::env::var("CAMARA_VERSION") {
        v
    } else {
        get_git_version()
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn get_git_version() -> String {
    // "v0.1.0" at a tag, "v0.1.0-5-gabcdef1" after it
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output();

    let version = match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => return env_version_with_hash(),
    };

    let version = version.strip_prefix('v').unwrap_or(&version);

    if version.contains('-') {
        let parts: Vec<&str> = version.rsplitn(3, '-').collect();
        if parts.len() >= 3 {
            let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
            return format!("{}-dirty-{}", parts[2], hash);
        }
    }
    version.to_string()
}

fn env_version_with_hash() -> String {
    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    match get_commit_hash() {
        Some(hash) => format!("{}-{}", pkg, hash),
        None => pkg,
    }
}

fn get_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
