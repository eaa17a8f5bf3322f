// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::Path;
use std::process::{Command, ExitCode};

const IMAGE_REPO: &str = "tvplus-server";

fn run(root: &Path, cmd: &str) -> Result<(), String> {
    let status = Command::new("sh")
        .arg("-lc")
        .arg(cmd)
        .current_dir(root)
        .status()
        .map_err(|e| format!("failed to run `{cmd}`: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("command failed: {cmd}"))
    }
}

fn docker_build(root: &Path, variant: Option<&str>) -> Result<(), String> {
    match variant {
        None | Some("amd64") => run(root, &format!("docker build -t {IMAGE_REPO}:latest .")),
        Some("arm") => run(
            root,
            &format!("docker buildx build -f Dockerfile.arm -t {IMAGE_REPO}:arm --load ."),
        ),
        Some(other) => Err(format!("unknown image variant: {other} (expected amd64 or arm)")),
    }
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let arg = args.next().unwrap_or_else(|| "help".to_string());
    let Some(root) = Path::new(env!("CARGO_MANIFEST_DIR")).parent() else {
        eprintln!("xtask must live inside the workspace");
        return ExitCode::FAILURE;
    };

    let result = match arg.as_str() {
        "docker-build" => docker_build(root, args.next().as_deref()),
        "check" => run(root, "cargo fmt --all -- --check")
            .and_then(|()| run(root, "cargo clippy --workspace --all-targets -- -D warnings"))
            .and_then(|()| run(root, "cargo test --workspace")),
        "help" | "--help" | "-h" => {
            eprintln!("xtask commands:");
            eprintln!("  docker-build [amd64|arm]   build the {IMAGE_REPO} container image");
            eprintln!("  check                     fmt, clippy and tests for the workspace");
            Ok(())
        }
        _ => Err(format!(
            "unknown xtask command: {arg} (try `cargo run -p xtask -- help`)"
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
