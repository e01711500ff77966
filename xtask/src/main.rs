// QueryVault - Build Task Runner
// cargo xtask <command>

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use xshell::{cmd, Shell};

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.first().map(|s| s.as_str()) {
        Some("build") => {
            let release = args.iter().any(|a| a == "--release");
            build(&sh, release)
        }
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.iter().any(|a| a == "--check");
            format(&sh, check)
        }
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("QueryVault - Build Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the backend (release also assembles build/dist)");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Run the server, passing ARGS through");
    println!("  clean               Clean build artifacts");
    println!("  ci                  Run all CI checks (format + clippy + test)");
    println!("  dist                Create distribution package (tar.gz)");
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building QueryVault{}...", if release { " (release)" } else { "" });
    let _dir = sh.push_dir(project_root());

    if release {
        clippy(sh)?;
        cmd!(sh, "cargo build --release -p queryvault")
            .run()
            .context("Failed to build backend in release mode")?;
        create_distribution(sh)?;
        println!("📦 Distribution layout: build/dist/");
    } else {
        cmd!(sh, "cargo build -p queryvault")
            .run()
            .context("Failed to build backend")?;
    }

    println!("✅ Build complete");
    Ok(())
}

/// bin/ conf/ data/ logs/ migrations/ under build/dist
fn create_distribution(sh: &Shell) -> Result<()> {
    let project = project_root();
    let dist_dir = project.join("build/dist");

    for sub in ["bin", "conf", "data", "logs", "migrations"] {
        sh.create_dir(dist_dir.join(sub))?;
    }

    let binary = project.join("target/release/queryvault");
    sh.copy_file(&binary, dist_dir.join("bin"))
        .with_context(|| format!("Missing release binary {}", binary.display()))?;

    copy_dir_files(sh, &project.join("backend/migrations"), &dist_dir.join("migrations"))?;
    copy_dir_files(sh, &project.join("backend/conf"), &dist_dir.join("conf"))?;

    Ok(())
}

fn copy_dir_files(sh: &Shell, src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Ok(());
    }
    for entry in sh.read_dir(src)? {
        if entry.is_file() {
            sh.copy_file(&entry, dst)?;
        }
    }
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");
    let _dir = sh.push_dir(project_root());
    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;
    println!("✅ All tests passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    let _dir = sh.push_dir(project_root());
    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Code is not formatted, run `cargo xtask format`")?;
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format code")?;
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    println!("🔍 Running clippy...");
    let _dir = sh.push_dir(project_root());
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings")
        .run()
        .context("Clippy checks failed")?;
    Ok(())
}

fn run(sh: &Shell, args: &[String]) -> Result<()> {
    let _dir = sh.push_dir(project_root().join("backend"));
    cmd!(sh, "cargo run -p queryvault -- {args...}")
        .run()
        .context("Failed to run QueryVault")?;
    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 Cleaning build artifacts...");
    let project = project_root();
    let _dir = sh.push_dir(&project);
    cmd!(sh, "cargo clean").run()?;
    let build_dir = project.join("build");
    if build_dir.exists() {
        sh.remove_path(build_dir)?;
    }
    println!("✅ Clean complete");
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("🚀 Running CI pipeline...");
    format(sh, true)?;
    clippy(sh)?;
    test(sh)?;
    println!("🎉 CI pipeline completed successfully!");
    Ok(())
}

fn dist(sh: &Shell) -> Result<()> {
    build(sh, true)?;

    let dist_dir = project_root().join("build/dist");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("queryvault-{}.tar.gz", timestamp);

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf data logs migrations")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", dist_dir.join(&package_name).display());
    Ok(())
}

fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.parent().unwrap_or(manifest).to_path_buf()
}
