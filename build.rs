use std::env;
use std::path::Path;
use std::process::{Command, ExitStatus};

fn main() {
    println!("cargo:rerun-if-changed=frontend/dist");
    println!("cargo:rerun-if-env-changed=SKIP_FRONTEND_BUILD");

    let frontend_dir = Path::new("frontend");

    // 没有前端源码时直接使用仓库内预构建的 dist；源码路径只在存在时监听
    if !frontend_dir.join("package.json").exists() {
        return;
    }
    println!("cargo:rerun-if-changed=frontend/package.json");
    if frontend_dir.join("src").exists() {
        println!("cargo:rerun-if-changed=frontend/src");
    }

    if env::var_os("SKIP_FRONTEND_BUILD").is_some() {
        println!("cargo:warning=SKIP_FRONTEND_BUILD set, using prebuilt frontend/dist");
        return;
    }

    if pnpm(&["--version"], None).is_err() {
        println!("cargo:warning=pnpm not found, using prebuilt frontend/dist");
        return;
    }

    println!("cargo:warning=Building frontend...");

    // 安装依赖
    match pnpm(&["install"], Some(frontend_dir)) {
        Ok(status) if status.success() => {}
        Ok(status) => {
            println!("cargo:warning=Failed to install frontend dependencies: exit code {}", status);
            return;
        }
        Err(e) => {
            println!("cargo:warning=Failed to run pnpm install: {}", e);
            return;
        }
    }

    // 构建前端，产物输出到 frontend/dist 供 rust-embed 打包
    match pnpm(&["run", "build"], Some(frontend_dir)) {
        Ok(status) if status.success() => {
            println!("cargo:warning=Frontend build completed successfully");
        }
        Ok(status) => {
            panic!("Frontend build failed with exit code {}", status);
        }
        Err(e) => {
            panic!("Failed to run frontend build: {}", e);
        }
    }
}

/// 调用 pnpm (Windows 下需要经过 cmd)
fn pnpm(args: &[&str], dir: Option<&Path>) -> std::io::Result<ExitStatus> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "pnpm"]);
        c
    } else {
        Command::new("pnpm")
    };
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    command.status()
}
