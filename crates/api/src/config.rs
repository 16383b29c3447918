use std::path::PathBuf;
use std::time::Duration;

use hostexec_core::execution::{Interpreters, RunnerLimits};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `900`).
    ///
    /// Should exceed `command_timeout_secs` so the runner's own timeout
    /// fires first and the caller gets a proper failure payload.
    pub request_timeout_secs: u64,
    /// Directory holding runnable scripts (default: `scripts`).
    pub scripts_dir: PathBuf,
    /// Directory browsed by the files API (default: `output`).
    pub output_dir: PathBuf,
    /// Directory served under `/static` (default: `public`).
    pub public_dir: PathBuf,
    /// Wall-clock limit per child process in seconds (default: `600`).
    pub command_timeout_secs: u64,
    /// Maximum concurrently running child processes (default: `8`).
    pub max_concurrent_processes: usize,
    /// Interpreter for `.sh` scripts (default: `bash`).
    pub script_shell: String,
    /// PowerShell host for `.ps1` scripts (default: `powershell`).
    pub powershell_bin: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `8000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `900`                   |
    /// | `SCRIPTS_DIR`              | `scripts`               |
    /// | `OUTPUT_DIR`               | `output`                |
    /// | `PUBLIC_DIR`               | `public`                |
    /// | `COMMAND_TIMEOUT_SECS`     | `600`                   |
    /// | `MAX_CONCURRENT_PROCESSES` | `8`                     |
    /// | `SCRIPT_SHELL`             | `bash`                  |
    /// | `POWERSHELL_BIN`           | `powershell`            |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let command_timeout_secs: u64 = std::env::var("COMMAND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("COMMAND_TIMEOUT_SECS must be a valid u64");

        let max_concurrent_processes: usize = std::env::var("MAX_CONCURRENT_PROCESSES")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("MAX_CONCURRENT_PROCESSES must be a valid usize");

        let dir = |key: &str, default: &str| {
            PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.into()))
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            scripts_dir: dir("SCRIPTS_DIR", "scripts"),
            output_dir: dir("OUTPUT_DIR", "output"),
            public_dir: dir("PUBLIC_DIR", "public"),
            command_timeout_secs,
            max_concurrent_processes,
            script_shell: std::env::var("SCRIPT_SHELL").unwrap_or_else(|_| "bash".into()),
            powershell_bin: std::env::var("POWERSHELL_BIN")
                .unwrap_or_else(|_| "powershell".into()),
        }
    }

    /// Runner limits derived from this configuration.
    pub fn runner_limits(&self) -> RunnerLimits {
        RunnerLimits {
            timeout: Duration::from_secs(self.command_timeout_secs),
            max_concurrent: self.max_concurrent_processes,
        }
    }

    /// Interpreter binaries derived from this configuration.
    pub fn interpreters(&self) -> Interpreters {
        Interpreters {
            shell: self.script_shell.clone(),
            powershell: self.powershell_bin.clone(),
        }
    }
}
