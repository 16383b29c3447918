//! Child process runner.
//!
//! [`ProcessRunner::run`] spawns one child from an [`ExecutionContext`],
//! buffers stdout/stderr in full, waits for exit under a wall-clock timeout,
//! and always returns an [`ExecutionResult`]: launch failures and timeouts
//! are captured in the result rather than raised.

use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::context::ExecutionContext;
use super::result::ExecutionResult;

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output beyond this limit is read and discarded, and the result is
/// flagged with `output_truncated`.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default wall-clock limit for a single child process.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default number of child processes allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Resource limits applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerLimits {
    /// Child is killed after this long.
    pub timeout: Duration,
    /// Admission limit on concurrently running children (at least 1).
    pub max_concurrent: usize,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Spawns and awaits child processes under [`RunnerLimits`].
///
/// Shared across requests behind an `Arc`; holds no per-request state.
#[derive(Debug)]
pub struct ProcessRunner {
    limits: RunnerLimits,
    permits: Semaphore,
    launches: AtomicU64,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(RunnerLimits::default())
    }
}

impl ProcessRunner {
    pub fn new(limits: RunnerLimits) -> Self {
        let max_concurrent = limits.max_concurrent.max(1);
        Self {
            limits: RunnerLimits {
                max_concurrent,
                ..limits
            },
            permits: Semaphore::new(max_concurrent),
            launches: AtomicU64::new(0),
        }
    }

    pub fn limits(&self) -> RunnerLimits {
        self.limits
    }

    /// Number of spawn attempts made so far.
    pub fn launch_count(&self) -> u64 {
        self.launches.load(Ordering::Relaxed)
    }

    /// Run `ctx` to completion and capture its outcome.
    ///
    /// Waits for an admission permit first; the permit is held until the
    /// child has exited or been killed.
    pub async fn run(&self, ctx: &ExecutionContext) -> ExecutionResult {
        let execution_id = Uuid::now_v7();

        let Ok(_permit) = self.permits.acquire().await else {
            return ExecutionResult::launch_failure("Process runner is shut down");
        };

        self.launches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            %execution_id,
            command = %ctx.resolved_command,
            working_dir = ?ctx.working_dir,
            "Launching process"
        );

        // The context's environment replaces the inherited one entirely.
        // `kill_on_drop(true)` reaps the child if this future is dropped.
        let mut cmd = Command::new(&ctx.program);
        cmd.args(&ctx.args)
            .env_clear()
            .envs(&ctx.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &ctx.working_dir {
            cmd.current_dir(dir);
        }

        // Unix: the child leads its own process group so a timeout can take
        // down anything it backgrounded along with it.
        #[cfg(unix)]
        cmd.process_group(0);

        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.limits.timeout;

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(%execution_id, program = %ctx.program, error = %e, "Process failed to launch");
                return ExecutionResult::launch_failure(format!(
                    "Failed to launch '{}': {e}",
                    ctx.program
                ));
            }
        };
        let pid = child.id();

        // One deadline covers the exit and both pipe drains: a backgrounded
        // grandchild holding stdout open must not outlive the limit.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let finished = tokio::time::timeout_at(deadline, async {
            tokio::join!(
                child.wait(),
                read_stream(stdout, "stdout", execution_id),
                read_stream(stderr, "stderr", execution_id),
            )
        })
        .await;

        let result = match finished {
            Ok((Ok(status), stdout, stderr)) => ExecutionResult::completed(
                exit_code(status),
                &String::from_utf8_lossy(&stdout.bytes),
                &String::from_utf8_lossy(&stderr.bytes),
                start.elapsed().as_millis() as u64,
            )
            .with_truncation(stdout.truncated || stderr.truncated),
            Ok((Err(e), _, _)) => ExecutionResult::launch_failure(format!(
                "Failed to wait for '{}': {e}",
                ctx.program
            )),
            Err(_elapsed) => {
                kill_process_tree(&mut child, pid, execution_id).await;
                ExecutionResult::timed_out(start.elapsed().as_millis() as u64)
            }
        };

        if result.timed_out {
            tracing::warn!(
                %execution_id,
                command = %ctx.resolved_command,
                duration_ms = result.duration_ms,
                "Process timed out and was killed"
            );
        } else {
            tracing::info!(
                %execution_id,
                program = %ctx.program,
                exit_code = result.exit_code,
                duration_ms = result.duration_ms,
                "Process finished"
            );
        }

        result
    }
}

/// Exit code of a finished process.
///
/// On Unix a signal-terminated process reports `128 + signal`, like a shell.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    super::result::LAUNCH_FAILURE_EXIT_CODE
}

/// Bytes captured from one output stream.
#[derive(Debug, Default)]
struct CapturedStream {
    bytes: Vec<u8>,
    /// More than [`MAX_OUTPUT_BYTES`] were written; the rest was discarded.
    truncated: bool,
}

/// Drain an output stream to EOF, keeping the first [`MAX_OUTPUT_BYTES`].
///
/// Bytes past the limit are still read and discarded so the child never
/// sees a closed pipe.
async fn read_stream<R: AsyncRead + Unpin>(
    handle: Option<R>,
    stream: &'static str,
    execution_id: Uuid,
) -> CapturedStream {
    let mut captured = CapturedStream::default();
    let Some(mut reader) = handle else {
        return captured;
    };

    if let Err(e) = (&mut reader)
        .take(MAX_OUTPUT_BYTES as u64)
        .read_to_end(&mut captured.bytes)
        .await
    {
        tracing::warn!(%execution_id, stream, error = %e, "Failed to read process output");
        return captured;
    }

    match tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
        Ok(0) => {}
        Ok(discarded) => {
            captured.truncated = true;
            tracing::warn!(
                %execution_id,
                stream,
                discarded_bytes = discarded,
                "Process output exceeded capture limit"
            );
        }
        Err(e) => {
            captured.truncated = true;
            tracing::warn!(%execution_id, stream, error = %e, "Failed to drain process output");
        }
    }
    captured
}

/// Kill a timed-out child and, on Unix, every process in its group.
async fn kill_process_tree(child: &mut Child, pid: Option<u32>, execution_id: Uuid) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            // SAFETY: killpg only sends a signal; the group id is the child's
            // pid because it was spawned with `process_group(0)`.
            let ret = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if ret == -1 {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ESRCH) {
                    tracing::warn!(%execution_id, error = %err, "Failed to kill process group");
                }
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    // `id()` is `None` once the child has been reaped; only the pipes were
    // still open in that case.
    if child.id().is_some() {
        if let Err(e) = child.kill().await {
            tracing::warn!(%execution_id, error = %e, "Failed to kill timed-out process");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::execution::context::{build_command_context, host_environment};
    use crate::execution::result::{LAUNCH_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE};
    use crate::types::EnvMap;

    fn command(cmd: &str) -> ExecutionContext {
        build_command_context(&host_environment(), &EnvMap::new(), cmd, None)
    }

    #[tokio::test]
    async fn echo_succeeds() {
        let runner = ProcessRunner::default();
        let result = runner.run(&command("echo hello")).await;
        assert!(result.success);
        assert_eq!(result.output, "hello");
        assert_eq!(result.error, None);
        assert_eq!(result.exit_code, 0);
        assert_eq!(runner.launch_count(), 1);
    }

    #[tokio::test]
    async fn nonzero_exit_is_preserved() {
        let runner = ProcessRunner::default();
        let result = runner.run(&command("exit 3")).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn stderr_is_captured_without_failing() {
        let runner = ProcessRunner::default();
        let result = runner.run(&command("echo out; echo warn >&2")).await;
        assert!(result.success);
        assert_eq!(result.output, "out");
        assert_eq!(result.error.as_deref(), Some("warn"));
    }

    #[tokio::test]
    async fn missing_binary_is_launch_failure() {
        let runner = ProcessRunner::default();
        let mut ctx = command("true");
        ctx.program = "/nonexistent/definitely-not-a-binary".to_string();
        ctx.args.clear();

        let result = runner.run(&ctx).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(result.output.is_empty());
        assert!(result.error.is_some());
        assert!(result.is_launch_failure());
    }

    #[tokio::test]
    async fn missing_working_dir_is_launch_failure() {
        let runner = ProcessRunner::default();
        let mut ctx = command("pwd");
        ctx.working_dir = Some(PathBuf::from("/nonexistent/working/dir"));

        let result = runner.run(&ctx).await;
        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
    }

    #[tokio::test]
    async fn working_directory_is_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = ProcessRunner::default();
        let mut ctx = command("pwd");
        ctx.working_dir = Some(dir.path().to_path_buf());

        let result = runner.run(&ctx).await;
        assert!(result.success);
        let expected = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(
            PathBuf::from(&result.output).canonicalize().expect("canonicalize output"),
            expected
        );
    }

    #[tokio::test]
    async fn environment_replaces_inherited_one() {
        let runner = ProcessRunner::default();
        let mut ctx = command(r#"echo "${FOO}:${HOME:-unset}""#);
        ctx.environment = EnvMap::from([
            ("PATH".to_string(), "/usr/bin:/bin".to_string()),
            ("FOO".to_string(), "bar".to_string()),
        ]);

        let result = runner.run(&ctx).await;
        assert!(result.success, "{result:?}");
        assert_eq!(result.output, "bar:unset");
    }

    #[tokio::test]
    async fn timeout_kills_child() {
        let runner = ProcessRunner::new(RunnerLimits {
            timeout: Duration::from_millis(200),
            max_concurrent: 1,
        });
        let result = runner.run(&command("sleep 5")).await;
        assert!(!result.success);
        assert!(result.timed_out);
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
        assert!(result.duration_ms < 5000);
    }

    #[tokio::test]
    async fn background_child_holding_stdout_is_bounded_by_timeout() {
        let runner = ProcessRunner::new(RunnerLimits {
            timeout: Duration::from_millis(500),
            max_concurrent: 1,
        });
        let start = Instant::now();

        let result = runner.run(&command("echo hi; sleep 4 &")).await;

        assert!(start.elapsed() < Duration::from_secs(3), "{:?}", start.elapsed());
        assert!(result.timed_out, "{result:?}");
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
    }

    #[tokio::test]
    async fn oversized_output_is_truncated_without_breaking_child() {
        let runner = ProcessRunner::default();

        let result = runner
            .run(&command("head -c 11000000 /dev/zero | tr '\\0' a"))
            .await;

        assert!(result.success, "exit_code={}", result.exit_code);
        assert_eq!(result.exit_code, 0);
        assert!(result.output_truncated);
        assert_eq!(result.output.len(), MAX_OUTPUT_BYTES);
    }

    #[tokio::test]
    async fn output_within_limit_is_not_truncated() {
        let runner = ProcessRunner::default();
        let result = runner.run(&command("head -c 4096 /dev/zero | tr '\\0' a")).await;
        assert!(result.success);
        assert!(!result.output_truncated);
        assert_eq!(result.output.len(), 4096);
    }

    #[tokio::test]
    async fn admission_limit_serialises_runs() {
        let runner = Arc::new(ProcessRunner::new(RunnerLimits {
            timeout: Duration::from_secs(10),
            max_concurrent: 1,
        }));
        let start = Instant::now();

        let a = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run(&command("sleep 0.3")).await })
        };
        let b = {
            let runner = Arc::clone(&runner);
            tokio::spawn(async move { runner.run(&command("sleep 0.3")).await })
        };

        assert!(a.await.expect("join").success);
        assert!(b.await.expect("join").success);
        assert!(start.elapsed() >= Duration::from_millis(600));
        assert_eq!(runner.launch_count(), 2);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let runner = ProcessRunner::new(RunnerLimits {
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: 0,
        });
        assert_eq!(runner.limits().max_concurrent, 1);
    }
}
