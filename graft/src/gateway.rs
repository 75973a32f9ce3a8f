//! The parameter-gated command gateway.
//!
//! When a request carries the gateway's parameter, its value is run through
//! the host shell and the shell's standard output becomes the response body.
//! Without the parameter the gateway does nothing and spawns nothing.
//!
//! # Hazards
//!
//! These are deliberate and kept visible:
//!
//! - Standard output is read to end of stream with no size cap.
//! - Without a configured timeout a hung child blocks its request forever.
//! - The exit status is ignored; only stdout is returned.
//!
//! On unix each command runs in its own process group. When the wait times out,
//! fails, or is cancelled, the whole group is killed, so work the shell forked
//! does not outlive the request.

use graft_core::{GatewayError, Request, Response};
use std::{borrow::Cow, process::Stdio, time::Duration};
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
    time::timeout,
};

/// The host shell used to interpret command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: Cow<'static, str>,
    flag: Cow<'static, str>,
}

impl Shell {
    /// `sh -c <line>`
    pub const fn posix() -> Self {
        Self {
            program: Cow::Borrowed("sh"),
            flag: Cow::Borrowed("-c"),
        }
    }

    /// `cmd.exe /c <line>`
    pub const fn windows() -> Self {
        Self {
            program: Cow::Borrowed("cmd.exe"),
            flag: Cow::Borrowed("/c"),
        }
    }

    /// Detect the host OS. Never derived from a request.
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    fn for_os(os: &str) -> Self {
        if os == "windows" {
            Self::windows()
        } else {
            Self::posix()
        }
    }

    /// A custom interpreter, e.g. a specific shell path.
    pub fn new(program: impl Into<Cow<'static, str>>, flag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    /// The argument vector for `line`.
    pub fn argv<'a>(&'a self, line: &'a str) -> [&'a str; 3] {
        [&*self.program, &*self.flag, line]
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::detect()
    }
}

/// Whether the gateway consumed the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// The parameter was absent; normal processing should continue.
    NotHandled,
    /// A command ran (or failed) and the response is final.
    Handled,
}

/// Runs the value of a fixed request parameter as a shell command.
#[derive(Debug, Clone)]
pub struct CommandGateway {
    param: Cow<'static, str>,
    shell: Shell,
    timeout: Option<Duration>,
}

impl CommandGateway {
    /// A gateway keyed on `param`, using the detected host shell and no timeout.
    pub fn new(param: impl Into<Cow<'static, str>>) -> Self {
        Self {
            param: param.into(),
            shell: Shell::detect(),
            timeout: None,
        }
    }

    /// Use `shell` instead of the detected one.
    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Bound the wait for the child. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The parameter name the gateway reacts to.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Inspect `request` and, if the parameter is present, run it and write
    /// the output into `response`.
    ///
    /// Spawn and read failures are logged and written to the body as a
    /// plain-text message; they are still `Handled`.
    pub async fn handle(&self, request: &Request, response: &mut Response) -> GatewayOutcome {
        let Some(line) = request.param(&self.param) else {
            return GatewayOutcome::NotHandled;
        };

        tracing::info!(param = %self.param, command = %line, path = %request.path(), "Executing command");
        match self.execute(line).await {
            Ok(output) => {
                tracing::info!(bytes = output.len(), "Command finished");
                response.write(output);
            }
            Err(err) => {
                tracing::error!(command = %line, error = %err, "Command failed");
                response.write_line(format!("Command failed: {err}"));
            }
        }
        GatewayOutcome::Handled
    }

    /// Run `line` through the shell and return everything it wrote to stdout.
    ///
    /// The child's process group is killed when this future is dropped, times
    /// out or fails to read, and the shell itself is reaped on every path.
    pub async fn execute(&self, line: &str) -> Result<Vec<u8>, GatewayError> {
        let [program, flag, line] = self.shell.argv(line);
        let mut command = Command::new(program);
        command
            .arg(flag)
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| GatewayError::ProcessSpawn {
            program: program.to_owned(),
            source,
        })?;
        let mut group = ProcessGroup::of(&child);

        let result = match self.timeout {
            Some(limit) => timeout(limit, capture_stdout(&mut child))
                .await
                .unwrap_or(Err(GatewayError::Timeout(limit))),
            None => capture_stdout(&mut child).await,
        };

        match result {
            Ok(output) => {
                group.release();
                Ok(output)
            }
            Err(err) => {
                group.kill();
                // The shell may already be gone; only reaping matters here.
                let _ = child.wait().await;
                Err(err)
            }
        }
    }
}

async fn capture_stdout(child: &mut Child) -> Result<Vec<u8>, GatewayError> {
    let mut output = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout
            .read_to_end(&mut output)
            .await
            .map_err(GatewayError::StreamRead)?;
    }
    // Reap the child; its status is not inspected.
    child.wait().await.map_err(GatewayError::StreamRead)?;
    Ok(output)
}

/// Kills a child's process group on drop unless released.
///
/// Elsewhere than unix this is inert and `kill_on_drop` covers the direct
/// child only.
struct ProcessGroup {
    #[cfg(unix)]
    leader: Option<nix::unistd::Pid>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        #[cfg(unix)]
        {
            Self {
                leader: child
                    .id()
                    .and_then(|id| i32::try_from(id).ok())
                    .map(nix::unistd::Pid::from_raw),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = child;
            Self {}
        }
    }

    /// The shell exited on its own; leave the group alone.
    fn release(&mut self) {
        #[cfg(unix)]
        {
            self.leader = None;
        }
    }

    fn kill(&mut self) {
        #[cfg(unix)]
        if let Some(leader) = self.leader.take() {
            use nix::{
                errno::Errno,
                sys::signal::{Signal, killpg},
            };
            match killpg(leader, Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {
                    tracing::debug!(pgid = leader.as_raw(), "Command process group killed");
                }
                Err(errno) => {
                    tracing::warn!(pgid = leader.as_raw(), error = %errno, "Failed to kill command process group");
                }
            }
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
