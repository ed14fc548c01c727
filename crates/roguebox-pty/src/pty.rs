//! POSIX PTY backend: openpty + fork + execvp.
//!
//! The game is spawned with the slave end as its controlling terminal and
//! the master end kept non-blocking in the parent. Geometry is pinned to
//! 80x24 before exec so the game lays out its screen for exactly the grid
//! the emulator maintains.

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::Path;

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::pty::openpty;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use tracing::{debug, warn};

use roguebox_types::RogueError;

use crate::driver::ProcessDriver;
use crate::{SCREEN_COLS, SCREEN_ROWS};

/// Check that the given path points to something we can execute.
///
/// This runs before any spawn attempt: a bad path is a configuration
/// error, not a runtime one.
pub fn verify_executable(path: &Path) -> Result<(), RogueError> {
    use std::os::unix::fs::PermissionsExt;

    let meta = std::fs::metadata(path).map_err(|_| {
        RogueError::Configuration(format!("game executable not found: {}", path.display()))
    })?;
    if !meta.is_file() || meta.permissions().mode() & 0o111 == 0 {
        return Err(RogueError::Configuration(format!(
            "game path is not executable: {}",
            path.display()
        )));
    }
    Ok(())
}

/// The game process running in a pseudo-terminal.
pub struct PtyProcess {
    master: OwnedFd,
    child_pid: Pid,
    reaped: bool,
}

impl PtyProcess {
    /// Spawn the game in a new 80x24 PTY.
    ///
    /// The master fd is set non-blocking so screen bytes can be pumped
    /// with plain reads from the poll loop.
    pub fn spawn(command: &Path, args: &[String]) -> Result<Self, RogueError> {
        verify_executable(command)?;

        let pty =
            openpty(None, None).map_err(|e| RogueError::Pty(format!("openpty failed: {e}")))?;

        // Safety: fork is unsafe but standard Unix practice for PTY
        // management. The child immediately exec's, so async-signal-safety
        // is maintained.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                // Child setup runs in a closure so ? collects errors without
                // returning to the caller -- returning would be the child
                // process running the parent's code path. Errors must end in
                // _exit(), never a normal return.
                let err = (|| -> Result<(), String> {
                    drop(pty.master);

                    unistd::setsid().map_err(|e| format!("setsid failed: {e}"))?;

                    // Make the slave our controlling terminal and pin the
                    // window size before exec, so the game never sees any
                    // geometry other than 80x24.
                    unsafe {
                        if libc::ioctl(pty.slave.as_raw_fd(), libc::TIOCSCTTY as _, 0) < 0 {
                            let err = std::io::Error::last_os_error();
                            eprintln!("roguebox-pty: TIOCSCTTY failed: {err}");
                        }
                        let ws = libc::winsize {
                            ws_row: SCREEN_ROWS,
                            ws_col: SCREEN_COLS,
                            ws_xpixel: 0,
                            ws_ypixel: 0,
                        };
                        if libc::ioctl(pty.slave.as_raw_fd(), libc::TIOCSWINSZ, &ws) < 0 {
                            let err = std::io::Error::last_os_error();
                            eprintln!("roguebox-pty: TIOCSWINSZ failed: {err}");
                        }
                    }

                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDIN_FILENO)
                        .map_err(|e| format!("dup2 stdin: {e}"))?;
                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDOUT_FILENO)
                        .map_err(|e| format!("dup2 stdout: {e}"))?;
                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDERR_FILENO)
                        .map_err(|e| format!("dup2 stderr: {e}"))?;

                    drop(pty.slave);

                    let c_command = CString::new(command.as_os_str().as_encoded_bytes())
                        .map_err(|e| format!("invalid command: {e}"))?;
                    let mut c_args: Vec<CString> = vec![c_command.clone()];
                    for arg in args {
                        c_args
                            .push(CString::new(arg.as_str()).map_err(|e| format!("invalid arg: {e}"))?);
                    }

                    unistd::execvp(&c_command, &c_args)
                        .map_err(|e| format!("exec failed: {e}"))?;

                    Ok(()) // unreachable: execvp replaces the process
                })();

                if let Err(e) = err {
                    eprintln!("roguebox-pty: child setup failed: {e}");
                }
                unsafe { libc::_exit(1) };
            }
            Ok(ForkResult::Parent { child }) => {
                drop(pty.slave);

                let flags = fcntl(pty.master.as_raw_fd(), FcntlArg::F_GETFL)
                    .map_err(|e| RogueError::Pty(format!("fcntl F_GETFL: {e}")))?;
                let flags = OFlag::from_bits_truncate(flags);
                fcntl(
                    pty.master.as_raw_fd(),
                    FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK),
                )
                .map_err(|e| RogueError::Pty(format!("fcntl F_SETFL: {e}")))?;

                debug!(pid = child.as_raw(), "spawned game process");

                Ok(Self {
                    master: pty.master,
                    child_pid: child,
                    reaped: false,
                })
            }
            Err(e) => Err(RogueError::Pty(format!("fork failed: {e}"))),
        }
    }

    /// The child's process ID.
    pub fn pid(&self) -> u32 {
        u32::try_from(self.child_pid.as_raw()).unwrap_or(0)
    }

    /// Reap the child if it has exited, without blocking.
    fn try_reap(&mut self) {
        if self.reaped {
            return;
        }
        match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {}
            Ok(_) | Err(nix::errno::Errno::ECHILD) => self.reaped = true,
            Err(_) => {}
        }
    }
}

impl ProcessDriver for PtyProcess {
    /// Write all bytes to the master PTY.
    ///
    /// Retries on EAGAIN up to ~5 seconds before giving up. Without a
    /// limit, a child that stops reading stdin could spin this forever.
    fn write(&mut self, data: &[u8]) -> Result<(), RogueError> {
        let mut written = 0;
        let mut retries = 0u32;
        while written < data.len() {
            match unistd::write(&self.master, &data[written..]) {
                Ok(n) => {
                    written += n;
                    retries = 0;
                }
                Err(nix::errno::Errno::EAGAIN) => {
                    retries += 1;
                    if retries > 5000 {
                        return Err(RogueError::Pty(
                            "pty write: buffer full after 5s of retries".into(),
                        ));
                    }
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Err(e) => {
                    return Err(RogueError::Pty(format!("pty write: {e}")));
                }
            }
        }
        Ok(())
    }

    /// Non-blocking read from the master PTY.
    ///
    /// Returns `Ok(0)` if no data is available. EIO on the master means
    /// the child closed the slave (exited), which is also "no data".
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, RogueError> {
        match unistd::read(self.master.as_raw_fd(), buf) {
            Ok(n) => Ok(n),
            Err(nix::errno::Errno::EAGAIN) => Ok(0),
            Err(nix::errno::Errno::EIO) => Ok(0),
            Err(e) => Err(RogueError::Pty(format!("pty read: {e}"))),
        }
    }

    /// Check liveness without reaping.
    ///
    /// Uses `kill(pid, 0)` instead of `waitpid(WNOHANG)` so the exit
    /// status stays available for the reap in `kill`.
    fn is_alive(&self) -> bool {
        !self.reaped && signal::kill(self.child_pid, None).is_ok()
    }

    /// SIGKILL the child and reap it. Idempotent.
    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = signal::kill(self.child_pid, Signal::SIGKILL) {
            if e != nix::errno::Errno::ESRCH {
                warn!(pid = self.child_pid.as_raw(), "SIGKILL failed: {e}");
            }
        }
        // SIGKILL cannot be caught; the child exits as soon as it is
        // scheduled. Block until it is reaped so a subsequent spawn can
        // never race an orphaned predecessor.
        loop {
            match waitpid(self.child_pid, None) {
                Ok(WaitStatus::StillAlive) => continue,
                Ok(_) | Err(nix::errno::Errno::ECHILD) => break,
                Err(e) => {
                    warn!(pid = self.child_pid.as_raw(), "waitpid after kill: {e}");
                    break;
                }
            }
        }
        self.reaped = true;
        debug!(pid = self.child_pid.as_raw(), "game process killed and reaped");
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        // Best-effort cleanup: never leave a zombie behind the handle.
        self.try_reap();
        if !self.reaped {
            self.kill();
        }
        // OwnedFd closes the master automatically.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn drain(driver: &mut PtyProcess) -> Vec<u8> {
        let mut buf = [0u8; 1024];
        let mut output = Vec::new();
        loop {
            match driver.read_nonblocking(&mut buf) {
                Ok(0) => break,
                Ok(n) => output.extend_from_slice(&buf[..n]),
                Err(_) => break,
            }
        }
        output
    }

    #[test]
    fn spawn_echo_and_read_output() {
        let mut driver =
            PtyProcess::spawn(&PathBuf::from("/bin/echo"), &["hello game".to_string()])
                .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(100));
        let text = String::from_utf8_lossy(&drain(&mut driver)).to_string();
        assert!(text.contains("hello game"), "unexpected output: {text:?}");
    }

    #[test]
    fn spawn_cat_and_write_keystrokes() {
        let mut driver =
            PtyProcess::spawn(&PathBuf::from("/bin/cat"), &[]).expect("spawn failed");

        std::thread::sleep(Duration::from_millis(50));
        driver.write(b"hjkl\n").expect("write failed");
        std::thread::sleep(Duration::from_millis(100));

        let text = String::from_utf8_lossy(&drain(&mut driver)).to_string();
        assert!(text.contains("hjkl"), "unexpected output: {text:?}");

        driver.kill();
        assert!(!driver.is_alive());
    }

    #[test]
    fn kill_is_idempotent() {
        let mut driver =
            PtyProcess::spawn(&PathBuf::from("/bin/cat"), &[]).expect("spawn failed");
        assert!(driver.is_alive());

        driver.kill();
        assert!(!driver.is_alive());
        // second kill performs no process operations and does not panic
        driver.kill();
        assert!(!driver.is_alive());
    }

    #[test]
    fn verify_executable_rejects_missing_path() {
        let err = verify_executable(Path::new("/nonexistent/rogue")).unwrap_err();
        assert!(matches!(err, RogueError::Configuration(_)));
    }

    #[test]
    fn verify_executable_rejects_non_executable_file() {
        let file = tempfile_path();
        std::fs::write(&file, "not a program").unwrap();
        let err = verify_executable(&file).unwrap_err();
        assert!(matches!(err, RogueError::Configuration(_)));
        std::fs::remove_file(&file).ok();
    }

    #[test]
    fn spawn_fails_fast_on_bad_path() {
        let err = match PtyProcess::spawn(Path::new("/nonexistent/rogue"), &[]) {
            Ok(_) => panic!("expected configuration error"),
            Err(e) => e,
        };
        assert!(matches!(err, RogueError::Configuration(_)));
    }

    fn tempfile_path() -> PathBuf {
        std::env::temp_dir().join(format!("roguebox-pty-test-{}", std::process::id()))
    }
}
