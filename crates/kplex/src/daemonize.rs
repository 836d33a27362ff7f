//! Backgrounding: a single `fork` + `setsid` + `chdir("/")` + `umask(0)` +
//! closed standard streams, matching the original `main`'s handling of `-b`
//! exactly (it forks once, not twice — there is no second fork to shed a
//! session-leader controlling terminal because `setsid` already does that).

use std::io;
use std::os::unix::io::RawFd;

/// Forks into the background. Must run before any other thread exists:
/// `fork` only carries the calling thread into the child, so anything
/// spawned earlier (worker threads, the signal thread) would simply vanish
/// from the child's view while still holding whatever locks they owned.
///
/// Returns `Ok(())` in the child, which is the only caller that ever
/// observes a return — the parent exits immediately.
pub fn daemonize() -> io::Result<()> {
    match unsafe { libc::fork() } {
        -1 => Err(io::Error::last_os_error()),
        0 => {
            if unsafe { libc::setsid() } == -1 {
                return Err(io::Error::last_os_error());
            }
            std::env::set_current_dir("/")?;
            unsafe {
                libc::umask(0);
            }
            close_standard_streams()?;
            Ok(())
        }
        _child_pid => std::process::exit(0),
    }
}

fn close_standard_streams() -> io::Result<()> {
    for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] as [RawFd; 3] {
        if unsafe { libc::close(fd) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
