use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

/// A unidirectional pipe. Both ends close on drop and are marked
/// close-on-exec, so only descriptors explicitly redirected survive into a
/// child's new program image.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl Pipe {
    pub fn new() -> io::Result<Self> {
        let mut fds: [libc::c_int; 2] = [-1; 2];
        open_cloexec_pipe(&mut fds)?;
        // SAFETY: both descriptors were just returned by pipe and are owned by nobody else.
        unsafe {
            Ok(Pipe {
                read: OwnedFd::from_raw_fd(fds[0]),
                write: OwnedFd::from_raw_fd(fds[1]),
            })
        }
    }

    pub fn raw_fds(&self) -> [RawFd; 2] {
        [self.read.as_raw_fd(), self.write.as_raw_fd()]
    }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn open_cloexec_pipe(fds: &mut [libc::c_int; 2]) -> io::Result<()> {
    // SAFETY: fds points to two writable c_ints.
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn open_cloexec_pipe(fds: &mut [libc::c_int; 2]) -> io::Result<()> {
    // SAFETY: fds points to two writable c_ints.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error());
    }
    for fd in fds.iter() {
        // SAFETY: fd is a descriptor we own.
        if unsafe { libc::fcntl(*fd, libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::close(fds[0]);
                libc::close(fds[1]);
            }
            return Err(err);
        }
    }
    Ok(())
}

/// System error text without the "(os error N)" suffix std appends,
/// e.g. "No such file or directory".
pub fn os_error_text(err: &io::Error) -> String {
    let text = err.to_string();
    match (err.raw_os_error(), text.rfind(" (os error ")) {
        (Some(_), Some(pos)) => text[..pos].to_string(),
        _ => text,
    }
}

pub fn errno_text(errno: i32) -> String {
    os_error_text(&io::Error::from_raw_os_error(errno))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Read, Write};

    #[test]
    fn test_pipe_round_trip() -> io::Result<()> {
        let pipe = Pipe::new()?;
        let mut writer = File::from(pipe.write);
        let mut reader = File::from(pipe.read);

        writer.write_all(b"hello")?;
        drop(writer);

        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        assert_eq!(buf, "hello");
        Ok(())
    }

    #[test]
    fn test_pipe_is_cloexec() -> io::Result<()> {
        let pipe = Pipe::new()?;
        for fd in pipe.raw_fds() {
            let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
            assert!(flags & libc::FD_CLOEXEC != 0);
        }
        Ok(())
    }

    #[test]
    fn test_errno_text_strips_suffix() {
        assert_eq!(errno_text(libc::ENOENT), "No such file or directory");
        assert_eq!(errno_text(libc::ENOTDIR), "Not a directory");
    }
}
