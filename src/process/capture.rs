use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};

use super::fd::Pipe;
use super::spawn::Redirects;
use crate::error::{Result, ShellError};

/// One-shot channel carrying a child's standard error back to the parent,
/// including diagnostics written when exec itself fails.
#[derive(Debug)]
pub struct ErrorCapture {
    pipe: Pipe,
}

impl ErrorCapture {
    pub fn new() -> Result<Self> {
        let pipe = Pipe::new().map_err(ShellError::PipeFailure)?;
        tracing::trace!(fds = ?pipe.raw_fds(), "error capture pipe");
        Ok(Self { pipe })
    }

    /// Child-side wiring: stderr goes to the write end, and both original
    /// descriptors are closed once the redirect is in place.
    pub fn redirects(&self) -> Redirects {
        Redirects {
            stderr: Some(self.write_fd()),
            close: self.pipe.raw_fds().to_vec(),
            ..Redirects::default()
        }
    }

    fn write_fd(&self) -> RawFd {
        self.pipe.write.as_raw_fd()
    }

    /// Closes the parent's write end and reads until the child side closes.
    /// At most `limit` bytes are kept; the rest is drained and discarded.
    pub fn collect(self, limit: usize) -> String {
        let Pipe { read, write } = self.pipe;
        drop(write);

        let mut reader = File::from(read);
        let mut kept = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let room = limit.saturating_sub(kept.len());
                    kept.extend_from_slice(&buf[..n.min(room)]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "error capture read failed");
                    break;
                }
            }
        }

        let text = String::from_utf8_lossy(&kept);
        text.trim_end_matches('\n').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_collect_reads_until_eof() -> Result<()> {
        let capture = ErrorCapture::new()?;
        let mut writer = File::from(capture.pipe.write.try_clone()?);
        writer.write_all(b"ls: cannot access 'x'\n")?;
        drop(writer);

        assert_eq!(capture.collect(4096), "ls: cannot access 'x'");
        Ok(())
    }

    #[test]
    fn test_collect_truncates_to_limit() -> Result<()> {
        let capture = ErrorCapture::new()?;
        let mut writer = File::from(capture.pipe.write.try_clone()?);
        writer.write_all(&[b'e'; 10_000])?;
        drop(writer);

        assert_eq!(capture.collect(16).len(), 16);
        Ok(())
    }

    #[test]
    fn test_redirects_close_both_ends() -> Result<()> {
        let capture = ErrorCapture::new()?;
        let redirects = capture.redirects();
        assert_eq!(redirects.stderr, Some(capture.write_fd()));
        assert_eq!(redirects.close.len(), 2);
        assert!(redirects.stdin.is_none() && redirects.stdout.is_none());
        Ok(())
    }
}
