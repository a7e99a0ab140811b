use crate::error::ShellError;

/// Keeps the calling process alive on Ctrl-C. Foreground children still
/// receive the terminal's SIGINT (exec resets handled signals to default),
/// so the caller can reap them and report their status.
pub fn install_interrupt_guard() -> Result<(), ShellError> {
    ctrlc::set_handler(|| {
        tracing::debug!("interrupt received, waiting for children");
    })?;
    Ok(())
}
