#![cfg(target_os = "linux")]

use std::fs;

use ventricle::{ShellError, ShellSession};

fn open_descriptors() -> usize {
    fs::read_dir("/proc/self/fd").map(|dir| dir.count()).unwrap_or(0)
}

fn nofile_limit() -> libc::rlimit {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    assert_eq!(unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) }, 0);
    limit
}

fn set_nofile_limit(limit: &libc::rlimit) {
    assert_eq!(unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, limit) }, 0);
}

// Only test in this binary: it lowers the process-wide descriptor limit.
#[test]
fn test_pipe_failure_closes_created_pipes() -> Result<(), ShellError> {
    let mut session = ShellSession::create()?;
    let stages: Vec<Vec<String>> = (0..8).map(|_| vec!["cat".to_string()]).collect();

    let baseline = open_descriptors();
    let original = nofile_limit();
    let lowered = libc::rlimit {
        rlim_cur: (baseline + 5) as libc::rlim_t,
        rlim_max: original.rlim_max,
    };

    set_nofile_limit(&lowered);
    let result = session.execute_pipeline(&stages);
    set_nofile_limit(&original);

    assert!(matches!(result, Err(ShellError::PipeFailure(_))));
    assert_eq!(open_descriptors(), baseline);
    assert_eq!(session.last_exit_code(), -1);
    assert!(session
        .last_error()
        .is_some_and(|text| text.starts_with("pipe creation failed")));
    Ok(())
}
