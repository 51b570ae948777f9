use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Failures of an external command, carrying enough to reproduce its exit status.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{command}' exited with status {code}")]
    Exited { command: String, code: i32 },
    #[error("'{command}' was terminated by signal {signal}")]
    Signaled { command: String, signal: i32 },
}

impl ExecError {
    /// Maps a non-successful status to an error. Returns `None` on success.
    pub fn from_status(command: &str, status: ExitStatus) -> Option<Self> {
        if status.success() {
            return None;
        }

        if let Some(code) = status.code() {
            return Some(Self::Exited {
                command: command.to_string(),
                code,
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Some(Self::Signaled {
                    command: command.to_string(),
                    signal,
                });
            }
        }

        Some(Self::Exited {
            command: command.to_string(),
            code: 1,
        })
    }

    /// The exit code the dispatcher should terminate with.
    ///
    /// Follows shell conventions: 127 for a missing program, 126 for one
    /// that cannot be executed, 128 + N for a signal.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => 127,
                io::ErrorKind::PermissionDenied => 126,
                _ => 1,
            },
            Self::Exited { code, .. } => u8::try_from(*code & 0xff).unwrap_or(1),
            Self::Signaled { signal, .. } => u8::try_from(128 + signal).unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_errors_follow_shell_codes() {
        let missing = ExecError::Spawn {
            program: "venv/bin/python".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(missing.exit_code(), 127);

        let denied = ExecError::Spawn {
            program: "manage.py".to_string(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.exit_code(), 126);
    }

    #[test]
    fn exit_code_is_passed_through() {
        let err = ExecError::Exited {
            command: "sudo systemctl restart django".to_string(),
            code: 5,
        };
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("status 5"));
    }

    #[test]
    fn signal_maps_above_128() {
        let err = ExecError::Signaled {
            command: "sudo journalctl -u bot -f".to_string(),
            signal: 2,
        };
        assert_eq!(err.exit_code(), 130);
    }

    #[cfg(unix)]
    #[test]
    fn from_status_reads_real_exit_codes() {
        use std::process::Command;

        let ok = Command::new("sh").args(["-c", "exit 0"]).status().unwrap();
        assert!(ExecError::from_status("sh", ok).is_none());

        let failed = Command::new("sh").args(["-c", "exit 3"]).status().unwrap();
        let err = ExecError::from_status("sh", failed).expect("non-zero status");
        assert_eq!(err.exit_code(), 3);
    }
}
