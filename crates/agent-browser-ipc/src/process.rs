//! Process liveness and signaling, behind a trait so lifecycle logic can be
//! tested without real processes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Kill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    NotFound,
    NoPermission,
}

pub trait ProcessController: Send + Sync {
    /// Signal-0 probe: is the pid alive (or at least present)?
    fn check_process(&self, pid: u32) -> Result<ProcessStatus, std::io::Error>;

    fn send_signal(&self, pid: u32, signal: Signal) -> Result<(), std::io::Error>;
}

/// A pid owned by another user answers EPERM to signal 0; it exists, which is
/// all the staleness check cares about.
pub fn is_alive(status: ProcessStatus) -> bool {
    matches!(status, ProcessStatus::Running | ProcessStatus::NoPermission)
}

pub struct UnixProcessController;

impl ProcessController for UnixProcessController {
    fn check_process(&self, pid: u32) -> Result<ProcessStatus, std::io::Error> {
        let pid_t: libc::pid_t = pid.try_into().map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "PID out of range")
        })?;

        let result = unsafe { libc::kill(pid_t, 0) };
        if result == 0 {
            return Ok(ProcessStatus::Running);
        }

        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Ok(ProcessStatus::NotFound),
            Some(libc::EPERM) => Ok(ProcessStatus::NoPermission),
            _ => Err(err),
        }
    }

    fn send_signal(&self, pid: u32, signal: Signal) -> Result<(), std::io::Error> {
        let pid_t: libc::pid_t = pid.try_into().map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "PID out of range")
        })?;

        let sig = match signal {
            Signal::Term => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        };

        let result = unsafe { libc::kill(pid_t, sig) };
        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockProcessController {
        process_states: Mutex<HashMap<u32, ProcessStatus>>,
        signals_sent: Mutex<Vec<(u32, Signal)>>,
    }

    impl MockProcessController {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_process(self, pid: u32, status: ProcessStatus) -> Self {
            self.process_states.lock().unwrap().insert(pid, status);
            self
        }

        pub fn signals_sent(&self) -> Vec<(u32, Signal)> {
            self.signals_sent.lock().unwrap().clone()
        }
    }

    impl ProcessController for MockProcessController {
        fn check_process(&self, pid: u32) -> Result<ProcessStatus, std::io::Error> {
            Ok(self
                .process_states
                .lock()
                .unwrap()
                .get(&pid)
                .copied()
                .unwrap_or(ProcessStatus::NotFound))
        }

        fn send_signal(&self, pid: u32, signal: Signal) -> Result<(), std::io::Error> {
            self.signals_sent.lock().unwrap().push((pid, signal));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockProcessController;
    use super::*;

    #[test]
    fn test_is_alive_counts_no_permission_as_present() {
        assert!(is_alive(ProcessStatus::Running));
        assert!(is_alive(ProcessStatus::NoPermission));
        assert!(!is_alive(ProcessStatus::NotFound));
    }

    #[test]
    fn test_mock_defaults_to_not_found() {
        let mock = MockProcessController::new();
        assert_eq!(mock.check_process(4242).unwrap(), ProcessStatus::NotFound);
    }

    #[test]
    fn test_mock_records_signals_in_order() {
        let mock = MockProcessController::new().with_process(1234, ProcessStatus::Running);
        mock.send_signal(1234, Signal::Term).unwrap();
        mock.send_signal(1234, Signal::Kill).unwrap();
        assert_eq!(
            mock.signals_sent(),
            vec![(1234, Signal::Term), (1234, Signal::Kill)]
        );
    }

    #[test]
    fn test_current_process_is_running() {
        let controller = UnixProcessController;
        let status = controller.check_process(std::process::id()).unwrap();
        assert_eq!(status, ProcessStatus::Running);
    }
}
