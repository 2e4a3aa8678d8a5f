use crossbeam::channel;
use log::warn;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::host::HostError;
use crate::logging::log_host_error;

/// Execute a function with a timeout
/// Returns Ok(T) if the function completes within the timeout
/// Returns Err(Error::Timeout) if the function times out
/// Returns Err(Error::Host) if the function panics
pub fn execute_with_timeout<T, F>(operation: &str, timeout: Duration, task: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = channel::bounded(1);

    let spawned = thread::Builder::new()
        .name(format!("host-{}", operation.to_lowercase()))
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(task());
        });

    if let Err(e) = spawned {
        return Err(Error::Io(e));
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => Ok(result),
        Err(channel::RecvTimeoutError::Timeout) => {
            let err = Error::Timeout {
                operation: operation.to_string(),
                after: timeout,
            };
            log_host_error(operation, &err);
            Err(err)
        }
        Err(channel::RecvTimeoutError::Disconnected) => {
            // The worker dropped its sender without answering: it panicked
            warn!("{} worker exited without a result", operation);
            let err = Error::Host(HostError::other(format!("{} panicked", operation)));
            log_host_error(operation, &err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_task_returns_value() {
        let value = execute_with_timeout("fast", Duration::from_secs(1), || 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_slow_task_times_out() {
        let result = execute_with_timeout("slow", Duration::from_millis(10), || {
            thread::sleep(Duration::from_millis(300));
            1
        });
        match result {
            Err(Error::Timeout { operation, after }) => {
                assert_eq!(operation, "slow");
                assert_eq!(after, Duration::from_millis(10));
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_panicking_task_is_not_a_timeout() {
        let result: Result<()> =
            execute_with_timeout("explode", Duration::from_secs(1), || panic!("boom"));
        match result {
            Err(Error::Host(err)) => assert_eq!(err.message, "explode panicked"),
            other => panic!("expected host error, got {:?}", other),
        }
    }
}
