//! Remote control-service binding.
//!
//! A [`ServiceBinder`] turns a service name into a [`ServiceHandle`]; the
//! handle's [`ControlService::toggle_feature`] is a remote call that may fail
//! for reasons outside the caller's control.
//!
//! [`SocketServiceBinder`] is the Unix-socket transport: a service named
//! `statusbar` listens on `<dir>/statusbar.sock` and speaks a line protocol.
//!
//! | Request | Success reply |
//! |---|---|
//! | `toggle_feature\n` | `ok\n` |
//!
//! Any other reply is reported as [`HostError::RemoteCall`].

use std::sync::Arc;

use hostkit_types::HostError;

/// Client side of an out-of-process control service.
pub trait ControlService: Send + Sync {
    /// Toggle the hardware-adjacent feature (camera flash) the service
    /// controls.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::RemoteCall`] when the call cannot be delivered or
    /// the service rejects it.
    fn toggle_feature(&self) -> Result<(), HostError>;
}

/// Shared reference to a bound control service.
pub type ServiceHandle = Arc<dyn ControlService>;

/// Resolves a service name to a live handle.
pub trait ServiceBinder: Send + Sync {
    /// Look up `name` and return a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ServiceUnavailable`] if no such service is
    /// registered.
    fn bind(&self, name: &str) -> Result<ServiceHandle, HostError>;
}

#[cfg(unix)]
pub use socket::SocketServiceBinder;

#[cfg(unix)]
mod socket {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use hostkit_types::HostError;
    use tracing::debug;

    use super::{ControlService, ServiceBinder, ServiceHandle};

    const TOGGLE_REQUEST: &[u8] = b"toggle_feature\n";
    const OK_REPLY: &str = "ok";

    /// Binds services published as Unix sockets in a directory.
    #[derive(Debug, Clone)]
    pub struct SocketServiceBinder {
        dir: PathBuf,
        timeout: Duration,
    }

    impl SocketServiceBinder {
        /// Resolve services under `dir`, with `timeout` applied to every read
        /// and write of a remote call.
        pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
            Self {
                dir: dir.into(),
                timeout,
            }
        }

        /// Socket path for the service called `name`.
        pub fn socket_path(&self, name: &str) -> PathBuf {
            self.dir.join(format!("{name}.sock"))
        }
    }

    impl ServiceBinder for SocketServiceBinder {
        fn bind(&self, name: &str) -> Result<ServiceHandle, HostError> {
            let path = self.socket_path(name);
            if !path.exists() {
                return Err(HostError::ServiceUnavailable(name.to_string()));
            }
            debug!(service = name, path = %path.display(), "resolved control service socket");
            Ok(Arc::new(SocketControlService {
                name: name.to_string(),
                path,
                timeout: self.timeout,
            }))
        }
    }

    struct SocketControlService {
        name: String,
        path: PathBuf,
        timeout: Duration,
    }

    impl SocketControlService {
        fn remote_err(&self, details: impl ToString) -> HostError {
            HostError::RemoteCall {
                service: self.name.clone(),
                details: details.to_string(),
            }
        }
    }

    impl ControlService for SocketControlService {
        fn toggle_feature(&self) -> Result<(), HostError> {
            let mut stream = UnixStream::connect(&self.path).map_err(|e| self.remote_err(e))?;
            stream
                .set_read_timeout(Some(self.timeout))
                .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                .map_err(|e| self.remote_err(e))?;
            stream
                .write_all(TOGGLE_REQUEST)
                .map_err(|e| self.remote_err(e))?;

            let mut reply = String::new();
            BufReader::new(&stream)
                .read_line(&mut reply)
                .map_err(|e| self.remote_err(e))?;
            match reply.trim() {
                OK_REPLY => Ok(()),
                "" => Err(self.remote_err("connection closed without a reply")),
                other => Err(self.remote_err(format!("unexpected reply '{other}'"))),
            }
        }
    }

}
