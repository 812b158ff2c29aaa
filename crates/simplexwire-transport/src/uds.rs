use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::listener::poll_accept;
use crate::stream::SimplexStream;

/// Listening Unix domain socket bound to a filesystem path.
///
/// The socket file is removed again on drop, but only if the path still
/// refers to the inode this listener created.
pub struct UnixSocketListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl UnixSocketListener {
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on `path`.
    ///
    /// A stale socket left at `path` by an earlier run is removed first. Any
    /// other kind of file at that path is left alone and the bind fails.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;
        remove_stale_socket(&path)?;

        let listener = UnixListener::bind(&path).map_err(|e| bind_error(&path, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| bind_error(&path, e))?;

        let created_inode = std::fs::symlink_metadata(&path)
            .ok()
            .map(|meta| (meta.dev(), meta.ino()));

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            path,
            created_inode,
        })
    }

    /// Accept one incoming connection, waiting no later than `deadline`.
    pub fn accept_until(&self, deadline: Instant, timeout: Duration) -> Result<SimplexStream> {
        let (stream, _addr) = poll_accept(|| self.listener.accept(), deadline, timeout)?;
        let stream = SimplexStream::from_unix(stream);
        stream.set_nonblocking(false)?;
        debug!(path = ?self.path, "accepted connection");
        Ok(stream)
    }
}

impl Drop for UnixSocketListener {
    fn drop(&mut self) {
        let Some((expected_dev, expected_ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(
                    path = ?self.path,
                    "socket path identity changed; skipping cleanup"
                );
            }
        }
    }
}

/// Connect to a listening Unix domain socket.
pub fn connect(path: &Path) -> Result<SimplexStream> {
    check_path_len(path)?;
    let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
        endpoint: format!("unix:{}", path.display()),
        source: e,
    })?;
    debug!(?path, "connected to unix domain socket");
    Ok(SimplexStream::from_unix(stream))
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= UnixSocketListener::MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: UnixSocketListener::MAX_PATH_LEN,
        });
    }
    Ok(())
}

fn remove_stale_socket(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(bind_error(path, err)),
    };

    if !metadata.file_type().is_socket() {
        return Err(bind_error(
            path,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "existing path is not a unix socket",
            ),
        ));
    }

    debug!(?path, "removing stale socket");
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(bind_error(path, err)),
    }
}

fn bind_error(path: &Path, source: std::io::Error) -> TransportError {
    TransportError::Bind {
        endpoint: format!("unix:{}", path.display()),
        source,
    }
}
