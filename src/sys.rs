//! Host environment detection
//!
//! Resolves where runtime sockets live, whether a rootless detached network
//! namespace exists, and whether a Unix socket can be reached.

use crate::error::{Error, Result};
use nix::unistd::{access, AccessFlags};
use std::env;
use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

/// CNI runtime directory for rootful execution
pub const ROOTFUL_CNI_RUNTIME_DIR: &str = "/run/cni";

/// Detached network namespace created by rootlesskit, relative to `XDG_RUNTIME_DIR`
const DETACHED_NETNS: &str = "containerd-rootless/netns";

fn xdg_runtime_dir() -> Result<PathBuf> {
    env::var_os("XDG_RUNTIME_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            Error::ConfigValidation(
                "XDG_RUNTIME_DIR must be set when running rootless".to_string(),
            )
        })
}

/// Directory holding CNI plugin runtime state such as the DHCP daemon socket
pub fn cni_runtime_dir(rootless: bool) -> Result<PathBuf> {
    if rootless {
        Ok(xdg_runtime_dir()?.join("cni"))
    } else {
        Ok(PathBuf::from(ROOTFUL_CNI_RUNTIME_DIR))
    }
}

/// Network namespace the rootless engine's interfaces live in, if any
pub fn detached_netns(rootless: bool) -> Result<Option<PathBuf>> {
    if !rootless {
        return Ok(None);
    }
    let path = xdg_runtime_dir()?.join(DETACHED_NETNS);
    Ok(path.exists().then_some(path))
}

/// Check that `path` is a Unix socket this process may read and write
///
/// Never connects to the socket, so it does not block on the listener.
pub fn is_socket_accessible(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)?;
    if !metadata.file_type().is_socket() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a socket", path.display()),
        )));
    }
    access(path, AccessFlags::R_OK | AccessFlags::W_OK)
        .map_err(|errno| Error::Io(std::io::Error::from(errno)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("cniwright-sys-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_rootful_runtime_dir() {
        assert_eq!(cni_runtime_dir(false).unwrap(), PathBuf::from("/run/cni"));
        assert_eq!(detached_netns(false).unwrap(), None);
    }

    #[test]
    fn test_socket_accessible() {
        let path = temp_path("dhcp.sock");
        let _ = fs::remove_file(&path);
        let _listener = UnixListener::bind(&path).unwrap();

        assert!(is_socket_accessible(&path).is_ok());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_socket() {
        assert!(is_socket_accessible(&temp_path("absent.sock")).is_err());
    }

    #[test]
    fn test_regular_file_is_not_socket() {
        let path = temp_path("plain");
        fs::write(&path, b"").unwrap();

        assert!(is_socket_accessible(&path).is_err());

        fs::remove_file(&path).unwrap();
    }
}
