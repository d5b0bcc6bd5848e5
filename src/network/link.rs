//! Host link removal over rtnetlink

use crate::error::{Error, Result};
use nix::errno::Errno;
use nix::net::if_::if_nametoindex;

/// Delete the interface `name` from the current network namespace
///
/// Idempotent: an interface that does not exist is treated as removed.
/// The netlink connection is opened on the calling thread, so it talks to
/// whatever namespace that thread is in.
pub fn remove_interface(name: &str) -> Result<()> {
    let index = match if_nametoindex(name) {
        Ok(index) => index,
        Err(Errno::ENODEV) => {
            tracing::debug!(interface = name, "interface already absent");
            return Ok(());
        }
        Err(e) => return Err(delete_failed(name, e)),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Io)?;

    rt.block_on(async {
        let (conn, handle, _) = rtnetlink::new_connection().map_err(|e| delete_failed(name, e))?;
        tokio::spawn(conn);

        match handle.link().del(index).execute().await {
            Ok(()) => {
                tracing::debug!(interface = name, index, "removed interface");
                Ok(())
            }
            // Removed concurrently between the lookup and the delete
            Err(e) if is_no_such_device(&e) => Ok(()),
            Err(e) => Err(delete_failed(name, e)),
        }
    })
}

fn is_no_such_device(err: &rtnetlink::Error) -> bool {
    matches!(err, rtnetlink::Error::NetlinkError(msg) if msg.raw_code() == -(Errno::ENODEV as i32))
}

fn delete_failed(name: &str, err: impl std::fmt::Display) -> Error {
    Error::InterfaceDeleteFailed {
        interface: name.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_absent_interface() {
        assert!(remove_interface("cw-absent0").is_ok());
        // Second call sees the same absent interface
        assert!(remove_interface("cw-absent0").is_ok());
    }

    #[test]
    fn test_no_such_device_matches_errno() {
        use netlink_packet_core::ErrorMessage;
        use std::num::NonZeroI32;

        let mut msg = ErrorMessage::default();
        msg.code = NonZeroI32::new(-(Errno::ENODEV as i32));
        assert!(is_no_such_device(&rtnetlink::Error::NetlinkError(msg.clone())));

        msg.code = NonZeroI32::new(-(Errno::EPERM as i32));
        assert!(!is_no_such_device(&rtnetlink::Error::NetlinkError(msg)));
        assert!(!is_no_such_device(&rtnetlink::Error::RequestFailed));
    }
}
