use crate::error::Result;
use if_addrs::{get_if_addrs, IfAddr};
use std::net::Ipv4Addr;

/// First IPv4 address bound to the named network adapter.
///
/// The address is local to the host's network and is probably not public.
/// IPv6 addresses are skipped; `None` means the adapter does not exist or
/// has no IPv4 address.
pub fn determine_ip_address(adapter: &str) -> Result<Option<Ipv4Addr>> {
    for intf in get_if_addrs()? {
        tracing::debug!(interface = %intf.name, "examining interface");
        if intf.name != adapter {
            continue;
        }
        match intf.addr {
            IfAddr::V4(v4) => {
                tracing::debug!(interface = %intf.name, address = %v4.ip, "found IPv4 address");
                return Ok(Some(v4.ip));
            }
            IfAddr::V6(v6) => {
                tracing::debug!(address = %v6.ip, "skipping IPv6 address");
            }
        }
    }
    Ok(None)
}
