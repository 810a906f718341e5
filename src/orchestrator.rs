//! Blocking bodies of the background console commands. These run on worker
//! threads and only see snapshots taken on the UI thread.

use crate::history::BLANK_LOCATION;
use crate::net::{host_from_location, AddressLookup, NameResolver};

pub(crate) fn whoami_report(lookup: &dyn AddressLookup) -> String {
    match lookup.lookup() {
        Ok(ip) => format!("Your public IP: {ip}"),
        Err(err) => {
            tracing::warn!(error = %err, "public address lookup failed");
            "Could not obtain the IP.".to_string()
        }
    }
}

/// One line per tab, in tab order.
pub(crate) fn serverip_report(
    locations: &[Option<String>],
    resolver: &dyn NameResolver,
) -> Vec<String> {
    locations
        .iter()
        .enumerate()
        .map(|(idx, location)| serverip_line(idx + 1, location.as_deref(), resolver))
        .collect()
}

fn serverip_line(tab_number: usize, location: Option<&str>, resolver: &dyn NameResolver) -> String {
    let no_page = format!("  Tab {tab_number}: no page loaded");
    let Some(location) = location.filter(|loc| has_remote_page(loc)) else {
        return no_page;
    };
    let Some(host) = host_from_location(location) else {
        return format!("  Tab {tab_number}:  → resolution failed");
    };
    match resolver.resolve(host) {
        Ok(ip) => format!("  Tab {tab_number}: {host} → {ip}"),
        Err(err) => {
            tracing::debug!(host, error = %err, "resolution failed");
            format!("  Tab {tab_number}: {host} → resolution failed")
        }
    }
}

fn has_remote_page(location: &str) -> bool {
    !location.is_empty() && !location.starts_with("file://") && location != BLANK_LOCATION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetError;
    use std::net::{IpAddr, Ipv4Addr};

    struct TableResolver;

    impl NameResolver for TableResolver {
        fn resolve(&self, host: &str) -> Result<IpAddr, NetError> {
            match host {
                "example.org" => Ok(IpAddr::V4(Ipv4Addr::new(93, 184, 215, 14))),
                _ => Err(NetError::NoAddress(host.to_string())),
            }
        }
    }

    struct FailingLookup;

    impl AddressLookup for FailingLookup {
        fn lookup(&self) -> Result<String, NetError> {
            Err(NetError::Lookup("timed out".to_string()))
        }
    }

    #[test]
    fn serverip_lines_cover_every_tab_state() {
        let locations = vec![
            Some("file:///opt/tabshell/newtab.html".to_string()),
            Some("https://example.org:8443/path".to_string()),
            Some("https://nowhere.invalid/".to_string()),
            None,
        ];
        let lines = serverip_report(&locations, &TableResolver);
        assert_eq!(
            lines,
            vec![
                "  Tab 1: no page loaded".to_string(),
                "  Tab 2: example.org → 93.184.215.14".to_string(),
                "  Tab 3: nowhere.invalid → resolution failed".to_string(),
                "  Tab 4: no page loaded".to_string(),
            ]
        );
    }

    #[test]
    fn blank_page_counts_as_not_loaded() {
        let lines = serverip_report(&[Some("about:blank".to_string())], &TableResolver);
        assert_eq!(lines, vec!["  Tab 1: no page loaded".to_string()]);
    }

    #[test]
    fn failed_lookup_reports_generic_message() {
        assert_eq!(whoami_report(&FailingLookup), "Could not obtain the IP.");
    }
}
