use std::net::{IpAddr, ToSocketAddrs};
use std::time::Duration;

pub(crate) const DEFAULT_LOOKUP_URL: &str = "https://api.ipify.org";
pub(crate) const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;
const MAX_LOOKUP_BODY_CHARS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub(crate) enum NetError {
    #[error("could not resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("no address found for {0}")]
    NoAddress(String),

    #[error("address lookup failed: {0}")]
    Lookup(String),

    #[error("address lookup returned an empty body")]
    EmptyBody,
}

/// Hostname to first numeric address.
pub(crate) trait NameResolver: Send + Sync {
    fn resolve(&self, host: &str) -> Result<IpAddr, NetError>;
}

/// Fetches the caller's externally visible address.
pub(crate) trait AddressLookup: Send + Sync {
    fn lookup(&self) -> Result<String, NetError>;
}

pub(crate) struct SystemResolver;

impl NameResolver for SystemResolver {
    fn resolve(&self, host: &str) -> Result<IpAddr, NetError> {
        let addrs: Vec<IpAddr> = (host, 0)
            .to_socket_addrs()
            .map_err(|err| NetError::Resolve {
                host: host.to_string(),
                reason: err.to_string(),
            })?
            .map(|addr| addr.ip())
            .collect();
        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| NetError::NoAddress(host.to_string()))
    }
}

/// Asks a "what is my address" service over HTTPS. One client is built up
/// front and reused for every lookup.
pub(crate) struct HttpAddressLookup {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpAddressLookup {
    pub(crate) fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NetError::Lookup(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl AddressLookup for HttpAddressLookup {
    fn lookup(&self) -> Result<String, NetError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|err| NetError::Lookup(err.to_string()))?;
        first_line(&body).ok_or(NetError::EmptyBody)
    }
}

fn first_line(body: &str) -> Option<String> {
    let line = body.lines().next()?.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(MAX_LOOKUP_BODY_CHARS).collect())
}

/// Host part of a location: text after `://` up to the first `/`, port
/// stripped. No attempt is made to parse anything else.
pub(crate) fn host_from_location(location: &str) -> Option<&str> {
    let start = match location.find("://") {
        Some(idx) => &location[idx + 3..],
        None => location,
    };
    let host = start.split('/').next().unwrap_or(start);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_taken_between_scheme_and_path() {
        assert_eq!(
            host_from_location("https://www.example.com/a/b?c=d"),
            Some("www.example.com")
        );
        assert_eq!(host_from_location("http://localhost:8080/x"), Some("localhost"));
        assert_eq!(host_from_location("example.org"), Some("example.org"));
        assert_eq!(host_from_location("https:///nohost"), None);
    }

    #[test]
    fn lookup_body_keeps_first_trimmed_line() {
        assert_eq!(first_line("203.0.113.9\r\n").as_deref(), Some("203.0.113.9"));
        assert_eq!(first_line("   \n"), None);
    }

    #[test]
    fn http_lookup_reuses_one_client_and_reports_failures() {
        let closed = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("free local port");
        let lookup = HttpAddressLookup::new(format!("http://{closed}/"), Duration::from_secs(2))
            .expect("client builds");

        for _ in 0..2 {
            assert!(matches!(lookup.lookup(), Err(NetError::Lookup(_))));
        }
    }

    #[test]
    fn system_resolver_handles_numeric_hosts() {
        let ip = SystemResolver.resolve("127.0.0.1").expect("numeric host resolves");
        assert_eq!(ip.to_string(), "127.0.0.1");
    }
}
