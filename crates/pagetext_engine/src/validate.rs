use std::net::IpAddr;

use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlRejection {
    #[error("empty url")]
    Empty,
    #[error("malformed url: {0}")]
    Malformed(String),
    #[error("unsupported scheme {0}")]
    UnsupportedScheme(String),
    #[error("url has no host")]
    MissingHost,
    #[error("host {0} is local or private")]
    PrivateHost(String),
    #[error("port {0} is not allowed")]
    DisallowedPort(u16),
}

/// Which URLs the dispatcher accepts.
///
/// The permissive policy only requires a well-formed `http`/`https` URL with a
/// host. The strict policy also refuses local and private hosts and explicit
/// ports other than 80 and 443.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlPolicy {
    pub block_private_hosts: bool,
    pub standard_ports_only: bool,
}

impl UrlPolicy {
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            block_private_hosts: true,
            standard_ports_only: true,
        }
    }

    pub fn check(&self, raw: &str) -> Result<Url, UrlRejection> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UrlRejection::Empty);
        }
        let url = Url::parse(trimmed).map_err(|err| UrlRejection::Malformed(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(UrlRejection::UnsupportedScheme(other.to_string())),
        }
        let host = url.host().ok_or(UrlRejection::MissingHost)?;

        if self.block_private_hosts && is_private_host(&host) {
            return Err(UrlRejection::PrivateHost(host.to_string()));
        }
        if self.standard_ports_only {
            // `Url::port` is None when the port equals the scheme default.
            if let Some(port) = url.port() {
                if port != 80 && port != 443 {
                    return Err(UrlRejection::DisallowedPort(port));
                }
            }
        }
        Ok(url)
    }
}

/// True for well-formed `http`/`https` URLs with a host.
pub fn validate_url(raw: &str) -> bool {
    UrlPolicy::permissive().check(raw).is_ok()
}

fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_private_ip(IpAddr::V4(*ip)),
        Host::Ipv6(ip) => is_private_ip(IpAddr::V6(*ip)),
    }
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("http://example.com"));
        assert!(validate_url("https://example.com/path?q=1"));
        assert!(validate_url("  https://example.com  "));
    }

    #[test]
    fn rejects_non_http_inputs() {
        assert!(!validate_url(""));
        assert!(!validate_url("example.com"));
        assert!(!validate_url("ftp://example.com"));
        assert!(!validate_url("javascript:alert(1)"));
        assert!(!validate_url("file:///etc/passwd"));
    }

    #[test]
    fn rejection_reasons_are_specific() {
        let policy = UrlPolicy::permissive();
        assert_eq!(policy.check("   "), Err(UrlRejection::Empty));
        assert_eq!(
            policy.check("ftp://example.com"),
            Err(UrlRejection::UnsupportedScheme("ftp".into()))
        );
        assert!(matches!(
            policy.check("not a url"),
            Err(UrlRejection::Malformed(_))
        ));
    }

    #[test]
    fn strict_policy_blocks_local_targets() {
        let policy = UrlPolicy::strict();
        assert!(matches!(
            policy.check("http://localhost"),
            Err(UrlRejection::PrivateHost(_))
        ));
        assert!(matches!(
            policy.check("http://192.168.1.1"),
            Err(UrlRejection::PrivateHost(_))
        ));
        assert!(matches!(
            policy.check("http://[::1]/"),
            Err(UrlRejection::PrivateHost(_))
        ));
        assert_eq!(
            policy.check("http://example.com:8080"),
            Err(UrlRejection::DisallowedPort(8080))
        );
        assert!(policy.check("https://example.com:443/x").is_ok());
        assert!(policy.check("http://example.com").is_ok());
    }

    #[test]
    fn permissive_policy_allows_local_targets() {
        assert!(validate_url("http://localhost:8080"));
        assert!(validate_url("http://127.0.0.1/"));
    }
}
