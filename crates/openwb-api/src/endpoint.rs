// Device endpoint addressing
//
// Users configure either a bare host (`192.168.1.168`) or a full URL
// (`https://wallbox.local/`). Both collapse into one normalized base URL
// that always carries a scheme and never ends in `/`.

use std::fmt;

use url::Url;

use crate::error::Error;

/// Path of the status query, appended to the normalized base address.
pub const API_PATH: &str = "/openWB/web/api.php?get=all";

/// One polled openWB device: normalized base address plus display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    base: String,
    host: String,
    label: Option<String>,
}

impl DeviceEndpoint {
    /// Normalize `host` (bare host or URL) into an endpoint.
    ///
    /// A bare host gets `http://` prepended; a trailing `/` is stripped
    /// either way. Empty input and inputs without a host are rejected.
    pub fn parse(host: &str, label: Option<&str>) -> Result<Self, Error> {
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidHost {
                host: host.to_owned(),
                reason: "host is empty".into(),
            });
        }

        let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.trim_end_matches('/').to_owned()
        } else {
            format!("http://{}", trimmed.trim_end_matches('/'))
        };

        let parsed = Url::parse(&base)?;
        let host_str = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidHost {
                host: host.to_owned(),
                reason: "no host in address".into(),
            })?
            .to_owned();

        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from);

        Ok(Self {
            base,
            host: host_str,
            label,
        })
    }

    /// Normalized base address, e.g. `http://192.168.1.168`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Host portion of the base address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Full status query URL.
    pub fn status_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{API_PATH}", self.base))?)
    }

    /// Name used when neither a label nor the device's own `systemName`
    /// is available.
    pub fn fallback_name(&self) -> String {
        format!("openWB {}", self.host)
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label} ({})", self.base),
            None => f.write_str(&self.base),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        let ep = DeviceEndpoint::parse("192.168.1.168", None).unwrap();
        assert_eq!(ep.base(), "http://192.168.1.168");
        assert_eq!(
            ep.status_url().unwrap().as_str(),
            "http://192.168.1.168/openWB/web/api.php?get=all"
        );
    }

    #[test]
    fn full_url_keeps_scheme_and_drops_trailing_slash() {
        let ep = DeviceEndpoint::parse("https://wallbox.local/", Some("Garage")).unwrap();
        assert_eq!(ep.base(), "https://wallbox.local");
        assert_eq!(ep.host(), "wallbox.local");
        assert_eq!(ep.label(), Some("Garage"));
        assert_eq!(
            ep.status_url().unwrap().as_str(),
            "https://wallbox.local/openWB/web/api.php?get=all"
        );
    }

    #[test]
    fn host_with_port_and_whitespace() {
        let ep = DeviceEndpoint::parse("  10.0.0.5:8080/ ", Some("  ")).unwrap();
        assert_eq!(ep.base(), "http://10.0.0.5:8080");
        assert_eq!(ep.label(), None);
        assert_eq!(ep.fallback_name(), "openWB 10.0.0.5");
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            DeviceEndpoint::parse("   ", None),
            Err(Error::InvalidHost { .. })
        ));
        assert!(DeviceEndpoint::parse("http://", None).is_err());
    }
}
