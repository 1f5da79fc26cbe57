// src/core/probe.rs

use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use chrono::{DateTime, Utc};
use native_tls::{Protocol, TlsConnector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use x509_parser::prelude::*;

use crate::config::{MinTlsVersion, ProbeConfig};
use crate::core::models::{CertificateInfo, ProbeOutcome};

/// Why a URL failed its TLS compatibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeFailure {
    InvalidUrl(String),
    Resolve(String),
    Connect(String),
    Timeout,
    Handshake(String),
    Connector(String),
}

impl ProbeFailure {
    /// Stable machine-readable code for logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            ProbeFailure::InvalidUrl(_) => "TLS_INVALID_URL",
            ProbeFailure::Resolve(_) => "TLS_DNS_FAILED",
            ProbeFailure::Connect(_) => "TLS_CONNECT_FAILED",
            ProbeFailure::Timeout => "TLS_TIMEOUT",
            ProbeFailure::Handshake(_) => "TLS_HANDSHAKE_FAILED",
            ProbeFailure::Connector(_) => "TLS_CONNECTOR_ERROR",
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::InvalidUrl(e) => write!(f, "Invalid URL: {}", e),
            ProbeFailure::Resolve(e) => write!(f, "DNS resolution failed: {}", e),
            ProbeFailure::Connect(e) => write!(f, "TCP connection failed: {}", e),
            ProbeFailure::Timeout => write!(f, "Connection timed out"),
            ProbeFailure::Handshake(e) => write!(f, "TLS handshake failed: {}", e),
            ProbeFailure::Connector(e) => write!(f, "TlsConnector error: {}", e),
        }
    }
}

/// A single outbound TLS compatibility check.
///
/// Probes block; callers run them on the blocking thread pool.
pub trait TlsProbe: Send + Sync {
    fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Host and port a URL's TLS support is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    /// `https` URLs keep an explicit port; everything else is checked on 443.
    pub fn from_url(url: &str) -> Result<Self, ProbeFailure> {
        let parsed = Url::parse(url).map_err(|e| ProbeFailure::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ProbeFailure::InvalidUrl("URL has no host".to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = match parsed.scheme() {
            "https" => parsed.port().unwrap_or(443),
            _ => 443,
        };
        Ok(Self { host, port })
    }
}

/// Probe backed by the platform TLS library.
#[derive(Debug, Clone)]
pub struct NativeTlsProbe {
    timeout: Duration,
    min_version: MinTlsVersion,
    verify_certificates: bool,
}

impl NativeTlsProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            min_version: config.min_tls_version,
            verify_certificates: config.verify_certificates,
        }
    }

    fn connector(&self) -> Result<TlsConnector, ProbeFailure> {
        let protocol = match self.min_version {
            MinTlsVersion::Tls10 => Protocol::Tlsv10,
            MinTlsVersion::Tls11 => Protocol::Tlsv11,
            MinTlsVersion::Tls12 => Protocol::Tlsv12,
        };
        TlsConnector::builder()
            .min_protocol_version(Some(protocol))
            .danger_accept_invalid_certs(!self.verify_certificates)
            .danger_accept_invalid_hostnames(!self.verify_certificates)
            .build()
            .map_err(|e| ProbeFailure::Connector(e.to_string()))
    }

    fn connect(&self, target: &ProbeTarget) -> Result<TcpStream, ProbeFailure> {
        let addrs: Vec<SocketAddr> = (target.host.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| ProbeFailure::Resolve(e.to_string()))?
            .collect();
        if addrs.is_empty() {
            return Err(ProbeFailure::Resolve("no addresses found".to_string()));
        }

        let mut last_error = ProbeFailure::Connect("no address attempted".to_string());
        for addr in addrs {
            debug!(%addr, "Connecting TCP stream.");
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                        .map_err(|e| ProbeFailure::Connect(e.to_string()))?;
                    return Ok(stream);
                }
                Err(e) => last_error = io_failure(e),
            }
        }
        Err(last_error)
    }

    fn handshake(&self, target: &ProbeTarget) -> Result<Option<CertificateInfo>, ProbeFailure> {
        let connector = self.connector()?;
        let stream = self.connect(target)?;

        debug!(host = %target.host, port = target.port, "Performing TLS handshake.");
        let stream = connector.connect(&target.host, stream).map_err(|e| match e {
            native_tls::HandshakeError::Failure(e) => ProbeFailure::Handshake(e.to_string()),
            native_tls::HandshakeError::WouldBlock(_) => ProbeFailure::Timeout,
        })?;

        // The handshake alone decides the verdict; certificate details are best effort.
        let certificate = match stream.peer_certificate() {
            Ok(Some(cert)) => cert.to_der().ok().and_then(|der| certificate_info(&der)),
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Could not read peer certificate.");
                None
            }
        };
        Ok(certificate)
    }
}

impl TlsProbe for NativeTlsProbe {
    fn probe(&self, url: &str) -> ProbeOutcome {
        let result = ProbeTarget::from_url(url).and_then(|target| self.handshake(&target));
        match result {
            Ok(certificate) => {
                if let Some(cert) = &certificate {
                    info!(url, subject = %cert.subject_name, days_until_expiry = cert.days_until_expiry, "TLS probe passed.");
                } else {
                    info!(url, "TLS probe passed.");
                }
                ProbeOutcome::passed(url, certificate)
            }
            Err(failure) => {
                warn!(url, code = failure.code(), reason = %failure, "TLS probe failed.");
                ProbeOutcome::failed(url, failure)
            }
        }
    }
}

fn io_failure(e: io::Error) -> ProbeFailure {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeFailure::Timeout,
        _ => ProbeFailure::Connect(e.to_string()),
    }
}

fn certificate_info(der: &[u8]) -> Option<CertificateInfo> {
    let (_, x509) = parse_x509_certificate(der).ok()?;
    let not_after = asn1_time_to_chrono_utc(&x509.validity().not_after);
    Some(CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_after,
        days_until_expiry: not_after.signed_duration_since(Utc::now()).num_days(),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_uses_explicit_https_port() {
        let t = ProbeTarget::from_url("https://api.vendor.io:8443/v1").unwrap();
        assert_eq!(t, ProbeTarget { host: "api.vendor.io".into(), port: 8443 });
    }

    #[test]
    fn plain_http_is_checked_on_443() {
        let t = ProbeTarget::from_url("http://feeds.vendor.io:8080/rss").unwrap();
        assert_eq!(t.port, 443);
        assert_eq!(t.host, "feeds.vendor.io");
    }

    #[test]
    fn ipv6_brackets_are_stripped() {
        let t = ProbeTarget::from_url("https://[2001:db8::1]/").unwrap();
        assert_eq!(t.host, "2001:db8::1");
    }

    #[test]
    fn invalid_url_fails_without_network() {
        let probe = NativeTlsProbe::new(&ProbeConfig::default());
        let outcome = probe.probe("not a url");
        assert!(!outcome.is_passing());
        match outcome.verdict {
            crate::core::models::ProbeVerdict::Failed(f) => assert_eq!(f.code(), "TLS_INVALID_URL"),
            other => panic!("unexpected verdict: {other:?}"),
        }
    }
}
