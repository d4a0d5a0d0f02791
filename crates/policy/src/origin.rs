//! Origin admission and the CORS origin to advertise.

use crate::{Error, Result};
use tracing::debug;
use url::{Host, Url};

/// Advertised when no origin was configured and the caller sent none.
pub const FALLBACK_ALLOW_ORIGIN: &str = "http://localhost";

/// Which `Origin` header values are admitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OriginPolicy {
    /// No allow-list configured: non-browser callers and loopback pages.
    #[default]
    LoopbackOnly,
    /// Only this exact origin (`scheme://host[:port]`).
    Exact(String),
}

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl OriginPolicy {
    /// Build a policy from the optional configured origin.
    pub fn from_config(allowed_origin: Option<&str>) -> Result<Self> {
        match allowed_origin {
            None => Ok(Self::LoopbackOnly),
            Some(origin) => Self::exact(origin),
        }
    }

    /// Admit only `origin`, which must already be in serialized origin form.
    pub fn exact(origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let url = Url::parse(&origin).map_err(|e| Error::InvalidOrigin {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;

        // Browsers send e.g. "https://app.example:8443" with no path or
        // trailing slash; anything else could never match.
        let serialized = url.origin().ascii_serialization();
        if serialized != origin {
            return Err(Error::InvalidOrigin {
                origin,
                reason: format!("expected scheme://host[:port], e.g. {serialized:?}"),
            });
        }

        Ok(Self::Exact(origin))
    }

    /// Check the request's `Origin` header (`None` when absent).
    pub fn check(&self, origin: Option<&str>) -> Decision {
        let decision = match (self, origin) {
            (Self::Exact(allowed), Some(origin)) if origin == allowed => Decision::Allow,
            (Self::Exact(_), Some(origin)) => Decision::Deny {
                reason: format!("origin {origin} is not allowed"),
            },
            (Self::Exact(_), None) => Decision::Deny {
                reason: "missing Origin header".to_string(),
            },
            (Self::LoopbackOnly, None) => Decision::Allow,
            (Self::LoopbackOnly, Some(origin)) if is_loopback_origin(origin) => Decision::Allow,
            (Self::LoopbackOnly, Some(origin)) => Decision::Deny {
                reason: format!("origin {origin} is not a loopback origin"),
            },
        };

        debug!(?origin, allowed = decision.is_allowed(), "Origin check");
        decision
    }

    /// Value for `Access-Control-Allow-Origin` on an admitted request.
    pub fn allow_origin_value(&self, origin: Option<&str>) -> String {
        match (self, origin) {
            (Self::Exact(allowed), _) => allowed.clone(),
            (Self::LoopbackOnly, Some(origin)) => origin.to_string(),
            (Self::LoopbackOnly, None) => FALLBACK_ALLOW_ORIGIN.to_string(),
        }
    }
}

fn is_loopback_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };

    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
