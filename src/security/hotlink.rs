//! Hotlink protection for static assets.
//!
//! An asset is served only when the `Referer` is an `https` URL whose host
//! is in the referrer allow-list. Anything unparsable is a rejection for
//! that request; it is never an error for the process.

use axum::http::HeaderValue;
use url::Url;

use crate::security::hosts::ReferrerAllowList;

/// Why a referrer was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Missing,
    Unparsable,
    InsecureScheme,
    ForeignHost,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Missing => "missing",
            RejectReason::Unparsable => "unparsable",
            RejectReason::InsecureScheme => "insecure_scheme",
            RejectReason::ForeignHost => "foreign_host",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefererVerdict {
    Permitted,
    Rejected(RejectReason),
}

/// Decide whether a `Referer` header may load an asset.
pub fn check_referer(
    referrers: &ReferrerAllowList,
    referer: Option<&HeaderValue>,
    allow_missing: bool,
) -> RefererVerdict {
    let Some(raw) = referer else {
        return if allow_missing {
            RefererVerdict::Permitted
        } else {
            RefererVerdict::Rejected(RejectReason::Missing)
        };
    };

    let url = match raw.to_str().ok().and_then(|r| Url::parse(r).ok()) {
        Some(url) => url,
        None => return RefererVerdict::Rejected(RejectReason::Unparsable),
    };

    if url.scheme() != "https" {
        return RefererVerdict::Rejected(RejectReason::InsecureScheme);
    }

    match url.host_str() {
        Some(host) if referrers.permits(host, url.port()) => RefererVerdict::Permitted,
        _ => RefererVerdict::Rejected(RejectReason::ForeignHost),
    }
}
