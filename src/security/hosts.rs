//! Host allow-lists.
//!
//! # Responsibilities
//! - Admit or forbid a request by its exact host value
//! - Answer whether a hostname may act as an asset referrer
//! - Match bare hostnames for the plain-HTTP redirect listener
//!
//! # Design Decisions
//! - Exact, case-sensitive lookups; absent or disabled means forbidden
//! - Fail closed: a missing or non-UTF-8 host is never admitted
//! - Built once per snapshot and never mutated

use std::collections::{HashMap, HashSet};

use axum::http::HeaderValue;

use crate::config::HostsConfig;

/// Host value → enabled flag.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    entries: HashMap<String, bool>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(host, on)| (host.into(), on)).collect(),
        }
    }

    /// True only for present, enabled entries.
    pub fn admits(&self, host: &str) -> bool {
        self.entries.get(host).copied().unwrap_or(false)
    }

    /// True if any enabled entry has this hostname, ignoring the entry's port.
    pub fn admits_hostname(&self, hostname: &str) -> bool {
        self.enabled().any(|host| strip_port(host) == hostname)
    }

    /// Enabled host values.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(host, _)| host.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hostnames accepted in a `Referer`: the enabled allow-list plus the
/// referrer-specific list.
#[derive(Debug, Clone, Default)]
pub struct ReferrerAllowList {
    hosts: HashSet<String>,
}

impl ReferrerAllowList {
    pub fn union<I, S>(allowed: &AllowList, referrers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut hosts: HashSet<String> = allowed.enabled().map(str::to_string).collect();
        hosts.extend(referrers.into_iter().map(Into::into));
        Self { hosts }
    }

    /// Match a referrer by hostname, or by `hostname:port` when the referring
    /// URL carried an explicit port.
    pub fn permits(&self, hostname: &str, port: Option<u16>) -> bool {
        if self.hosts.contains(hostname) {
            return true;
        }
        port.is_some_and(|port| self.hosts.contains(&format!("{hostname}:{port}")))
    }
}

/// Outcome of the admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<'a> {
    Admitted(&'a str),
    Forbidden,
}

/// Host policy consulted by the router.
#[derive(Debug, Clone, Default)]
pub struct HostPolicy {
    allowed: AllowList,
    referrers: ReferrerAllowList,
}

impl HostPolicy {
    pub fn new(allowed: AllowList, referrers: ReferrerAllowList) -> Self {
        Self { allowed, referrers }
    }

    pub fn from_config(config: &HostsConfig) -> Self {
        let allowed = AllowList::new(config.allowed.iter().map(|(h, on)| (h.as_str(), *on)));
        let referrers = ReferrerAllowList::union(&allowed, config.referrers.iter().map(String::as_str));
        Self::new(allowed, referrers)
    }

    /// Admission decision for a raw host value.
    pub fn admit<'a>(&self, host: Option<&'a str>) -> Admission<'a> {
        match host {
            Some(host) if self.allowed.admits(host) => Admission::Admitted(host),
            _ => Admission::Forbidden,
        }
    }

    pub fn allowed(&self) -> &AllowList {
        &self.allowed
    }

    pub fn referrers(&self) -> &ReferrerAllowList {
        &self.referrers
    }
}

/// Host header value as text, if it is visible ASCII.
pub fn host_str(value: &HeaderValue) -> Option<&str> {
    value.to_str().ok().filter(|h| !h.is_empty())
}

/// `example.com:8443` → `example.com`; bracketed IPv6 literals keep brackets.
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
