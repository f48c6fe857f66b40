// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::fmt;

/// A domain plus the ordered hostnames mapped to an app on that domain.
///
/// Host order is the order reported by the platform and is preserved when the
/// route is mapped or unmapped, one host at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub domain: String,
    pub hosts: Vec<String>,
}

impl Route {
    pub fn new(domain: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            domain: domain.into(),
            hosts,
        }
    }

    /// A route on `domain` with no hosts.
    pub fn empty(domain: impl Into<String>) -> Self {
        Self::new(domain, Vec::new())
    }

    pub fn has_hosts(&self) -> bool {
        !self.hosts.is_empty()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hosts.is_empty() {
            return write!(f, "{} (no hosts)", self.domain);
        }
        let urls: Vec<String> = self
            .hosts
            .iter()
            .map(|host| format!("{}.{}", host, self.domain))
            .collect();
        f.write_str(&urls.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_route_has_no_hosts() {
        let route = Route::empty("apps.example.com");
        assert!(!route.has_hosts());
        assert_eq!(route.host_count(), 0);
        assert_eq!(route.to_string(), "apps.example.com (no hosts)");
    }

    #[test]
    fn test_display_keeps_host_order() {
        let route = Route::new(
            "apps.example.com",
            vec!["web".to_string(), "web-copy".to_string()],
        );
        assert_eq!(route.to_string(), "web.apps.example.com, web-copy.apps.example.com");
    }

    #[test]
    fn test_default_route_is_blank() {
        let route = Route::default();
        assert!(route.domain.is_empty());
        assert!(!route.has_hosts());
    }
}
