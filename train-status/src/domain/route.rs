//! Tracked routes and cache keys.

use std::fmt;

use super::Crs;

/// Identifier of a configured route, stable across poll cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed origin→destination station pair tracked by the poller.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: RouteId,
    pub origin: Crs,
    pub dest: Crs,
}

impl Route {
    pub fn new(id: impl Into<String>, origin: Crs, dest: Crs) -> Self {
        Self {
            id: RouteId::new(id),
            origin,
            dest,
        }
    }

    /// Display title, e.g. `"SAC → ZFD"`.
    pub fn title(&self) -> String {
        format!("{} → {}", self.origin, self.dest)
    }
}

/// Key under which a route's latest state is cached.
///
/// The fast-only flag is part of the key: toggling the filter switches
/// the key namespace, and the cache is cleared on that transition so the
/// old namespace cannot serve stale entries.
pub type CacheKey = (RouteId, bool);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_uses_arrow() {
        let route = Route::new(
            "route_a",
            Crs::parse("SAC").unwrap(),
            Crs::parse("ZFD").unwrap(),
        );
        assert_eq!(route.title(), "SAC → ZFD");
        assert_eq!(route.id.as_str(), "route_a");
    }
}
