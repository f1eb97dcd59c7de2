//! Device exclusion by name prefix.

use super::Link;

/// Excludes devices whose name starts with a configured prefix.
///
/// Matching is case sensitive. An empty prefix disables the filter rather
/// than matching every device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixFilter {
    prefix: Option<String>,
}

impl PrefixFilter {
    pub fn new(prefix: &str) -> Self {
        if prefix.is_empty() {
            Self::disabled()
        } else {
            Self {
                prefix: Some(prefix.to_string()),
            }
        }
    }

    pub fn disabled() -> Self {
        Self { prefix: None }
    }

    pub fn from_option(prefix: Option<&str>) -> Self {
        prefix.map(Self::new).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.prefix.is_some()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn excludes(&self, device: &str) -> bool {
        match &self.prefix {
            Some(prefix) => device.starts_with(prefix.as_str()),
            None => false,
        }
    }

    /// A link is excluded when either end is
    pub fn excludes_link(&self, link: &Link) -> bool {
        self.excludes(&link.local.device) || self.excludes(&link.remote.device)
    }
}
