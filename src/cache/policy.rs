//! Cache policies and per-key policy resolution.

use std::fmt;
use std::time::Duration;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// Expiration settings for cached results, optionally scoped to keys matching
/// a pattern.
///
/// At most one of sliding, absolute or infinite expiration may be set. A
/// policy with none set behaves as infinite.
#[derive(Clone, Default)]
pub struct CachePolicy {
    key_pattern: Option<Regex>,
    /// Lifetime that restarts on every read.
    pub sliding_expiration: Option<Duration>,
    /// Fixed lifetime counted from the write.
    pub absolute_expiration: Option<Duration>,
    /// Never expire.
    pub infinite_expiration: bool,
}

impl CachePolicy {
    /// Policy with no expiration set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with a sliding window.
    pub fn sliding(window: Duration) -> Self {
        Self::new().with_sliding_expiration(window)
    }

    /// Policy with a fixed lifetime from write time.
    pub fn absolute(lifetime: Duration) -> Self {
        Self::new().with_absolute_expiration(lifetime)
    }

    /// Policy that never expires.
    pub fn infinite() -> Self {
        Self::new().with_infinite_expiration()
    }

    /// Set the sliding window.
    pub fn with_sliding_expiration(mut self, window: Duration) -> Self {
        self.sliding_expiration = Some(window);
        self
    }

    /// Set the absolute lifetime.
    pub fn with_absolute_expiration(mut self, lifetime: Duration) -> Self {
        self.absolute_expiration = Some(lifetime);
        self
    }

    /// Mark as never expiring.
    pub fn with_infinite_expiration(mut self) -> Self {
        self.infinite_expiration = true;
        self
    }

    /// Scope the policy to keys matching `pattern`.
    pub fn with_key_pattern(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.key_pattern = Some(regex);
        Ok(self)
    }

    /// Key pattern, if the policy is scoped.
    pub fn key_pattern(&self) -> Option<&Regex> {
        self.key_pattern.as_ref()
    }

    /// Whether this policy applies to `key`. Unscoped policies never match.
    pub fn matches(&self, key: &str) -> bool {
        self.key_pattern
            .as_ref()
            .map(|re| re.is_match(key))
            .unwrap_or(false)
    }

    /// Reject policies that set more than one expiration kind.
    pub fn validate(&self) -> Result<()> {
        let mut set = Vec::new();
        if self.absolute_expiration.is_some() {
            set.push("AbsoluteExpiration");
        }
        if self.sliding_expiration.is_some() {
            set.push("SlidingExpiration");
        }
        if self.infinite_expiration {
            set.push("InfiniteExpiration");
        }
        if set.len() > 1 {
            return Err(Error::invalid_policy(format!(
                "{} cannot be combined; set at most one expiration",
                set.join(" and ")
            )));
        }
        Ok(())
    }

    /// Expiration kind computed from the settings.
    pub fn expiration(&self) -> Expiration {
        if let Some(window) = self.sliding_expiration {
            Expiration::Sliding(window)
        } else if let Some(lifetime) = self.absolute_expiration {
            Expiration::Absolute(lifetime)
        } else {
            Expiration::Never
        }
    }
}

impl fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePolicy")
            .field("key_pattern", &self.key_pattern.as_ref().map(Regex::as_str))
            .field("sliding_expiration", &self.sliding_expiration)
            .field("absolute_expiration", &self.absolute_expiration)
            .field("infinite_expiration", &self.infinite_expiration)
            .finish()
    }
}

/// Resolved expiration semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Never expires.
    Never,
    /// Expires `Duration` after the write.
    Absolute(Duration),
    /// Expires `Duration` after the last read or write.
    Sliding(Duration),
}

/// Chooses the policy for each cache key.
///
/// Order: first matching pattern rule in registration order, then the global
/// policy, then the built-in infinite default.
#[derive(Debug, Clone)]
pub struct CachePolicyEngine {
    default_policy: CachePolicy,
    global: Option<CachePolicy>,
    rules: Vec<CachePolicy>,
}

impl CachePolicyEngine {
    /// Engine with only the default policy.
    pub fn new() -> Self {
        Self {
            default_policy: CachePolicy::infinite(),
            global: None,
            rules: Vec::new(),
        }
    }

    /// Register a policy. Scoped policies become rules; an unscoped policy
    /// replaces the global policy.
    pub fn register(&mut self, policy: CachePolicy) -> Result<()> {
        policy.validate()?;
        match policy.key_pattern() {
            Some(pattern) => {
                debug!("cache policy rule registered for /{}/", pattern.as_str());
                self.rules.push(policy);
            }
            None => {
                debug!("global cache policy registered: {:?}", policy.expiration());
                self.global = Some(policy);
            }
        }
        Ok(())
    }

    /// Set the global policy, ignoring any key pattern on it.
    pub fn set_global(&mut self, mut policy: CachePolicy) -> Result<()> {
        policy.validate()?;
        policy.key_pattern = None;
        self.global = Some(policy);
        Ok(())
    }

    /// Remove the global policy and every rule.
    pub fn clear(&mut self) {
        self.global = None;
        self.rules.clear();
    }

    /// Policy that applies to `key`.
    pub fn resolve(&self, key: &str) -> &CachePolicy {
        self.rules
            .iter()
            .find(|rule| rule.matches(key))
            .or(self.global.as_ref())
            .unwrap_or(&self.default_policy)
    }

    /// Registered rules in order.
    pub fn rules(&self) -> &[CachePolicy] {
        &self.rules
    }
}

impl Default for CachePolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}
