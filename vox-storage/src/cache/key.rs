//! Cache keys scoped to an agent and, optionally, a campaign.
//!
//! A key is `"{agent_id}"` or `"{agent_id}:{campaign_id}"`. Agent ids may not
//! contain [`CacheKey::SEPARATOR`], which keeps a campaign-less key from ever
//! aliasing a campaign-qualified one and makes the agent part of any key
//! recoverable by splitting at the first separator.

use std::fmt;
use vox_core::ValidationError;

/// Identifier of a cache entry.
///
/// The inner string is private: keys can only be built through
/// [`CacheKey::new`], so every key in the store is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    inner: String,
}

impl CacheKey {
    /// Separator between the agent and campaign parts.
    pub const SEPARATOR: char = ':';

    /// Build a key from an agent id and an optional campaign id.
    ///
    /// Ids are used verbatim. An empty campaign id counts as absent; any
    /// other campaign, whitespace included, is part of the key.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the agent id is blank, has leading or
    /// trailing whitespace, or contains the separator.
    pub fn new(agent_id: &str, campaign_id: Option<&str>) -> Result<Self, ValidationError> {
        if agent_id.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "agent_id".to_string(),
            });
        }
        if agent_id.trim() != agent_id {
            return Err(ValidationError::InvalidValue {
                field: "agent_id".to_string(),
                reason: "must not have leading or trailing whitespace".to_string(),
            });
        }
        if agent_id.contains(Self::SEPARATOR) {
            return Err(ValidationError::InvalidValue {
                field: "agent_id".to_string(),
                reason: format!("must not contain '{}'", Self::SEPARATOR),
            });
        }

        let inner = match campaign_id.filter(|c| !c.is_empty()) {
            Some(campaign) => format!("{agent_id}{}{campaign}", Self::SEPARATOR),
            None => agent_id.to_string(),
        };
        Ok(Self { inner })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// The agent part of the key.
    pub fn agent_id(&self) -> &str {
        match self.inner.split_once(Self::SEPARATOR) {
            Some((agent, _)) => agent,
            None => &self.inner,
        }
    }

    /// The campaign part of the key, if any.
    pub fn campaign_id(&self) -> Option<&str> {
        self.inner
            .split_once(Self::SEPARATOR)
            .map(|(_, campaign)| campaign)
    }

    /// Whether this key belongs to `agent_id`, with or without a campaign.
    ///
    /// Unlike a raw prefix match, `agent-1` does not match `agent-10`.
    pub fn belongs_to(&self, agent_id: &str) -> bool {
        self.agent_id() == agent_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_and_campaign_keys() {
        let bare = CacheKey::new("agent-1", None).unwrap();
        assert_eq!(bare.as_str(), "agent-1");
        assert_eq!(bare.agent_id(), "agent-1");
        assert_eq!(bare.campaign_id(), None);

        let scoped = CacheKey::new("agent-1", Some("spring")).unwrap();
        assert_eq!(scoped.to_string(), "agent-1:spring");
        assert_eq!(scoped.agent_id(), "agent-1");
        assert_eq!(scoped.campaign_id(), Some("spring"));
    }

    #[test]
    fn test_empty_campaign_is_absent() {
        let a = CacheKey::new("agent-1", Some("")).unwrap();
        let c = CacheKey::new("agent-1", None).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_campaign_whitespace_is_significant() {
        let plain = CacheKey::new("agent-1", Some("x")).unwrap();
        let padded = CacheKey::new("agent-1", Some(" x")).unwrap();
        assert_ne!(plain, padded);
        assert_eq!(padded.campaign_id(), Some(" x"));

        let blank = CacheKey::new("agent-1", Some("   ")).unwrap();
        assert_ne!(blank, CacheKey::new("agent-1", None).unwrap());
        assert_eq!(blank.campaign_id(), Some("   "));
    }

    #[test]
    fn test_rejects_padded_agent() {
        for agent in [" agent-1", "agent-1 ", "\tagent-1"] {
            assert!(matches!(
                CacheKey::new(agent, None),
                Err(ValidationError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_blank_agent() {
        assert!(matches!(
            CacheKey::new("  ", None),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_rejects_separator_in_agent() {
        assert!(matches!(
            CacheKey::new("a:b", None),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_campaign_may_contain_separator() {
        let key = CacheKey::new("agent", Some("q3:emea")).unwrap();
        assert_eq!(key.agent_id(), "agent");
        assert_eq!(key.campaign_id(), Some("q3:emea"));
    }

    #[test]
    fn test_belongs_to_is_exact_on_agent() {
        let key = CacheKey::new("agent-10", Some("x")).unwrap();
        assert!(key.belongs_to("agent-10"));
        assert!(!key.belongs_to("agent-1"));
        assert!(!key.belongs_to(" agent-10"));
    }
}
