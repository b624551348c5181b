use crate::error::{Result, SessionError};
use getrandom::getrandom;
use std::collections::HashMap;
use workdesk_protocol::{ShortToken, TOKEN_LEN};

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const GENERATION_TAG_LEN: usize = 2;
const ISSUE_ATTEMPTS: usize = 8;
// Largest multiple of 62 below 256; bytes above it are resampled to keep the draw uniform.
const UNBIASED_LIMIT: u8 = 248;

/// Maps short tokens to values for one render generation.
///
/// Each token starts with a tag derived from the generation that issued it, so a token kept
/// from an earlier render never resolves against a later table, even if its random body is
/// drawn again.
#[derive(Debug, Clone)]
pub struct ShortTokenRegistry<V> {
    generation: u64,
    entries: HashMap<ShortToken, V>,
}

impl<V: Clone> Default for ShortTokenRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ShortTokenRegistry<V> {
    pub fn new() -> Self {
        Self {
            generation: random_u64_best_effort().unwrap_or(0),
            entries: HashMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every token and starts a new generation.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.entries.clear();
        log::debug!("token table reset to generation {}", self.generation);
    }

    pub fn issue(&mut self, value: V) -> Result<ShortToken> {
        let tag = generation_tag(self.generation);
        for _ in 0..ISSUE_ATTEMPTS {
            let body = random_body(TOKEN_LEN - GENERATION_TAG_LEN)?;
            let token = ShortToken::parse(&format!("{tag}{body}"))
                .map_err(|err| SessionError::Entropy(err.to_string()))?;
            if !self.entries.contains_key(&token) {
                self.entries.insert(token.clone(), value);
                return Ok(token);
            }
        }
        Err(SessionError::TokensExhausted(ISSUE_ATTEMPTS))
    }

    pub fn resolve(&self, token: &ShortToken) -> Result<V> {
        if !token.as_str().starts_with(&generation_tag(self.generation)) {
            return Err(SessionError::UnknownToken(token.to_string()));
        }
        self.entries
            .get(token)
            .cloned()
            .ok_or_else(|| SessionError::UnknownToken(token.to_string()))
    }
}

fn generation_tag(generation: u64) -> String {
    let mut rest = generation;
    let mut tag = String::with_capacity(GENERATION_TAG_LEN);
    for _ in 0..GENERATION_TAG_LEN {
        tag.push(char::from(ALPHABET[(rest % 62) as usize]));
        rest /= 62;
    }
    tag
}

fn random_body(len: usize) -> Result<String> {
    let mut body = String::with_capacity(len);
    let mut bytes = [0u8; 16];
    while body.len() < len {
        getrandom(&mut bytes).map_err(|err| SessionError::Entropy(err.to_string()))?;
        for byte in bytes {
            if byte < UNBIASED_LIMIT && body.len() < len {
                body.push(char::from(ALPHABET[usize::from(byte % 62)]));
            }
        }
    }
    Ok(body)
}

fn random_u64_best_effort() -> Option<u64> {
    let mut bytes = [0u8; 8];
    getrandom(&mut bytes).ok()?;
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let mut registry = ShortTokenRegistry::new();
        let a = registry.issue("Driver/reports".to_string()).unwrap();
        let b = registry.issue("Shared/Personal".to_string()).unwrap();

        assert_eq!(a.as_str().len(), TOKEN_LEN);
        assert_ne!(a, b);
        assert_eq!(registry.resolve(&a).unwrap(), "Driver/reports");
        assert_eq!(registry.resolve(&b).unwrap(), "Shared/Personal");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reset_invalidates_previous_generation() {
        let mut registry = ShortTokenRegistry::new();
        let stale = registry.issue(1u64).unwrap();
        registry.reset();
        let fresh = registry.issue(2u64).unwrap();

        assert_eq!(
            registry.resolve(&stale),
            Err(SessionError::UnknownToken(stale.to_string()))
        );
        assert_eq!(registry.resolve(&fresh).unwrap(), 2);
    }

    #[test]
    fn test_stale_token_with_reused_body_stays_invalid() {
        let mut registry = ShortTokenRegistry::new();
        let stale = registry.issue("old").unwrap();
        registry.reset();

        // Forge a current-generation entry that reuses the stale random body.
        let body = &stale.as_str()[GENERATION_TAG_LEN..];
        let current = ShortToken::parse(&format!(
            "{}{body}",
            generation_tag(registry.generation())
        ))
        .unwrap();
        registry.entries.insert(current.clone(), "new");

        assert!(registry.resolve(&stale).is_err());
        assert_eq!(registry.resolve(&current).unwrap(), "new");
    }

    #[test]
    fn test_generation_tags_differ_between_neighbours() {
        assert_ne!(generation_tag(7), generation_tag(8));
        assert_ne!(generation_tag(u64::MAX), generation_tag(0));
        assert_eq!(generation_tag(0).len(), GENERATION_TAG_LEN);
    }
}
