//! Exchange token cache.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Tokens expiring within this margin are treated as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// A decrypted exchange token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Exchange tokens by technical user (login and tax number).
///
/// Owned by a client; wrap in an `Arc` to share between clients of the same user.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: Mutex<HashMap<(String, String), TokenInfo>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that stays valid beyond the safety margin, if cached.
    pub fn get(&self, login: &str, tax_number: &str) -> Option<TokenInfo> {
        self.get_at(login, tax_number, Utc::now())
    }

    pub fn get_at(&self, login: &str, tax_number: &str, now: DateTime<Utc>) -> Option<TokenInfo> {
        let tokens = self.tokens.lock().ok()?;
        tokens
            .get(&key(login, tax_number))
            .filter(|t| t.is_valid_at(now))
            .cloned()
    }

    pub fn insert(&self, login: &str, tax_number: &str, token: TokenInfo) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(key(login, tax_number), token);
        }
    }

    pub fn invalidate(&self, login: &str, tax_number: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(&key(login, tax_number));
        }
    }
}

fn key(login: &str, tax_number: &str) -> (String, String) {
    (login.to_string(), tax_number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn token(expires_in: i64) -> TokenInfo {
        TokenInfo {
            token: "tok".into(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn get_returns_fresh_token() {
        let cache = TokenCache::new();
        cache.insert("user", "12345678", token(300));
        assert_eq!(cache.get("user", "12345678").map(|t| t.token), Some("tok".into()));
        assert!(cache.get("user", "87654321").is_none());
        assert!(cache.get("other", "12345678").is_none());
    }

    #[test]
    fn token_near_expiry_is_ignored() {
        let cache = TokenCache::new();
        cache.insert("user", "12345678", token(EXPIRY_MARGIN_SECS - 5));
        assert!(cache.get("user", "12345678").is_none());
    }

    #[test]
    fn invalidate_removes() {
        let cache = TokenCache::new();
        cache.insert("user", "12345678", token(300));
        cache.invalidate("user", "12345678");
        assert!(cache.get("user", "12345678").is_none());
    }

    #[test]
    fn shared_between_threads() {
        let cache = Arc::new(TokenCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.insert(&format!("user{i}"), "12345678", token(300)))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            assert!(cache.get(&format!("user{i}"), "12345678").is_some());
        }
    }
}
