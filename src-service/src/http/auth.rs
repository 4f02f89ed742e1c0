//! Session token authentication.
//!
//! Login exchanges the configured credentials for a random bearer token.
//! Tokens live in process memory only; restarting the service signs every
//! client out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// How long an issued session token stays valid.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// In-memory store of issued session tokens and their deadlines.
pub struct SessionTokens {
    ttl: Duration,
    tokens: Mutex<HashMap<String, Instant>>,
}

impl SessionTokens {
    pub fn new() -> Self {
        Self::with_ttl(TOKEN_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh token.
    pub async fn issue(&self) -> String {
        let token = generate_token();
        let mut tokens = self.tokens.lock().await;
        tokens.insert(token.clone(), Instant::now() + self.ttl);
        token
    }

    /// Check a presented token: known and unexpired.
    ///
    /// Expired tokens are pruned on the way through, so the store never
    /// outgrows the set of live sessions.
    pub async fn validate(&self, presented: &str) -> bool {
        let now = Instant::now();
        let mut tokens = self.tokens.lock().await;
        tokens.retain(|_, deadline| *deadline > now);
        tokens
            .keys()
            .any(|stored| constant_time_eq(stored, presented))
    }
}

impl Default for SessionTokens {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a login attempt against the configured credentials.
///
/// With no password configured, login is disabled and every attempt fails.
pub fn verify_credentials(
    expected_user: &str,
    expected_pass: Option<&str>,
    username: &str,
    password: &str,
) -> bool {
    match expected_pass {
        Some(expected_pass) => {
            constant_time_eq(username, expected_user) && constant_time_eq(password, expected_pass)
        }
        None => false,
    }
}

/// Generate a random 256-bit session token as a hex string.
fn generate_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
