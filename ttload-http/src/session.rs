//! Login state of one simulated user

use std::time::{Duration, Instant};

/// User id and bearer token handed out by the login endpoint
#[derive(Debug, Clone, Default)]
pub struct Session {
    user_id: Option<String>,
    token: Option<String>,
    expires_at: Option<Instant>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful login made at `now`
    pub fn establish(&mut self, user_id: String, token: String, ttl: Duration, now: Instant) {
        self.user_id = Some(user_id);
        self.token = Some(token);
        self.expires_at = Some(now + ttl);
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Whether a new login is due at `now`.
    ///
    /// True before the first login and from the expiry instant on.
    pub fn needs_login_at(&self, now: Instant) -> bool {
        match (&self.token, self.expires_at) {
            (Some(_), Some(expires_at)) => now >= expires_at,
            _ => true,
        }
    }

    pub fn needs_login(&self) -> bool {
        self.needs_login_at(Instant::now())
    }
}
