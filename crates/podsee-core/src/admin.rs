//! Moderation panel access.
//!
//! The panel is guarded by a shared secret from the environment. Unlocking
//! it only gates the UI; the moderation calls themselves still need the
//! Supabase service key (see `CommentClient::has_admin_access`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminAuthError {
    #[error("Admin secret not configured")]
    NotConfigured,

    #[error("Incorrect password")]
    Incorrect,
}

#[derive(Debug, Clone, Default)]
pub struct AdminGate {
    secret: Option<String>,
    unlocked: bool,
}

impl AdminGate {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            unlocked: false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Check a password attempt. A wrong attempt relocks the gate.
    pub fn unlock(&mut self, attempt: &str) -> Result<(), AdminAuthError> {
        let secret = self.secret.as_deref().ok_or(AdminAuthError::NotConfigured)?;
        if attempt == secret {
            self.unlocked = true;
            Ok(())
        } else {
            self.unlocked = false;
            Err(AdminAuthError::Incorrect)
        }
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_gate() {
        let mut gate = AdminGate::new(None);
        assert!(!gate.is_configured());
        assert_eq!(gate.unlock("anything"), Err(AdminAuthError::NotConfigured));
        assert_eq!(AdminAuthError::NotConfigured.to_string(), "Admin secret not configured");

        let mut gate = AdminGate::new(Some(String::new()));
        assert_eq!(gate.unlock(""), Err(AdminAuthError::NotConfigured));
    }

    #[test]
    fn test_unlock_and_lock() {
        let mut gate = AdminGate::new(Some("s3cret".to_string()));
        assert_eq!(gate.unlock("wrong"), Err(AdminAuthError::Incorrect));
        assert!(!gate.is_unlocked());

        gate.unlock("s3cret").expect("correct password");
        assert!(gate.is_unlocked());

        gate.lock();
        assert!(!gate.is_unlocked());
    }
}
