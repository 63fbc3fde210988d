use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "podsee";

/// Keychain account holding the Supabase service role key.
const SERVICE_KEY_ACCOUNT: &str = "supabase-service-key";

/// OS keychain storage for the moderation credentials.
pub struct CredentialStore;

impl CredentialStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, SERVICE_KEY_ACCOUNT).context("Failed to create keyring entry")
    }

    /// Store the Supabase service key in the OS keychain
    pub fn store_service_key(key: &str) -> Result<()> {
        Self::entry()?
            .set_password(key.trim())
            .context("Failed to store service key in keychain")?;
        Ok(())
    }

    /// Retrieve the Supabase service key from the OS keychain
    pub fn service_key() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve service key from keychain")
    }

    pub fn delete_service_key() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete service key from keychain")?;
        Ok(())
    }

    pub fn has_service_key() -> bool {
        Self::service_key().is_ok()
    }
}
