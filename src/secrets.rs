use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::debug;
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::settings::Account;

const KEY_FILE: &str = ".courrier.key";

/// Per-account credential cache. An account whose configuration carries no
/// inline password gets its secret from an AES-256-GCM-encrypted file next
/// to the key, prompting once and caching on the first run.
pub struct CredentialCache {
    dir: PathBuf,
}

impl CredentialCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CredentialCache { dir: dir.into() }
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    fn secret_path(&self, account: &str) -> PathBuf {
        self.dir.join(format!(".courrier.{}.cred", account))
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        let key_path = self.key_path();
        let key_bytes = if key_path.exists() {
            fs::read(&key_path)?
        } else {
            // Generate a new key on first use
            let mut key_bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut key_bytes);
            fs::write(&key_path, key_bytes)?;
            key_bytes.to_vec()
        };
        Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|err| Error::Config(format!("invalid encryption key: {}", err)))
    }

    pub fn encrypt(&self, secret: &str) -> Result<String> {
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, secret.as_bytes())
            .map_err(|err| Error::Config(format!("cannot encrypt secret: {}", err)))?;

        let mut combined = Vec::new();
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(&combined))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String> {
        let cipher = self.cipher()?;
        let combined = BASE64
            .decode(encrypted.trim())
            .map_err(|err| Error::Config(format!("corrupt credential cache: {}", err)))?;
        if combined.len() < 12 {
            return Err(Error::Config("corrupt credential cache: too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|err| Error::Config(format!("cannot decrypt secret: {}", err)))?;

        String::from_utf8(plaintext)
            .map_err(|err| Error::Config(format!("decrypted secret is not UTF-8: {}", err)))
    }

    /// Resolve the password for one account: inline configuration first,
    /// then the encrypted cache, then an interactive prompt whose answer is
    /// cached for the next run.
    pub fn resolve(&self, name: &str, account: &Account) -> Result<String> {
        if let Some(password) = &account.password {
            return Ok(password.clone());
        }

        let secret_path = self.secret_path(name);
        if secret_path.exists() {
            debug!("using cached credentials for {}", name);
            let encrypted = fs::read_to_string(&secret_path)?;
            return self.decrypt(&encrypted);
        }

        let prompt = format!("Password for {} ({}): ", name, account.email);
        let password = rpassword::prompt_password(prompt)?;
        let encrypted = self.encrypt(&password)?;
        fs::write(&secret_path, encrypted)?;
        Ok(password)
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        CredentialCache::new(Path::new("."))
    }
}
