// =====================================================================================
// SHARED CRYPTO - FIELD ENCRYPTION, PASSWORD HASHING, SECURE RANDOM IDENTIFIERS
// =====================================================================================

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use argon2::{
    password_hash::{rand_core::OsRng as ArgonOsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    #[error("Random generation failed")]
    RandomFailed,
}

/// Authenticated-encryption envelope for sensitive stored fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    pub ciphertext: String,
    pub nonce: String,
    pub algorithm: String,
}

pub struct CryptoService {
    master_key: [u8; 32],
    argon2: Argon2<'static>,
    rng: SystemRandom,
}

impl CryptoService {
    pub fn new(master_key: &[u8; 32]) -> Self {
        Self {
            master_key: *master_key,
            argon2: Argon2::default(),
            rng: SystemRandom::new(),
        }
    }

    /// Key is supplied base64-encoded through configuration and must decode to
    /// exactly 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let key_bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid master key encoding: {}", e)))?;

        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey("master key must be 32 bytes".to_string()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        Ok(Self::new(&key))
    }

    pub fn generate_master_key() -> [u8; 32] {
        Aes256Gcm::generate_key(OsRng).into()
    }

    // ---------------------------------------------------------------------------------
    // Authenticated symmetric encryption
    // ---------------------------------------------------------------------------------

    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedData, CryptoError> {
        let key = Key::<Aes256Gcm>::from_slice(&self.master_key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(EncryptedData {
            ciphertext: general_purpose::STANDARD.encode(&ciphertext),
            nonce: general_purpose::STANDARD.encode(&nonce),
            algorithm: "AES-256-GCM".to_string(),
        })
    }

    pub fn decrypt(&self, encrypted: &EncryptedData) -> Result<String, CryptoError> {
        if encrypted.algorithm != "AES-256-GCM" {
            return Err(CryptoError::DecryptionFailed(format!(
                "unsupported algorithm: {}",
                encrypted.algorithm
            )));
        }

        let key = Key::<Aes256Gcm>::from_slice(&self.master_key);
        let cipher = Aes256Gcm::new(key);

        let ciphertext = general_purpose::STANDARD
            .decode(&encrypted.ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid ciphertext: {}", e)))?;
        let nonce_bytes = general_purpose::STANDARD
            .decode(&encrypted.nonce)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid nonce: {}", e)))?;

        if nonce_bytes.len() != 12 {
            return Err(CryptoError::DecryptionFailed("invalid nonce length".to_string()));
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid utf-8: {}", e)))
    }

    // ---------------------------------------------------------------------------------
    // Password hashing (per-call random salt, carried inside the PHC string)
    // ---------------------------------------------------------------------------------

    pub fn hash_password(&self, password: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut ArgonOsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::PasswordHashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, CryptoError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| CryptoError::PasswordHashingFailed(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::PasswordHashingFailed(e.to_string())),
        }
    }

    // ---------------------------------------------------------------------------------
    // Random identifiers and digests
    // ---------------------------------------------------------------------------------

    /// Lowercase hex token of `2 * byte_len` characters from the system CSPRNG.
    pub fn secure_hex_token(&self, byte_len: usize) -> Result<String, CryptoError> {
        let mut bytes = vec![0u8; byte_len];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| CryptoError::RandomFailed)?;
        Ok(hex::encode(bytes))
    }

    /// Session identifiers are 64 lowercase hex characters (32 random bytes).
    pub fn generate_session_id(&self) -> Result<String, CryptoError> {
        self.secure_hex_token(32)
    }

    pub fn generate_csrf_token(&self) -> Result<String, CryptoError> {
        self.secure_hex_token(32)
    }

    pub fn sha256_hex(&self, data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Keyed pseudonymization for analytics minimization: stable per input,
    /// irreversible without the master key.
    pub fn pseudonymize(&self, value: &str) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.master_key)
            .expect("hmac accepts any key length");
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
