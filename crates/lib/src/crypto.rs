//! Credential cryptography collaborator seam
//!
//! All password hashing, key-pair generation, and KDF execution is delegated
//! through [`CredentialCrypto`]. This crate never sees plaintext-derived key
//! material beyond the opaque strings the collaborator returns.

use async_trait::async_trait;
use thiserror::Error;

use crate::store::KdfParams;

/// Failure inside the credential cryptography provider.
#[derive(Error, Debug)]
#[error("Credential crypto failure: {reason}")]
pub struct CryptoError {
    pub reason: String,
}

/// Key material produced for a registration submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterKeys {
    /// Master password hash to authenticate the registration
    pub master_password_hash: String,

    /// New account public key
    pub public_key: String,

    /// Private key, encrypted under the master key
    pub encrypted_private_key: String,
}

/// Provider of the KDF and key-generation operations the coordinator needs.
#[async_trait]
pub trait CredentialCrypto: Send + Sync {
    /// Derive the master password hash for authentication.
    async fn hash_password(
        &self,
        email: &str,
        password: &str,
        kdf: &KdfParams,
    ) -> Result<String, CryptoError>;

    /// Generate the key set submitted with a registration.
    async fn make_register_keys(
        &self,
        email: &str,
        password: &str,
        kdf: &KdfParams,
    ) -> Result<RegisterKeys, CryptoError>;
}
