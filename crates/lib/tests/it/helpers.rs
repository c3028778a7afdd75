//! Shared fixtures for the integration tests: scripted collaborators and a
//! fully wired session context over an in-memory settings store.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use latchkey::{
    Collaborators, FixedClock, SessionContext,
    api::{
        AccountsApi, ApiError, AuthApi, BreachApi, ConfigApi, IdentityProfile, IdentityTokens,
        RegisterRequest, RegisterResponse, TokenPair, TokenResponse,
    },
    config::{EnvironmentUrls, ServerData},
    crypto::{CredentialCrypto, CryptoError, RegisterKeys},
    persist::InMemory,
    store::KdfParams,
    vault::{VaultError, VaultHandle},
};

/// Identity service with a scripted queue of token responses.
#[derive(Debug, Default)]
pub struct TestAuthApi {
    pub token_responses: Mutex<VecDeque<TokenResponse>>,
    pub refresh_pair: Mutex<Option<TokenPair>>,
}

impl TestAuthApi {
    pub fn push_response(&self, response: TokenResponse) {
        self.token_responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl AuthApi for TestAuthApi {
    async fn prelogin(&self, _email: &str) -> Result<KdfParams, ApiError> {
        Ok(KdfParams::Pbkdf2 { iterations: 600_000 })
    }

    async fn request_token(
        &self,
        _device_id: &str,
        _email: &str,
        _password_hash: &str,
        _captcha_token: Option<&str>,
    ) -> Result<TokenResponse, ApiError> {
        self.token_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ApiError::UnexpectedResponse {
                message: "no scripted token response".to_string(),
            })
    }

    fn refresh_token(&self, _refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.refresh_pair
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Network {
                message: "refresh unavailable".to_string(),
            })
    }
}

/// Accounts service recording deletions and serving a scripted registration
/// response.
#[derive(Debug, Default)]
pub struct TestAccountsApi {
    pub register_response: Mutex<Option<RegisterResponse>>,
    pub deleted_hashes: Mutex<Vec<String>>,
}

#[async_trait]
impl AccountsApi for TestAccountsApi {
    async fn register(&self, _request: RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.register_response
            .lock()
            .unwrap()
            .take()
            .ok_or(ApiError::UnexpectedResponse {
                message: "no scripted register response".to_string(),
            })
    }

    async fn delete_account(&self, password_hash: &str) -> Result<(), ApiError> {
        self.deleted_hashes
            .lock()
            .unwrap()
            .push(password_hash.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct TestBreachApi {
    pub breached: bool,
}

#[async_trait]
impl BreachApi for TestBreachApi {
    async fn is_password_breached(&self, _password: &str) -> Result<bool, ApiError> {
        Ok(self.breached)
    }
}

/// Config endpoint that counts fetches; the served version encodes the call
/// number so tests can tell fetches apart.
#[derive(Debug, Default)]
pub struct TestConfigApi {
    pub fetches: AtomicUsize,
}

#[async_trait]
impl ConfigApi for TestConfigApi {
    async fn fetch_config(&self) -> Result<ServerData, ApiError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ServerData {
            version: format!("fetch-{n}"),
            server_name: Some("test-server".to_string()),
            server_url: None,
            environment: EnvironmentUrls {
                api: Some("https://api.test".to_string()),
                ..EnvironmentUrls::default()
            },
            feature_flags: BTreeMap::new(),
        })
    }
}

/// Deterministic stand-in for the credential cryptography provider.
#[derive(Debug, Default)]
pub struct TestCrypto;

#[async_trait]
impl CredentialCrypto for TestCrypto {
    async fn hash_password(
        &self,
        _email: &str,
        password: &str,
        _kdf: &KdfParams,
    ) -> Result<String, CryptoError> {
        Ok(format!("hashed:{password}"))
    }

    async fn make_register_keys(
        &self,
        _email: &str,
        password: &str,
        _kdf: &KdfParams,
    ) -> Result<RegisterKeys, CryptoError> {
        Ok(RegisterKeys {
            master_password_hash: format!("hashed:{password}"),
            public_key: "pub".to_string(),
            encrypted_private_key: "enc-priv".to_string(),
        })
    }
}

/// Vault engine that records every call and signals fire-and-forget syncs.
#[derive(Debug, Default)]
pub struct TestVault {
    pub events: Mutex<Vec<String>>,
    pub synced: Notify,
}

impl TestVault {
    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl VaultHandle for TestVault {
    async fn unlock(
        &self,
        user_id: &str,
        _user_key: &str,
        _private_key: &str,
    ) -> Result<(), VaultError> {
        self.record(format!("unlock:{user_id}"));
        Ok(())
    }

    async fn lock(&self, user_id: &str) -> Result<(), VaultError> {
        self.record(format!("lock:{user_id}"));
        Ok(())
    }

    async fn clear_unlocked_data(&self) -> Result<(), VaultError> {
        self.record("clear".to_string());
        Ok(())
    }

    async fn sync(&self, user_id: &str) -> Result<(), VaultError> {
        self.record(format!("sync:{user_id}"));
        self.synced.notify_one();
        Ok(())
    }
}

/// A fully wired context plus handles to all the scripted collaborators.
pub struct TestBed {
    pub context: SessionContext,
    pub persist: Arc<InMemory>,
    pub clock: Arc<FixedClock>,
    pub auth: Arc<TestAuthApi>,
    pub accounts: Arc<TestAccountsApi>,
    pub config_api: Arc<TestConfigApi>,
    pub vault: Arc<TestVault>,
}

/// Wire a context over an in-memory settings store and a fixed clock at t0.
pub fn test_bed() -> TestBed {
    let persist = Arc::new(InMemory::new());
    let clock = Arc::new(FixedClock::new(1_000_000));
    let auth = Arc::new(TestAuthApi::default());
    let accounts = Arc::new(TestAccountsApi::default());
    let config_api = Arc::new(TestConfigApi::default());
    let vault = Arc::new(TestVault::default());

    let context = SessionContext::with_clock(
        Collaborators {
            persist: persist.clone(),
            auth_api: auth.clone(),
            accounts_api: accounts.clone(),
            breach_api: Arc::new(TestBreachApi::default()),
            config_api: config_api.clone(),
            crypto: Arc::new(TestCrypto),
            vault: vault.clone(),
        },
        clock.clone(),
    )
    .expect("context construction");

    TestBed {
        context,
        persist,
        clock,
        auth,
        accounts,
        config_api,
        vault,
    }
}

/// A scripted successful token exchange for `user_id`.
pub fn success_response(user_id: &str, email: &str) -> TokenResponse {
    TokenResponse::Success(IdentityTokens {
        tokens: TokenPair {
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
        },
        user_key: format!("ukey-{user_id}"),
        private_key: format!("pkey-{user_id}"),
        profile: IdentityProfile {
            user_id: user_id.to_string(),
            email: email.to_string(),
        },
    })
}
