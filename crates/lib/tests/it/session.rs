//! End-to-end session coordinator scenarios across multiple accounts.

use latchkey::{
    persist::SettingsStore,
    session::{AuthState, CaptchaTokenResult, LoginResult},
};

use crate::helpers::{success_response, test_bed};

#[tokio::test]
async fn login_unlocks_vault_and_fires_background_sync() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));

    let result = bed
        .context
        .session()
        .login("a@b.com", "pw", None)
        .await
        .unwrap();
    assert_eq!(result, LoginResult::Success);

    // The post-login sync is fire-and-forget; wait for the vault to see it.
    bed.vault.synced.notified().await;
    let events = bed.vault.events();
    assert!(events.contains(&"unlock:u1".to_string()));
    assert!(events.contains(&"sync:u1".to_string()));
}

#[tokio::test]
async fn second_login_adds_account_and_switches_active() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    bed.auth.push_response(success_response("u2", "c@d.com"));
    let session = bed.context.session();

    session.login("a@b.com", "pw", None).await.unwrap();
    session.login("c@d.com", "pw2", None).await.unwrap();

    let state = bed.context.store().user_state().unwrap();
    assert_eq!(state.accounts.len(), 2);
    assert_eq!(state.active_user_id, "u2");

    session.switch_account("u1").unwrap();
    assert_eq!(
        bed.context.store().active_user_id().as_deref(),
        Some("u1")
    );
    assert_eq!(
        session.auth_state(),
        AuthState::Authenticated {
            access_token: "access-u1".to_string()
        }
    );
}

#[tokio::test]
async fn logout_of_non_active_account_keeps_session() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    bed.auth.push_response(success_response("u2", "c@d.com"));
    let session = bed.context.session();
    session.login("a@b.com", "pw", None).await.unwrap();
    session.login("c@d.com", "pw2", None).await.unwrap();

    session.logout(Some("u1")).await.unwrap();

    let state = bed.context.store().user_state().unwrap();
    assert_eq!(state.active_user_id, "u2");
    assert_eq!(state.accounts.len(), 1);
    let events = bed.vault.events();
    assert!(events.contains(&"lock:u1".to_string()));
    // Unlocked in-memory data belongs to the active session and must survive.
    assert!(!events.contains(&"clear".to_string()));
}

#[tokio::test]
async fn logout_of_active_account_clears_unlocked_data_and_promotes() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    bed.auth.push_response(success_response("u2", "c@d.com"));
    let session = bed.context.session();
    session.login("a@b.com", "pw", None).await.unwrap();
    session.login("c@d.com", "pw2", None).await.unwrap();

    session.logout(None).await.unwrap(); // active account is u2

    let state = bed.context.store().user_state().unwrap();
    assert_eq!(state.active_user_id, "u1");
    let events = bed.vault.events();
    assert!(events.contains(&"lock:u2".to_string()));
    assert!(events.contains(&"clear".to_string()));
    // u2's secret material is gone, u1's remains.
    assert!(bed.persist.user_key("u2").unwrap().is_none());
    assert!(bed.persist.user_key("u1").unwrap().is_some());
}

#[tokio::test]
async fn logging_out_last_account_reaches_unauthenticated() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    let session = bed.context.session();
    let mut auth_stream = session.subscribe_auth_state();
    assert_eq!(*auth_stream.borrow_and_update(), AuthState::Unauthenticated);

    session.login("a@b.com", "pw", None).await.unwrap();
    auth_stream.changed().await.unwrap();
    assert_eq!(
        *auth_stream.borrow_and_update(),
        AuthState::Authenticated {
            access_token: "access-u1".to_string()
        }
    );

    session.logout(None).await.unwrap();
    auth_stream.changed().await.unwrap();
    assert_eq!(*auth_stream.borrow_and_update(), AuthState::Unauthenticated);
    assert!(bed.context.store().user_state().is_none());

    // A second no-target logout with nobody logged in is a no-op.
    session.logout(None).await.unwrap();
}

#[tokio::test]
async fn delete_account_tears_down_like_logout() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    let session = bed.context.session();
    session.login("a@b.com", "pw", None).await.unwrap();

    session.delete_account("pw").await.unwrap();

    assert_eq!(
        bed.accounts.deleted_hashes.lock().unwrap().as_slice(),
        ["hashed:pw"]
    );
    assert!(bed.context.store().user_state().is_none());
    let events = bed.vault.events();
    assert!(events.contains(&"lock:u1".to_string()));
    assert!(events.contains(&"clear".to_string()));
}

#[tokio::test]
async fn state_survives_context_restart() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    bed.context
        .session()
        .login("a@b.com", "pw", None)
        .await
        .unwrap();

    // A fresh store over the same persistence sees the same session.
    let reloaded = latchkey::store::AccountStore::load(bed.persist.clone()).unwrap();
    assert_eq!(reloaded.active_user_id().as_deref(), Some("u1"));
    assert_eq!(
        reloaded.remembered_email().unwrap().as_deref(),
        Some("a@b.com")
    );
}

#[tokio::test]
async fn captcha_events_reach_all_live_subscribers() {
    let bed = test_bed();
    let session = bed.context.session();
    let mut first = session.captcha_token_stream();
    let mut second = session.captcha_token_stream();

    session.emit_captcha_token(CaptchaTokenResult::Success {
        token: "solved".to_string(),
    });

    let expected = CaptchaTokenResult::Success {
        token: "solved".to_string(),
    };
    assert_eq!(first.recv().await, Some(expected.clone()));
    assert_eq!(second.recv().await, Some(expected));
}

#[tokio::test]
async fn blocking_refresh_updates_only_target_account() {
    let bed = test_bed();
    bed.auth.push_response(success_response("u1", "a@b.com"));
    bed.auth.push_response(success_response("u2", "c@d.com"));
    let session = bed.context.session();
    session.login("a@b.com", "pw", None).await.unwrap();
    session.login("c@d.com", "pw2", None).await.unwrap();
    *bed.auth.refresh_pair.lock().unwrap() = Some(latchkey::api::TokenPair {
        access_token: "access-new".to_string(),
        refresh_token: "refresh-new".to_string(),
    });

    // Callable from a synchronous context, off the async scheduler.
    let session_for_refresh = session.clone();
    let pair = tokio::task::spawn_blocking(move || {
        session_for_refresh.refresh_access_token("u1")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(pair.access_token, "access-new");
    let state = bed.context.store().user_state().unwrap();
    assert_eq!(state.accounts["u1"].tokens.access_token, "access-new");
    assert_eq!(state.accounts["u2"].tokens.access_token, "access-u2");
    // The active account is untouched by a background refresh of another.
    assert_eq!(state.active_user_id, "u2");
}
