//! Multi-account invariants of the state store under longer sequences.

use std::sync::Arc;

use latchkey::{
    persist::InMemory,
    store::{Account, AccountProfile, AccountStore, AccountTokens, KdfParams, UserState},
};

fn account(user_id: &str) -> Account {
    Account {
        profile: AccountProfile {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            kdf: KdfParams::Pbkdf2 { iterations: 600_000 },
        },
        tokens: AccountTokens {
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
        },
    }
}

fn seeded_store(ids: &[&str]) -> AccountStore {
    let store = AccountStore::load(Arc::new(InMemory::new())).unwrap();
    let mut state: Option<UserState> = None;
    for id in ids {
        state = Some(match state {
            None => UserState::new(account(id)),
            Some(s) => s.with_account(account(id)),
        });
    }
    store.write(state).unwrap();
    store
}

/// Drain all accounts one by one; the invariant that the active user is
/// always a stored key must hold at every step.
#[test]
fn active_user_is_always_a_stored_key_while_draining() {
    let store = seeded_store(&["a", "b", "c", "d"]);

    while let Some(state) = store.user_state() {
        assert!(state.accounts.contains_key(&state.active_user_id));
        let victim = state.active_user_id.clone();
        store.remove_account(&victim).unwrap().unwrap();
    }
    assert!(store.user_state().is_none());
}

#[test]
fn removals_shrink_by_exactly_one() {
    let store = seeded_store(&["a", "b", "c"]);
    store.switch_account("b").unwrap();

    let before = store.user_state().unwrap().accounts.len();
    store.remove_account("a").unwrap().unwrap();
    let after = store.user_state().unwrap();

    assert_eq!(after.accounts.len(), before - 1);
    assert_eq!(after.active_user_id, "b");
}

#[test]
fn watch_subscribers_see_every_write() {
    let store = seeded_store(&[]);
    let mut rx = store.subscribe();
    assert!(rx.borrow_and_update().is_none());

    store.write(Some(UserState::new(account("a")))).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(
        rx.borrow_and_update().as_ref().unwrap().active_user_id,
        "a"
    );

    store.write(None).unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_none());
}

#[test]
fn durable_copy_matches_after_every_mutation() {
    let persist = Arc::new(InMemory::new());
    let store = AccountStore::load(persist.clone()).unwrap();

    store.write(Some(UserState::new(account("a")))).unwrap();
    store
        .write(Some(store.user_state().unwrap().with_account(account("b"))))
        .unwrap();
    store.remove_account("a").unwrap().unwrap();

    let reloaded = AccountStore::load(persist).unwrap();
    assert_eq!(reloaded.user_state(), store.user_state());
}
