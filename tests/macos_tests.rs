//! macOS-specific tests against the live SystemConfiguration store

#![cfg(target_os = "macos")]

use std::thread;

use sysresolv::foreign::{convert, text_of};
use sysresolv::{
    server_addrs, DynamicStore, Error, Owned, ServerAddrsQuery, SessionOptions, SystemStore,
    DEFAULT_CALLER,
};

/// A host may legitimately have no DNS configured; anything else is a bug
fn assert_usable<T: std::fmt::Debug>(result: &Result<T, Error>) {
    if let Err(e) = result {
        assert!(
            matches!(e, Error::MissingRecord { .. } | Error::EmptyServerList),
            "unexpected error: {e}"
        );
    }
}

#[test]
fn test_system_server_addrs() {
    let result = server_addrs();
    assert_usable(&result);

    if let Ok(addrs) = result {
        println!("System resolvers:");
        for addr in addrs {
            println!("  {addr}");
        }
    }
}

#[test]
fn test_text_roundtrip_through_corefoundation() {
    let store = SystemStore::new();
    for s in ["", "State:/Network/Global/DNS", "fe80::1%en0", "résolveur ✓ 🦀"] {
        let text = Owned::text(&store, s).expect("CFString creation");
        assert_eq!(text_of(text.borrow()), s);
    }
}

#[test]
fn test_text_with_interior_nul() {
    let store = SystemStore::new();
    for s in ["a\0b", "\0", "8.8.8.8\0trailing", "\u{e9}\0"] {
        let text = Owned::text(&store, s).expect("CFString creation");
        assert_eq!(text_of(text.borrow()), s);
    }
}

#[test]
fn test_session_is_not_convertible() {
    let store = SystemStore::new();
    let caller = Owned::text(&store, DEFAULT_CALLER).unwrap();
    // SAFETY: `caller` is alive and the new session is ours alone
    let session = unsafe {
        let raw = store
            .open_session(caller.as_raw(), &SessionOptions::default())
            .expect("SCDynamicStoreCreate");
        Owned::from_raw(&store, raw)
    };

    match convert(session.borrow()) {
        Err(Error::UnsupportedForeignType { type_name }) => assert!(!type_name.is_empty()),
        other => panic!("expected unsupported type, got {other:?}"),
    }
}

#[test]
fn test_absent_key() {
    let query = ServerAddrsQuery::builder()
        .key("State:/Network/Sysresolv/DoesNotExist")
        .build();
    assert!(matches!(
        query.run(&SystemStore::new()),
        Err(Error::MissingRecord { .. })
    ));
}

#[test]
fn test_concurrent_system_queries() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| (0..10).map(|_| server_addrs()).collect::<Vec<_>>()))
        .collect();

    for handle in handles {
        for result in handle.join().expect("query thread panicked") {
            assert_usable(&result);
        }
    }
}
