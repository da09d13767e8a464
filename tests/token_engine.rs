//! Token Engine Integration Tests
//!
//! Round-trip, expiry, tamper-evidence and key isolation.

use std::sync::Arc;

use playgate::core::{ManualClock, Rejection, SigningContext, StreamError, TokenEngine};
use proptest::prelude::*;

const NOW: u64 = 1_700_000_000;

/// Alphabet a token can contain
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.";

fn engine(secret: &str, salt: &str) -> (TokenEngine, ManualClock) {
    let clock = ManualClock::new(NOW);
    let context = Arc::new(SigningContext::new(secret, salt, 900).unwrap());
    (TokenEngine::with_clock(context, Arc::new(clock.clone())), clock)
}

#[test]
fn test_round_trip_immediately_after_issue() {
    let (engine, _) = engine("k1", "playback");
    let token = engine.issue("vid123", 900).unwrap();

    assert_eq!(engine.verify(&token.token).as_deref(), Some("vid123"));
}

#[test]
fn test_default_ttl() {
    let (engine, _) = engine("k1", "playback");
    let token = engine.issue_default("vid123").unwrap();

    assert_eq!(token.expires_at, NOW + 900);
}

#[test]
fn test_expiry_after_clock_advances() {
    let (engine, clock) = engine("k1", "playback");
    let token = engine.issue("vid123", 1).unwrap();

    clock.advance(2);

    assert_eq!(engine.verify(&token.token), None);
    assert_eq!(engine.inspect(&token.token), Err(Rejection::Expired));
}

#[test]
fn test_expiry_with_system_clock() {
    let context = Arc::new(SigningContext::with_secret("k1").unwrap());
    let engine = TokenEngine::new(context);

    let token = engine.issue("vid123", 1).unwrap();
    assert!(engine.verify(&token.token).is_some());

    std::thread::sleep(std::time::Duration::from_millis(2100));
    assert_eq!(engine.inspect(&token.token), Err(Rejection::Expired));
}

#[test]
fn test_key_isolation() {
    let (issuer, _) = engine("k1", "playback");
    let (verifier, _) = engine("k2", "playback");

    let token = issuer.issue("vid123", 900).unwrap();

    assert_eq!(verifier.inspect(&token.token), Err(Rejection::BadSignature));
}

#[test]
fn test_salt_isolation() {
    let (issuer, _) = engine("k1", "playback");
    let (verifier, _) = engine("k1", "download");

    let token = issuer.issue("vid123", 900).unwrap();

    assert_eq!(verifier.inspect(&token.token), Err(Rejection::BadSignature));
}

#[test]
fn test_same_context_on_another_replica_verifies() {
    let (a, _) = engine("shared", "playback");
    let (b, _) = engine("shared", "playback");

    let token = a.issue("vid123", 60).unwrap();
    assert_eq!(b.verify(&token.token).as_deref(), Some("vid123"));
}

#[test]
fn test_invalid_issue_arguments() {
    let (engine, _) = engine("k1", "playback");

    assert!(matches!(
        engine.issue("", 60),
        Err(StreamError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.issue("vid", 0),
        Err(StreamError::InvalidArgument(_))
    ));
}

#[test]
fn test_truncated_token_rejected() {
    let (engine, _) = engine("k1", "playback");
    let token = engine.issue("vid123", 900).unwrap().token;

    for len in 0..token.len() {
        assert!(
            engine.verify(&token[..len]).is_none(),
            "prefix of length {} verified",
            len
        );
    }
}

#[test]
fn test_concurrent_verification() {
    let (engine, _) = engine("k1", "playback");
    let token = engine.issue("vid123", 900).unwrap().token;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let token = token.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(engine.verify(&token).as_deref(), Some("vid123"));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.stats().verified, 800);
}

proptest! {
    #[test]
    fn prop_round_trip(resource_id in "\\PC{1,64}", ttl in 1u64..1_000_000) {
        let (engine, _) = engine("k1", "playback");
        let token = engine.issue(&resource_id, ttl).unwrap();

        prop_assert_eq!(engine.verify(&token.token), Some(resource_id));
    }

    #[test]
    fn prop_single_character_flip_is_rejected(
        resource_id in "[A-Za-z0-9]{1,24}",
        position in any::<prop::sample::Index>(),
        replacement in any::<prop::sample::Index>(),
    ) {
        let (engine, _) = engine("k1", "playback");
        let token = engine.issue(&resource_id, 900).unwrap().token;

        let mut bytes = token.into_bytes();
        let i = position.index(bytes.len());
        let mut new_char = TOKEN_ALPHABET[replacement.index(TOKEN_ALPHABET.len())];
        if new_char == bytes[i] {
            new_char = if new_char == b'A' { b'B' } else { b'A' };
        }
        bytes[i] = new_char;
        let mutated = String::from_utf8(bytes).unwrap();

        prop_assert!(engine.verify(&mutated).is_none());
    }
}
