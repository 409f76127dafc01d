//! Integration tests for the Strongbox crypto module.

use strongbox::crypto::cipher::{self, NONCE_LEN, TAG_LEN};
use strongbox::crypto::{derive, derive_record_key, generate_salt, unwrap, wrap, KdfParams, MasterKey};
use strongbox::errors::StrongboxError;

/// Cheap KDF parameters so tests stay fast.
fn fast() -> KdfParams {
    KdfParams {
        ops_limit: 1,
        mem_limit: 8 * 1024 * 1024,
    }
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derive_is_deterministic_and_salt_sensitive() {
    let salt = generate_salt();
    let a = derive(b"Secret123", &salt, &fast()).unwrap();
    let b = derive(b"Secret123", &salt, &fast()).unwrap();
    assert_eq!(*a, *b);

    let other = derive(b"Secret123", &generate_salt(), &fast()).unwrap();
    assert_ne!(*a, *other);
}

#[test]
fn derive_rejects_empty_password() {
    let result = derive(b"", &generate_salt(), &fast());
    assert!(matches!(result, Err(StrongboxError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Key wrap
// ---------------------------------------------------------------------------

#[test]
fn wrap_unwrap_recovers_master_key() {
    let salt = generate_salt();
    let kek = derive(b"Secret123", &salt, &fast()).unwrap();
    let vmk = MasterKey::generate();

    let wrapped = wrap(&vmk, &kek).unwrap();
    assert_eq!(wrapped.nonce.len(), NONCE_LEN);

    let recovered = unwrap(&wrapped, &kek).unwrap();
    assert_eq!(recovered.as_bytes(), vmk.as_bytes());
}

#[test]
fn unwrap_with_other_password_fails() {
    let salt = generate_salt();
    let kek = derive(b"Secret123", &salt, &fast()).unwrap();
    let wrong = derive(b"WrongPass", &salt, &fast()).unwrap();

    let wrapped = wrap(&MasterKey::generate(), &kek).unwrap();
    assert!(matches!(
        unwrap(&wrapped, &wrong),
        Err(StrongboxError::Authentication)
    ));
}

// ---------------------------------------------------------------------------
// Record encryption
// ---------------------------------------------------------------------------

#[test]
fn record_keys_are_separated_by_salt() {
    let vmk = MasterKey::generate();
    let k1 = derive_record_key(vmk.as_bytes(), &[1u8; 32]).unwrap();
    let k2 = derive_record_key(vmk.as_bytes(), &[2u8; 32]).unwrap();
    assert_ne!(*k1, *k2);
    assert_eq!(*k1, *vmk.derive_record_key(&[1u8; 32]).unwrap());
}

#[test]
fn sealed_record_layout_and_tamper_detection() {
    let key = [0xABu8; 32];
    let plaintext = b"correct horse battery staple";

    let (nonce, ct) = cipher::seal(&key, plaintext, b"record:1").unwrap();
    assert_eq!(ct.len(), plaintext.len() + TAG_LEN);
    assert_eq!(
        cipher::open(&key, &nonce, &ct, b"record:1").unwrap(),
        plaintext
    );

    // Same ciphertext presented as another record.
    assert!(matches!(
        cipher::open(&key, &nonce, &ct, b"record:2"),
        Err(StrongboxError::Authentication)
    ));

    let mut tampered = ct.clone();
    tampered[0] ^= 0x01;
    assert!(matches!(
        cipher::open(&key, &nonce, &tampered, b"record:1"),
        Err(StrongboxError::Authentication)
    ));
}
