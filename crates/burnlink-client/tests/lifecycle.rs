use std::sync::Arc;

use burnlink_client::{
    CreateRequest, LinkError, LinkLifecycle, LinkMode, LinkState, ViewOutcome,
};
use burnlink_shared::kdf::KdfParams;
use burnlink_shared::{
    crypto, key_codec, payload, CryptoError, CryptoProvider, Decoded, ExpiryOption, LinkKind,
    NewSecret, SecretId, SecretRecord, SecretStore, ShareLink, StorageError,
};
use burnlink_store::SqliteSecretStore;
use chrono::{Duration, Utc};

const ORIGIN: &str = "https://burn.example";
const CHEAP_KDF: KdfParams = KdfParams { iterations: 1_000 };

fn lifecycle(store: &SqliteSecretStore) -> LinkLifecycle<SqliteSecretStore> {
    LinkLifecycle::new(store.clone(), ORIGIN).with_kdf_params(CHEAP_KDF)
}

fn backend_id(mode: &LinkMode) -> SecretId {
    match mode {
        LinkMode::Backend { id, .. } => *id,
        LinkMode::Fallback => panic!("expected a backend link"),
    }
}

fn fragment_key(link: &ShareLink) -> String {
    match link.kind() {
        LinkKind::Backend { key: Some(key), .. } => key.clone(),
        other => panic!("expected a key in the fragment, got {other:?}"),
    }
}

#[tokio::test]
async fn five_minute_text_secret_round_trip() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let before = Utc::now();
    let created = lc
        .create(CreateRequest::text("hello").expiry(ExpiryOption::FiveMinutes))
        .await
        .unwrap();
    let LinkMode::Backend { id, expires_at } = created.mode else {
        panic!("expected backend link");
    };

    let drift = expires_at - (before + Duration::seconds(300));
    assert!(drift >= Duration::zero() && drift < Duration::seconds(5));

    // The stored ciphertext decrypts with the fragment key to the text payload.
    let record = store.fetch(id).await.unwrap().unwrap();
    let key = key_codec::decode_key(&fragment_key(&created.link)).unwrap();
    let plaintext = crypto::decrypt(&record.encrypted_content, &key).unwrap();
    let json: serde_json::Value = serde_json::from_str(&plaintext).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "text", "content": "hello" }));

    // Viewing through the parsed link reveals it and keeps the record.
    let parsed = ShareLink::parse(&created.url()).unwrap();
    let ViewOutcome::Revealed(secret) = lc.open_link(&parsed).await.unwrap() else {
        panic!("expected revealed secret");
    };
    assert_eq!(secret.content, Decoded::Text("hello".into()));
    assert_eq!(secret.state, LinkState::Viewed);
    assert!(secret.remaining > Duration::seconds(250));
    assert!(store.fetch(id).await.unwrap().is_some());
}

#[tokio::test]
async fn expired_secret_is_deleted_on_open() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let key = key_codec::generate_key(&burnlink_shared::OsCryptoProvider).unwrap();
    let envelope = crypto::encrypt_to_json(
        &payload::serialize(&burnlink_shared::Payload::text("old news")).unwrap(),
        &key,
        &burnlink_shared::OsCryptoProvider,
    )
    .unwrap();
    let id = store
        .insert(NewSecret {
            encrypted_content: envelope,
            expires_at: Utc::now() - Duration::seconds(1),
        })
        .await
        .unwrap();

    let err = lc
        .open(id, Some(&key_codec::encode_key(&key)))
        .await
        .unwrap_err();
    assert_eq!(err, LinkError::NotFoundOrExpired);
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(lc.status(id).await.unwrap(), LinkState::ExpiredAndDeleted);
}

#[tokio::test]
async fn passphrase_wrong_then_right() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc
        .create(
            CreateRequest::text("the vault code")
                .passphrase("correct horse")
                .expiry(ExpiryOption::OneHour),
        )
        .await
        .unwrap();
    let id = backend_id(&created.mode);
    assert_eq!(created.url(), format!("{ORIGIN}/view/{id}"));

    let ViewOutcome::AwaitingPassphrase(prompt) = lc.open(id, None).await.unwrap() else {
        panic!("expected passphrase prompt");
    };
    assert_eq!(prompt.salt.split(',').count(), 16);

    let err = lc.unlock(&prompt, "wrong horse").await.unwrap_err();
    assert_eq!(err, LinkError::InvalidKeyOrCorruptedData { retryable: true });
    assert!(err.is_retryable());
    assert!(store.fetch(id).await.unwrap().is_some());

    let secret = lc.unlock(&prompt, "correct horse").await.unwrap();
    assert_eq!(secret.content, Decoded::Text("the vault code".into()));
    assert_eq!(secret.state, LinkState::Viewed);
    assert!(store.fetch(id).await.unwrap().is_some());
}

#[tokio::test]
async fn file_without_mime_type_is_corrupted() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let key = key_codec::generate_key(&burnlink_shared::OsCryptoProvider).unwrap();
    let plaintext = r#"{"type":"file","content":"aGVsbG8=","fileName":"a.txt"}"#;
    let id = store
        .insert(NewSecret {
            encrypted_content: crypto::encrypt_to_json(
                plaintext,
                &key,
                &burnlink_shared::OsCryptoProvider,
            )
            .unwrap(),
            expires_at: Utc::now() + Duration::minutes(5),
        })
        .await
        .unwrap();

    let err = lc
        .open(id, Some(&key_codec::encode_key(&key)))
        .await
        .unwrap_err();
    assert_eq!(err, LinkError::CorruptedData("Missing file metadata".into()));
    assert_eq!(err.to_string(), "Corrupted Data: Missing file metadata");
}

#[tokio::test]
async fn file_with_empty_mime_type_opens_as_octet_stream() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc
        .create(CreateRequest::file(b"data", "notes.bin", "").expiry(ExpiryOption::OneHour))
        .await
        .unwrap();
    let parsed = ShareLink::parse(&created.url()).unwrap();

    let ViewOutcome::Revealed(secret) = lc.open_link(&parsed).await.unwrap() else {
        panic!("expected revealed secret");
    };
    let Decoded::File(file) = secret.content else {
        panic!("expected file content");
    };
    assert_eq!(file.file_name, "notes.bin");
    assert_eq!(file.mime_type, "application/octet-stream");
    assert_eq!(file.bytes().unwrap(), b"data");
}

#[tokio::test]
async fn file_secret_round_trip() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let bytes = b"%PDF-1.7 not really";
    let created = lc
        .create(
            CreateRequest::file(bytes, "report.pdf", "application/pdf")
                .expiry(ExpiryOption::TwelveHours),
        )
        .await
        .unwrap();

    let ViewOutcome::Revealed(secret) = lc.open_link(&created.link).await.unwrap() else {
        panic!("expected revealed secret");
    };
    let file = secret.content.as_file().expect("file secret");
    assert_eq!(file.file_name, "report.pdf");
    assert_eq!(file.mime_type, "application/pdf");
    assert_eq!(file.bytes().unwrap(), bytes);
}

#[tokio::test]
async fn instant_secret_burns_after_first_view() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc.create(CreateRequest::text("once only")).await.unwrap();
    assert_eq!(created.expiry, ExpiryOption::Instant);

    let ViewOutcome::Revealed(secret) = lc.open_link(&created.link).await.unwrap() else {
        panic!("expected revealed secret");
    };
    assert_eq!(secret.state, LinkState::ViewedAndDeleted);
    assert_eq!(store.count().await.unwrap(), 0);

    let err = lc.open_link(&created.link).await.unwrap_err();
    assert_eq!(err, LinkError::NotFoundOrExpired);
}

#[tokio::test]
async fn concurrent_views_reveal_burned_secret_once() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc.create(CreateRequest::text("race me")).await.unwrap();
    let link = created.link.clone();

    let (a, b, c, d) = tokio::join!(
        lc.open_link(&link),
        lc.open_link(&link),
        lc.open_link(&link),
        lc.open_link(&link),
    );

    let mut revealed = 0;
    for outcome in [a, b, c, d] {
        match outcome {
            Ok(ViewOutcome::Revealed(secret)) => {
                assert_eq!(secret.content, Decoded::Text("race me".into()));
                revealed += 1;
            }
            Err(LinkError::NotFoundOrExpired) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(revealed, 1);
}

#[tokio::test]
async fn burned_passphrase_secret_unlocks_once() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc
        .create(CreateRequest::text("one shot").passphrase("pw"))
        .await
        .unwrap();
    let id = backend_id(&created.mode);

    let ViewOutcome::AwaitingPassphrase(prompt) = lc.open(id, None).await.unwrap() else {
        panic!("expected passphrase prompt");
    };
    let secret = lc.unlock(&prompt, "pw").await.unwrap();
    assert_eq!(secret.state, LinkState::ViewedAndDeleted);

    let err = lc.unlock(&prompt, "pw").await.unwrap_err();
    assert_eq!(err, LinkError::NotFoundOrExpired);
}

#[tokio::test]
async fn prompt_for_deleted_secret_does_not_unlock() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc
        .create(
            CreateRequest::text("kept until expiry")
                .passphrase("pw")
                .expiry(ExpiryOption::OneHour),
        )
        .await
        .unwrap();
    let id = backend_id(&created.mode);

    let ViewOutcome::AwaitingPassphrase(prompt) = lc.open(id, None).await.unwrap() else {
        panic!("expected passphrase prompt");
    };
    store.delete(id).await.unwrap();

    let err = lc.unlock(&prompt, "pw").await.unwrap_err();
    assert_eq!(err, LinkError::NotFoundOrExpired);
}

#[tokio::test]
async fn missing_key_leaves_record_untouched() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc.create(CreateRequest::text("keyless")).await.unwrap();
    let id = backend_id(&created.mode);

    for fragment in [None, Some(""), Some("   ")] {
        let err = lc.open(id, fragment).await.unwrap_err();
        assert_eq!(err, LinkError::MissingKey);
        assert!(err.is_retryable());
    }
    assert!(store.fetch(id).await.unwrap().is_some());
}

#[tokio::test]
async fn wrong_fragment_key_is_not_retryable() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc
        .create(CreateRequest::text("mine").expiry(ExpiryOption::OneHour))
        .await
        .unwrap();
    let id = backend_id(&created.mode);
    let other_key = key_codec::encode_random_key(&burnlink_shared::OsCryptoProvider).unwrap();

    let err = lc.open(id, Some(&other_key)).await.unwrap_err();
    assert_eq!(err, LinkError::InvalidKeyOrCorruptedData { retryable: false });
    assert!(!err.is_retryable());
    assert!(store.fetch(id).await.unwrap().is_some());
}

#[tokio::test]
async fn legacy_jwk_fragment_still_opens() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    // JWK export of key bytes 0..32, base64-encoded the way old links carried it.
    let legacy = "eyJhbGciOiJBMjU2R0NNIiwiZXh0Ijp0cnVlLCJrIjoiQUFFQ0F3UUZCZ2NJQ1FvTERBME9EeEFSRWhNVUZSWVhHQmthR3h3ZEhoOCIsImtleV9vcHMiOlsiZW5jcnlwdCIsImRlY3J5cHQiXSwia3R5Ijoib2N0In0=";
    let key = key_codec::decode_key(legacy).unwrap();
    let id = store
        .insert(NewSecret {
            encrypted_content: crypto::encrypt_to_json(
                "pre-wrapper plain text",
                &key,
                &burnlink_shared::OsCryptoProvider,
            )
            .unwrap(),
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

    let ViewOutcome::Revealed(secret) = lc.open(id, Some(legacy)).await.unwrap() else {
        panic!("expected revealed secret");
    };
    assert_eq!(secret.content, Decoded::Bare("pre-wrapper plain text".into()));
}

#[tokio::test]
async fn delete_is_idempotent_through_the_contract() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = lifecycle(&store);

    let created = lc
        .create(CreateRequest::text("bye").expiry(ExpiryOption::OneHour))
        .await
        .unwrap();
    let id = backend_id(&created.mode);

    lc.store().delete(id).await.unwrap();
    lc.store().delete(id).await.unwrap();
    assert_eq!(lc.status(id).await.unwrap(), LinkState::ExpiredAndDeleted);
}

/// A store that is always down, as when the server cannot be reached.
struct DownStore;

impl SecretStore for DownStore {
    async fn insert(&self, _secret: NewSecret) -> Result<SecretId, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn fetch(&self, _id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _id: SecretId) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn take(&self, _id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn unreachable_store_without_fallback_fails() {
    let lc = LinkLifecycle::new(DownStore, ORIGIN);
    let err = lc
        .create(CreateRequest::text("x").expiry(ExpiryOption::OneHour))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkError::StorageUnavailable(_)));
}

#[tokio::test]
async fn unreachable_store_falls_back_to_client_only_link() {
    let lc = LinkLifecycle::new(Arc::new(DownStore), ORIGIN).allow_fallback(true);

    let created = lc
        .create(CreateRequest::text("offline note").expiry(ExpiryOption::OneHour))
        .await
        .unwrap();
    assert!(created.is_fallback());
    assert_eq!(created.mode, LinkMode::Fallback);
    assert!(created.url().ends_with("|3600"));

    let parsed = ShareLink::parse(&created.url()).unwrap();
    let ViewOutcome::Fallback(secret) = lc.open_link(&parsed).await.unwrap() else {
        panic!("expected fallback outcome");
    };
    assert_eq!(secret.content, Decoded::Text("offline note".into()));
    assert_eq!(secret.ttl, Duration::seconds(3600));
}

#[tokio::test]
async fn fallback_refuses_what_needs_a_backend() {
    let lc = LinkLifecycle::new(DownStore, ORIGIN)
        .allow_fallback(true)
        .with_kdf_params(CHEAP_KDF);

    let cases = [
        (
            CreateRequest::file(b"x", "x.bin", "application/octet-stream").expiry(ExpiryOption::OneHour),
            "Files cannot be shared in offline/fallback mode",
        ),
        (
            CreateRequest::text("x").passphrase("pw").expiry(ExpiryOption::OneHour),
            "Passphrase protection requires backend storage",
        ),
        (
            CreateRequest::text("x"),
            "'Instant' expiration requires backend storage",
        ),
    ];

    for (request, message) in cases {
        let err = lc.create(request).await.unwrap_err();
        assert_eq!(err, LinkError::FallbackUnsupported(message.into()));
    }
}

/// A reachable server that refuses every write, e.g. over its size limit.
struct RejectingStore;

impl SecretStore for RejectingStore {
    async fn insert(&self, _secret: NewSecret) -> Result<SecretId, StorageError> {
        Err(StorageError::Rejected("Content too large".into()))
    }

    async fn fetch(&self, _id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        Ok(None)
    }

    async fn delete(&self, _id: SecretId) -> Result<(), StorageError> {
        Ok(())
    }

    async fn take(&self, _id: SecretId) -> Result<Option<SecretRecord>, StorageError> {
        Ok(None)
    }
}

#[tokio::test]
async fn server_rejection_is_not_a_fallback_trigger() {
    let lc = LinkLifecycle::new(RejectingStore, ORIGIN).allow_fallback(true);

    let err = lc
        .create(CreateRequest::text("my bank password").expiry(ExpiryOption::OneHour))
        .await
        .unwrap_err();
    assert_eq!(err, LinkError::Invalid("Content too large".into()));
}

#[tokio::test]
async fn validation_errors_never_fall_back() {
    let lc = LinkLifecycle::new(DownStore, ORIGIN).allow_fallback(true);
    let err = lc.create(CreateRequest::text("   ")).await.unwrap_err();
    assert!(matches!(err, LinkError::Invalid(_)));
}

/// Like a runtime without a secure random source.
struct NoRandomness;

impl CryptoProvider for NoRandomness {
    fn fill_random(&self, _buf: &mut [u8]) -> Result<(), CryptoError> {
        Err(CryptoError::CryptoUnavailable)
    }
}

#[tokio::test]
async fn missing_randomness_is_crypto_unavailable() {
    let store = SqliteSecretStore::open_in_memory().unwrap();
    let lc = LinkLifecycle::with_provider(store.clone(), NoRandomness, ORIGIN);

    let err = lc.create(CreateRequest::text("x")).await.unwrap_err();
    assert_eq!(err, LinkError::CryptoUnavailable);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn on_disk_store_survives_a_new_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.db");

    let url = {
        let store = SqliteSecretStore::open_at(&path).unwrap();
        lifecycle(&store)
            .create(CreateRequest::text("persisted").expiry(ExpiryOption::TwentyFourHours))
            .await
            .unwrap()
            .url()
    };

    let store = SqliteSecretStore::open_at(&path).unwrap();
    let link = ShareLink::parse(&url).unwrap();
    let ViewOutcome::Revealed(secret) = lifecycle(&store).open_link(&link).await.unwrap() else {
        panic!("expected revealed secret");
    };
    assert_eq!(secret.content.as_text(), Some("persisted"));
}
