//! Short code generation and allocation.
//!
//! Uniqueness is decided by the store's insert: a candidate is written
//! directly and a `DuplicateKey` answer means "taken". There is no separate
//! existence check to race against.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::{
    error::{AppError, StoreError},
    models::Link,
    store::LinkStore,
    RESERVED_CODES,
};

/// Length of generated codes.
pub const CODE_LENGTH: usize = 6;

pub(crate) const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A random code of [`CODE_LENGTH`] characters. Not unique on its own.
pub fn generate() -> String {
    random_code(CODE_LENGTH)
}

fn is_reserved(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// Generate a random alphanumeric string of the given length.
fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// What the caller asked for when creating a link. `long_url` must already
/// be validated.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub long_url: String,
    pub custom_alias: Option<String>,
    pub enable_analytics: bool,
}

/// Persist a new link, choosing its short code.
///
/// With a custom alias the alias is inserted as-is and a duplicate is
/// reported as [`AliasTaken`](AppError::AliasTaken). Otherwise up to
/// `max_attempts` generated codes are tried before failing with
/// [`GenerationExhausted`](AppError::GenerationExhausted).
pub async fn allocate(
    store: &dyn LinkStore,
    new_link: NewLink,
    max_attempts: u32,
) -> Result<Link, AppError> {
    let analytics_token = new_link
        .enable_analytics
        .then(|| Uuid::new_v4().simple().to_string());

    let mut link = Link {
        id: Uuid::new_v4().to_string(),
        long_url: new_link.long_url,
        short_code: String::new(),
        custom_alias: None,
        created_at: Utc::now(),
        click_count: 0,
        analytics_token,
    };

    if let Some(alias) = new_link.custom_alias {
        if is_reserved(&alias) {
            tracing::debug!("custom alias '{}' collides with a fixed route", alias);
            return Err(AppError::AliasTaken(alias));
        }

        link.short_code = alias.clone();
        link.custom_alias = Some(alias.clone());

        return match store.insert(&link).await {
            Ok(()) => Ok(link),
            Err(StoreError::DuplicateKey(_)) => {
                tracing::debug!("custom alias '{}' already taken", alias);
                Err(AppError::AliasTaken(alias))
            }
            Err(e) => Err(e.into()),
        };
    }

    for attempt in 1..=max_attempts {
        link.short_code = generate();
        if is_reserved(&link.short_code) {
            continue;
        }
        match store.insert(&link).await {
            Ok(()) => return Ok(link),
            Err(StoreError::DuplicateKey(_)) => {
                tracing::debug!(
                    "generated code '{}' collided (attempt {}/{})",
                    link.short_code,
                    attempt,
                    max_attempts
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!("no free short code after {} attempts", max_attempts);
    Err(AppError::GenerationExhausted(max_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn request(alias: Option<&str>, analytics: bool) -> NewLink {
        NewLink {
            long_url: "https://example.com/very/long/path".into(),
            custom_alias: alias.map(str::to_owned),
            enable_analytics: analytics,
        }
    }

    #[test]
    fn alphabet_has_62_distinct_chars() {
        let mut chars: Vec<u8> = ALPHABET.to_vec();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), 62);
    }

    #[test]
    fn generated_codes_are_six_alphanumerics() {
        for _ in 0..200 {
            let code = generate();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| ALPHABET.contains(&b)), "bad code {code}");
        }
    }

    #[tokio::test]
    async fn generated_link_is_stored_once() {
        let store = MemoryStore::new();
        let link = allocate(&store, request(None, false), 10).await.unwrap();

        assert_eq!(link.short_code.len(), CODE_LENGTH);
        assert!(link.custom_alias.is_none());
        assert!(link.analytics_token.is_none());
        assert_eq!(link.click_count, 0);
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn alias_is_kept_verbatim() {
        let store = MemoryStore::new();
        let link = allocate(&store, request(Some("MyPromo-2024"), true), 10)
            .await
            .unwrap();

        assert_eq!(link.short_code, "MyPromo-2024");
        assert_eq!(link.custom_alias.as_deref(), Some("MyPromo-2024"));
        let token = link.analytics_token.unwrap();
        assert_ne!(token, link.short_code);
    }

    #[tokio::test]
    async fn taken_alias_is_rejected_without_new_record() {
        let store = MemoryStore::new();
        allocate(&store, request(Some("dup"), false), 10)
            .await
            .unwrap();

        let err = allocate(&store, request(Some("dup"), false), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AliasTaken(ref a) if a == "dup"));
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn route_names_cannot_be_aliases() {
        let store = MemoryStore::new();
        for name in RESERVED_CODES {
            let err = allocate(&store, request(Some(name), false), 10)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::AliasTaken(ref a) if a == name));
        }
        assert_eq!(store.link_count(), 0);

        // Routes match case-sensitively, so other spellings are free.
        allocate(&store, request(Some("Health"), false), 10)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn zero_attempts_exhausts_immediately() {
        let store = MemoryStore::new();
        let err = allocate(&store, request(None, false), 0).await.unwrap_err();

        assert!(matches!(err, AppError::GenerationExhausted(0)));
        assert_eq!(store.link_count(), 0);
    }
}
