// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing keys of the identity provider.
//!
//! The JWKS document is fetched from `JWKS_URL`, converted once into a
//! [`KeyRing`] and cached for [`KEY_TTL`]. Conversion drops keys marked for
//! encryption, key types that cannot verify signatures, and keys whose
//! declared `alg` does not fit their type. A key is only ever used with an
//! algorithm it allows, so a token cannot choose its own verification
//! scheme.
//!
//! A token naming an unknown `kid` triggers one early refetch, at most once
//! per [`MIN_REFETCH_INTERVAL`], so rotated keys are picked up before the
//! TTL runs out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{
    AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse,
};
use jsonwebtoken::{Algorithm, DecodingKey, Header};
use tokio::sync::RwLock;

use super::error::AuthError;

/// How long a fetched key ring is trusted.
pub const KEY_TTL: Duration = Duration::from_secs(300);

/// Minimum age of the key ring before an unknown `kid` forces a refetch.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

#[derive(Clone)]
struct SigningKey {
    kid: Option<String>,
    algorithms: Vec<Algorithm>,
    key: DecodingKey,
}

impl SigningKey {
    fn from_jwk(jwk: &Jwk) -> Option<Self> {
        if !matches!(jwk.common.public_key_use, None | Some(PublicKeyUse::Signature)) {
            return None;
        }

        let (key, allowed) = match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) => (
                DecodingKey::from_rsa_components(&rsa.n, &rsa.e).ok()?,
                RSA_ALGORITHMS.to_vec(),
            ),
            AlgorithmParameters::EllipticCurve(ec) => {
                let alg = match ec.curve {
                    EllipticCurve::P256 => Algorithm::ES256,
                    EllipticCurve::P384 => Algorithm::ES384,
                    _ => return None,
                };
                (DecodingKey::from_ec_components(&ec.x, &ec.y).ok()?, vec![alg])
            }
            AlgorithmParameters::OctetKeyPair(okp) if matches!(okp.curve, EllipticCurve::Ed25519) => {
                (DecodingKey::from_ed_components(&okp.x).ok()?, vec![Algorithm::EdDSA])
            }
            // Symmetric and unknown key types never verify provider tokens
            _ => return None,
        };

        let algorithms = match jwk.common.key_algorithm {
            None => allowed,
            Some(declared) => match signing_algorithm(declared) {
                Some(alg) if allowed.contains(&alg) => vec![alg],
                _ => return None,
            },
        };

        Some(Self {
            kid: jwk.common.key_id.clone(),
            algorithms,
            key,
        })
    }
}

fn signing_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    Some(match alg {
        KeyAlgorithm::RS256 => Algorithm::RS256,
        KeyAlgorithm::RS384 => Algorithm::RS384,
        KeyAlgorithm::RS512 => Algorithm::RS512,
        KeyAlgorithm::PS256 => Algorithm::PS256,
        KeyAlgorithm::PS384 => Algorithm::PS384,
        KeyAlgorithm::PS512 => Algorithm::PS512,
        KeyAlgorithm::ES256 => Algorithm::ES256,
        KeyAlgorithm::ES384 => Algorithm::ES384,
        KeyAlgorithm::EdDSA => Algorithm::EdDSA,
        _ => return None,
    })
}

/// Verification keys converted from one JWKS document.
#[derive(Clone, Default)]
pub struct KeyRing {
    keys: Vec<SigningKey>,
}

impl KeyRing {
    pub fn from_jwks(set: &JwkSet) -> Self {
        let keys = set
            .keys
            .iter()
            .filter_map(|jwk| {
                let key = SigningKey::from_jwk(jwk);
                if key.is_none() {
                    tracing::debug!(kid = ?jwk.common.key_id, "Skipping JWK unusable for signature checks");
                }
                key
            })
            .collect();
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key for a token header. The `kid` must match when the token names
    /// one, and the header algorithm must be one the key allows.
    pub fn select(&self, kid: Option<&str>, alg: Algorithm) -> Option<&DecodingKey> {
        self.keys
            .iter()
            .find(|k| {
                kid.is_none_or(|kid| k.kid.as_deref() == Some(kid)) && k.algorithms.contains(&alg)
            })
            .map(|k| &k.key)
    }
}

struct Fetched {
    ring: Arc<KeyRing>,
    at: Instant,
}

/// Fetches and caches the provider's key ring.
pub struct JwksManager {
    url: String,
    http: reqwest::Client,
    refetch_after: Duration,
    current: RwLock<Option<Fetched>>,
}

impl JwksManager {
    /// `url` is the provider's JWKS endpoint, e.g.
    /// `https://auth.example.com/.well-known/jwks.json`.
    pub fn new(url: impl Into<String>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Misconfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            refetch_after: MIN_REFETCH_INTERVAL,
            current: RwLock::new(None),
        })
    }

    /// Whether a key ring younger than [`KEY_TTL`] is held.
    pub async fn is_cached(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|f| f.at.elapsed() < KEY_TTL)
    }

    /// Refetch the key ring now.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        self.fetch().await.map(|_| ())
    }

    /// Verification key for a token with `header`.
    pub async fn decoding_key(&self, header: &Header) -> Result<DecodingKey, AuthError> {
        let kid = header.kid.as_deref();

        let ring = self.ring().await?;
        if let Some(key) = ring.select(kid, header.alg) {
            return Ok(key.clone());
        }

        if kid.is_some() && self.may_refetch().await {
            tracing::info!(kid = ?kid, "Unknown signing key, refetching JWKS");
            let ring = self.fetch().await?;
            if let Some(key) = ring.select(kid, header.alg) {
                return Ok(key.clone());
            }
        }

        Err(AuthError::UnknownSigningKey)
    }

    async fn ring(&self) -> Result<Arc<KeyRing>, AuthError> {
        if let Some(fetched) = self.current.read().await.as_ref() {
            if fetched.at.elapsed() < KEY_TTL {
                return Ok(Arc::clone(&fetched.ring));
            }
        }
        self.fetch().await
    }

    async fn may_refetch(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_none_or(|f| f.at.elapsed() >= self.refetch_after)
    }

    async fn fetch(&self) -> Result<Arc<KeyRing>, AuthError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeySource(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeySource(format!("JWKS endpoint returned {status}")));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeySource(format!("invalid JWKS document: {e}")))?;

        let ring = KeyRing::from_jwks(&set);
        if ring.is_empty() {
            return Err(AuthError::KeySource(
                "JWKS holds no usable signing keys".to_string(),
            ));
        }

        tracing::debug!(keys = ring.len(), "JWKS fetched");
        let ring = Arc::new(ring);
        *self.current.write().await = Some(Fetched {
            ring: Arc::clone(&ring),
            at: Instant::now(),
        });
        Ok(ring)
    }
}
