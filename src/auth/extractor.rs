// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request extractors: [`Auth`] for any verified caller, [`EditorOnly`] and
//! [`AdminOnly`] for role-gated handlers. Authentication runs before the
//! handler body, so an anonymous request never reaches a resource lookup.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};

use super::claims::TokenClaims;
use super::{AuthenticatedUser, AuthError, JwksManager, Role};
use crate::state::{AppState, AuthConfig};

/// Clock skew tolerance in seconds.
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// The authenticated caller.
///
/// - With `JWKS_URL` set, tokens are verified against the provider keys.
/// - Without it, test builds and the `dev` feature decode tokens unsigned
///   (expiry still checked). Other builds reject every token as a 500.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = match &state.auth_config.jwks {
            Some(jwks) => verified_claims(token, jwks, &state.auth_config).await?,
            None => unverified_claims(token)?,
        };
        Ok(Auth(AuthenticatedUser::try_from(claims)?))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

async fn verified_claims(
    token: &str,
    jwks: &JwksManager,
    config: &AuthConfig,
) -> Result<TokenClaims, AuthError> {
    let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
    let key = jwks.decoding_key(&header).await?;

    let mut validation = Validation::new(header.alg);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
    }
    match &config.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            _ => AuthError::MalformedToken,
        })
}

#[cfg(any(test, feature = "dev"))]
fn unverified_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let claims = jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?
        .claims;

    let cutoff = chrono::Utc::now().timestamp() - CLOCK_SKEW_LEEWAY as i64;
    if claims.exp.is_some_and(|exp| exp < cutoff) {
        return Err(AuthError::TokenExpired);
    }
    Ok(claims)
}

#[cfg(not(any(test, feature = "dev")))]
fn unverified_claims(_token: &str) -> Result<TokenClaims, AuthError> {
    Err(AuthError::Misconfigured(
        "JWKS_URL is not set and the dev feature is disabled".to_string(),
    ))
}

async fn with_role(parts: &mut Parts, state: &AppState, required: Role) -> Result<AuthenticatedUser, AuthError> {
    let Auth(user) = Auth::from_request_parts(parts, state).await?;
    if user.has_role(required) {
        Ok(user)
    } else {
        Err(AuthError::InsufficientPermissions { required })
    }
}

/// Caller with the editor role or higher.
pub struct EditorOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for EditorOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        with_role(parts, state, Role::Editor).await.map(EditorOnly)
    }
}

/// Caller with the admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        with_role(parts, state, Role::Admin).await.map(AdminOnly)
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;
    use crate::state::AppState;
    use crate::storage::StoragePaths;
    use axum::http::Request;
    use tempfile::TempDir;

    async fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let state = AppState::open_for_tests(StoragePaths::new(temp_dir.path())).await;
        (state, temp_dir)
    }

    fn parts_with(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = create_test_state().await;
        let result = Auth::from_request_parts(&mut parts_with(None), &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer_header() {
        let (state, _temp_dir) = create_test_state().await;
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_jwt() {
        let (state, _temp_dir) = create_test_state().await;
        let token = reader("user_123");
        let Auth(user) = Auth::from_request_parts(&mut parts_with(Some(&token)), &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Reader);
    }

    #[tokio::test]
    async fn expired_and_garbage_tokens_are_rejected() {
        let (state, _temp_dir) = create_test_state().await;

        let expired = token_with("user_123", None, 1609459200);
        let result = Auth::from_request_parts(&mut parts_with(Some(&expired)), &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));

        let result = Auth::from_request_parts(&mut parts_with(Some("not.a.jwt")), &state).await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn token_without_a_subject_is_rejected() {
        let (state, _temp_dir) = create_test_state().await;
        for sub in ["", "   "] {
            let token = token_with(sub, Some("admin"), 9999999999);
            let result = Auth::from_request_parts(&mut parts_with(Some(&token)), &state).await;
            assert!(matches!(result, Err(AuthError::MalformedToken)), "{sub:?}");
        }
    }

    #[tokio::test]
    async fn empty_bearer_value_is_rejected() {
        let (state, _temp_dir) = create_test_state().await;
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer   ")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn role_extractors_enforce_hierarchy() {
        let (state, _temp_dir) = create_test_state().await;

        let reader_token = reader("u1");
        let editor_token = editor("u2");
        let admin_token = admin("u3");

        assert!(matches!(
            EditorOnly::from_request_parts(&mut parts_with(Some(&reader_token)), &state).await,
            Err(AuthError::InsufficientPermissions { required: Role::Editor })
        ));
        assert!(EditorOnly::from_request_parts(&mut parts_with(Some(&editor_token)), &state)
            .await
            .is_ok());
        assert!(matches!(
            AdminOnly::from_request_parts(&mut parts_with(Some(&editor_token)), &state).await,
            Err(AuthError::InsufficientPermissions { required: Role::Admin })
        ));
        assert!(AdminOnly::from_request_parts(&mut parts_with(Some(&admin_token)), &state)
            .await
            .is_ok());
        assert!(EditorOnly::from_request_parts(&mut parts_with(Some(&admin_token)), &state)
            .await
            .is_ok());
    }
}
