// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Image endpoints. Reads are public; writes need the editor role.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

use crate::{
    auth::EditorOnly,
    error::{ApiError, ErrorBody},
    models::{ImageListResponse, ImageUploadResponse},
    state::AppState,
    storage::{ImageFolder, ImageKey},
};

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageDeleteResponse {
    /// `false` if there was nothing to delete.
    pub deleted: bool,
}

/// Stream a stored image.
#[utoipa::path(
    get,
    path = "/api/images/{folder}/{filename}",
    tag = "Images",
    params(
        ("folder" = String, Path, description = "`covers` or `chapters`"),
        ("filename" = String, Path, description = "Image file name")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 400, description = "Invalid key", body = ErrorBody),
        (status = 404, description = "Image not found", body = ErrorBody)
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path((folder, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let key = ImageKey::new(&folder, &filename)?;
    let (file, len) = state.images.open(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, key.content_type().to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// Store or replace an image.
#[utoipa::path(
    put,
    path = "/api/admin/images/{folder}/{filename}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("folder" = String, Path, description = "`covers` or `chapters`"),
        ("filename" = String, Path, description = "Image file name")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Image stored", body = ImageUploadResponse),
        (status = 400, description = "Invalid key or empty body", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Editor role required", body = ErrorBody),
        (status = 413, description = "Image too large")
    )
)]
pub async fn put_image(
    EditorOnly(user): EditorOnly,
    State(state): State<AppState>,
    Path((folder, filename)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImageUploadResponse>), ApiError> {
    let key = ImageKey::new(&folder, &filename)?;
    if body.is_empty() {
        return Err(ApiError::bad_request("Image body is empty"));
    }

    let key = state.images.put(&key, &body).await?;
    tracing::info!(key = %key, bytes = body.len(), user_id = %user.user_id, "Image stored");
    Ok((StatusCode::CREATED, Json(ImageUploadResponse { key })))
}

/// Delete an image. Deleting a missing image is not an error.
#[utoipa::path(
    delete,
    path = "/api/admin/images/{folder}/{filename}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("folder" = String, Path, description = "`covers` or `chapters`"),
        ("filename" = String, Path, description = "Image file name")
    ),
    responses(
        (status = 200, description = "Delete result", body = ImageDeleteResponse),
        (status = 400, description = "Invalid key", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Editor role required", body = ErrorBody)
    )
)]
pub async fn delete_image(
    EditorOnly(user): EditorOnly,
    State(state): State<AppState>,
    Path((folder, filename)): Path<(String, String)>,
) -> Result<Json<ImageDeleteResponse>, ApiError> {
    let key = ImageKey::new(&folder, &filename)?;
    let deleted = state.images.delete(&key).await?;
    if deleted {
        tracing::info!(key = %key, user_id = %user.user_id, "Image deleted");
    }
    Ok(Json(ImageDeleteResponse { deleted }))
}

/// List the images in a folder.
#[utoipa::path(
    get,
    path = "/api/admin/images/{folder}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("folder" = String, Path, description = "`covers` or `chapters`")
    ),
    responses(
        (status = 200, description = "Sorted keys", body = ImageListResponse),
        (status = 400, description = "Unknown folder", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Editor role required", body = ErrorBody)
    )
)]
pub async fn list_images(
    EditorOnly(_user): EditorOnly,
    State(state): State<AppState>,
    Path(folder): Path<String>,
) -> Result<Json<ImageListResponse>, ApiError> {
    let folder = ImageFolder::parse(&folder)?;
    let keys = state.images.list(folder).await?;
    Ok(Json(ImageListResponse { keys }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::auth::extractor::test_tokens::{editor, reader};
    use axum::http::{header, StatusCode};

    #[tokio::test]
    async fn upload_serve_list_delete() {
        let app = TestApp::new().await;
        let ed = editor("ed");

        let (status, body) = app
            .put_bytes("/api/admin/images/covers/one.png", Some(&ed), b"\x89PNG".to_vec())
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["key"], "covers/one.png");

        let response = app.raw_get("/api/images/covers/one.png", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(body_bytes(response).await, b"\x89PNG");

        let (_, body) = app.get("/api/admin/images/covers", Some(&ed)).await;
        assert_eq!(body["keys"], serde_json::json!(["covers/one.png"]));

        let (status, body) = app.delete("/api/admin/images/covers/one.png", Some(&ed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);

        let (_, body) = app.delete("/api/admin/images/covers/one.png", Some(&ed)).await;
        assert_eq!(body["deleted"], false);

        let (status, _) = app.get("/api/images/covers/one.png", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn writes_require_editor() {
        let app = TestApp::new().await;
        let (status, _) = app
            .put_bytes("/api/admin/images/covers/one.png", Some(&reader("u1")), b"x".to_vec())
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .put_bytes("/api/admin/images/covers/one.png", None, b"x".to_vec())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_keys_are_400() {
        let app = TestApp::new().await;
        let ed = editor("ed");

        let (status, _) = app
            .put_bytes("/api/admin/images/avatars/one.png", Some(&ed), b"x".to_vec())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .put_bytes("/api/admin/images/covers/.hidden", Some(&ed), b"x".to_vec())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .put_bytes("/api/admin/images/covers/empty.png", Some(&ed), Vec::new())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.get("/api/admin/images/avatars", Some(&ed)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
