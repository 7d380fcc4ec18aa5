use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const PRESIGN_TTL_SECS: u64 = 30 * 60;
pub const KEY_PREFIX: &str = "plans/";

/// An image file received from a multipart form.
pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
    pub file_name: Option<&'a str>,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

fn ext_from_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "avif" => Some("avif"),
        _ => None,
    }
}

/// Checks size and type, returning the extension to store under.
pub fn accept_image(item: &UploadItem<'_>) -> AppResult<&'static str> {
    if item.body.is_empty() {
        return Err(AppError::invalid("image", "Image file is empty"));
    }
    if item.body.len() > MAX_IMAGE_BYTES {
        return Err(AppError::invalid("image", "Image must be 10 MB or smaller"));
    }
    ext_from_mime(item.content_type)
        .or_else(|| item.file_name.and_then(ext_from_name))
        .ok_or_else(|| {
            AppError::invalid(
                "image",
                "Only image files (jpg, jpeg, png, webp, avif) are allowed",
            )
        })
}

/// Stores a plan image and returns its object key.
pub async fn store_plan_image(st: &AppState, item: UploadItem<'_>) -> AppResult<String> {
    let ext = accept_image(&item)?;
    let key = format!("{KEY_PREFIX}{}.{}", Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, item.body, item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    info!(%key, "plan image stored");
    Ok(key)
}

/// Deletes an object, logging instead of failing.
pub async fn remove_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = ?e, %key, "image delete failed");
    }
}

/// Only keys this service wrote may be served back.
pub fn is_servable_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
        && !key.contains("..")
        && key.len() > KEY_PREFIX.len()
        && ext_from_name(key).is_some()
}

pub async fn presign(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for key {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item<'a>(len: usize, ct: &'a str, name: Option<&'a str>) -> UploadItem<'a> {
        UploadItem {
            body: Bytes::from(vec![0u8; len]),
            content_type: ct,
            file_name: name,
        }
    }

    #[test]
    fn mime_and_name_mapping() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/avif"), Some("avif"));
        assert_eq!(ext_from_mime("image/heic"), None);
        assert_eq!(ext_from_name("cover.JPEG"), Some("jpg"));
        assert_eq!(ext_from_name("cover"), None);
    }

    #[test]
    fn image_acceptance() {
        assert_eq!(accept_image(&item(10, "image/png", None)).unwrap(), "png");
        // browsers sometimes send octet-stream; fall back to the file name
        assert_eq!(
            accept_image(&item(10, "application/octet-stream", Some("a.webp"))).unwrap(),
            "webp"
        );
        assert!(accept_image(&item(10, "application/pdf", Some("a.pdf"))).is_err());
        assert!(accept_image(&item(0, "image/png", None)).is_err());
        assert!(accept_image(&item(MAX_IMAGE_BYTES + 1, "image/png", None)).is_err());
    }

    #[test]
    fn servable_keys() {
        assert!(is_servable_key("plans/0b4f.webp"));
        assert!(!is_servable_key("plans/../secrets.png"));
        assert!(!is_servable_key("other/x.png"));
        assert!(!is_servable_key("plans/x.exe"));
    }

    #[tokio::test]
    async fn store_uses_plan_prefix() {
        let state = AppState::fake();
        let key = store_plan_image(&state, item(4, "image/jpeg", None))
            .await
            .unwrap();
        assert!(key.starts_with("plans/"));
        assert!(key.ends_with(".jpg"));
        let url = presign(&state, &key).await.unwrap();
        assert!(url.contains(&key));
    }
}
