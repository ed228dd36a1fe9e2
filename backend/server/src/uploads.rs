//! # Uploads
//!
//! Campaign images and payment QR codes.
//!
//! Files are kept in process memory and addressed by a random URL, so a URL only lives as long as
//! the server process. Nothing durable sits behind it.
//!
//! ## Limits
//! - Images up to 5 MiB, QR codes up to 2 MiB
//! - Only raster `image/*` types are taken, never SVG
//! - The store holds a fixed number of bytes in total, the oldest uploads go first once it is full
use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const MIB: usize = 1024 * 1024;
pub const IMAGE_LIMIT: usize = 5 * MIB;
pub const QR_LIMIT: usize = 2 * MIB;
pub const STORE_CAPACITY: usize = 256 * MIB;

pub const NOT_AN_IMAGE_MESSAGE: &str = "Please upload an image file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Qr,
}

impl UploadKind {
    pub fn limit(&self) -> usize {
        match self {
            UploadKind::Image => IMAGE_LIMIT,
            UploadKind::Qr => QR_LIMIT,
        }
    }

    pub fn too_large_message(&self) -> &'static str {
        match self {
            UploadKind::Image => "Image size should be less than 5MB",
            UploadKind::Qr => "QR code size should be less than 2MB",
        }
    }

    /// The field message for a file this kind refuses.
    pub fn check(&self, content_type: &str, size: usize) -> Result<(), &'static str> {
        if size > self.limit() {
            return Err(self.too_large_message());
        }

        if !is_raster_image(content_type) {
            return Err(NOT_AN_IMAGE_MESSAGE);
        }

        Ok(())
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Image => f.write_str("image"),
            UploadKind::Qr => f.write_str("qr"),
        }
    }
}

fn is_raster_image(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.strip_prefix("image/") {
        Some(subtype) => !subtype.is_empty() && !subtype.starts_with("svg"),
        None => false,
    }
}

/// A stored file as the form refers to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub url: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Default)]
struct Files {
    by_id: HashMap<String, StoredFile>,
    order: VecDeque<String>,
    bytes: usize,
}

pub struct UploadStore {
    capacity: usize,
    files: RwLock<Files>,
}

impl Default for UploadStore {
    fn default() -> Self {
        Self::with_capacity(STORE_CAPACITY)
    }
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            files: RwLock::default(),
        }
    }

    /// Keeps the file and hands back its URL. Callers check the file against its kind first.
    pub async fn put(&self, content_type: &str, bytes: Bytes) -> Upload {
        let id = Uuid::new_v4().to_string();
        let size = bytes.len();

        let mut files = self.files.write().await;
        while files.bytes + size > self.capacity {
            let Some(oldest) = files.order.pop_front() else {
                break;
            };
            if let Some(evicted) = files.by_id.remove(&oldest) {
                files.bytes -= evicted.bytes.len();
                debug!("Evicted upload {oldest}");
            }
        }

        files.bytes += size;
        files.order.push_back(id.clone());
        files.by_id.insert(
            id.clone(),
            StoredFile {
                content_type: content_type.to_string(),
                bytes,
            },
        );

        Upload {
            url: format!("/uploads/{id}"),
            size,
        }
    }

    pub async fn get(&self, id: &str) -> Option<StoredFile> {
        self.files.read().await.by_id.get(id).cloned()
    }

    pub async fn total_bytes(&self) -> usize {
        self.files.read().await.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(upload: &Upload) -> &str {
        upload.url.trim_start_matches("/uploads/")
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = UploadStore::new();
        let upload = store.put("image/png", Bytes::from_static(b"png")).await;

        assert_eq!(upload.size, 3);
        let file = store.get(id(&upload)).await.unwrap();
        assert_eq!(file.content_type, "image/png");
        assert_eq!(&file.bytes[..], b"png");
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn full_store_evicts_oldest_first() {
        let store = UploadStore::with_capacity(10);
        let first = store.put("image/png", Bytes::from_static(b"aaaa")).await;
        let second = store.put("image/png", Bytes::from_static(b"bbbb")).await;
        let third = store.put("image/png", Bytes::from_static(b"cccc")).await;

        assert!(store.get(id(&first)).await.is_none());
        assert!(store.get(id(&second)).await.is_some());
        assert!(store.get(id(&third)).await.is_some());
        assert_eq!(store.total_bytes().await, 8);
    }

    #[test]
    fn limits() {
        assert_eq!(UploadKind::Image.limit(), 5 * 1024 * 1024);
        assert_eq!(UploadKind::Qr.limit(), 2 * 1024 * 1024);
    }

    #[test]
    fn size_rules_are_per_kind() {
        assert_eq!(UploadKind::Image.check("image/png", IMAGE_LIMIT), Ok(()));
        assert_eq!(
            UploadKind::Image.check("image/png", IMAGE_LIMIT + 1),
            Err("Image size should be less than 5MB")
        );
        assert_eq!(UploadKind::Qr.check("image/png", QR_LIMIT), Ok(()));
        assert_eq!(
            UploadKind::Qr.check("image/png", QR_LIMIT + 1),
            Err("QR code size should be less than 2MB")
        );
    }

    #[test]
    fn only_raster_images_are_taken() {
        for content_type in ["image/png", "image/jpeg", "IMAGE/WEBP", "image/gif; charset=x"] {
            assert_eq!(UploadKind::Image.check(content_type, 10), Ok(()), "{content_type}");
        }

        for content_type in ["text/html", "image/svg+xml", "image/", "application/octet-stream", ""] {
            assert_eq!(
                UploadKind::Qr.check(content_type, 10),
                Err(NOT_AN_IMAGE_MESSAGE),
                "{content_type}"
            );
        }
    }
}
