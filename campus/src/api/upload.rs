//! Multipart file parts with upload progress.

use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::Part;
use reqwest::Body;
use tokio_stream::StreamExt;

use super::ApiError;

/// Receives upload progress as a whole percentage.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

const CHUNK_SIZE: usize = 16 * 1024;

/// Read `path` into a multipart part, reporting progress as it is sent.
pub async fn file_part(path: &Path, progress: Option<ProgressFn>) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let total = bytes.len() as u64;
    let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();

    let mut sent = 0u64;
    let stream = tokio_stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(report) = &progress {
            report(percent(sent, total));
        }
        Ok::<_, std::io::Error>(chunk)
    });

    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().to_string());

    Part::stream_with_length(Body::wrap_stream(stream), total)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .map_err(ApiError::Network)
}

#[allow(clippy::cast_possible_truncation)]
fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent * 100 + total / 2) / total).min(100) as u8
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
