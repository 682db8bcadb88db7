//! Bitstream download with all-or-nothing visibility
//!
//! [`download`] streams an asset's bitstream chunk by chunk to a temporary
//! file in the destination's directory and renames it into place only on
//! full success, so a failure never leaves a partial file at the
//! destination. The whole payload is never buffered in memory.

use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::session::Session;
use crate::types::{DownloadResult, EntityRef};
use futures::StreamExt;
use reqwest::{Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Download an asset's bitstream to `destination`
///
/// Writes to `<file name>.part` next to the destination and atomically
/// renames on success. On success the transferred byte count is verified
/// against the server-declared content length; a mismatch surfaces as
/// [`Error::Integrity`] and the partial file is discarded. If the server
/// declares no length the verification is skipped.
///
/// Stream interruptions surface as [`Error::RemoteRead`] and are retried
/// within the session's budget, restarting the transfer from scratch.
/// Local storage faults surface as [`Error::IoWrite`] immediately, without
/// retry. The file handle and remote stream are scoped to each attempt and
/// released on every exit path.
pub async fn download(
    session: &Session,
    asset: &EntityRef,
    destination: &Path,
) -> Result<DownloadResult> {
    let partial = partial_path(destination)?;
    with_retry(session.retry(), || {
        attempt(session, asset, destination, &partial)
    })
    .await
}

async fn attempt(
    session: &Session,
    asset: &EntityRef,
    destination: &Path,
    partial: &Path,
) -> Result<DownloadResult> {
    let path = format!(
        "/api/entity/entities/{}/content",
        urlencoding::encode(asset.as_str())
    );
    let response = session.get(&path).await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(asset.to_string()));
    }
    let response = response.error_for_status()?;
    let declared = response.content_length();

    let written = match stream_to_file(response, partial).await {
        Ok(written) => written,
        Err(e) => {
            discard_partial(partial).await;
            return Err(e);
        }
    };

    if let Some(expected) = declared {
        if written != expected {
            discard_partial(partial).await;
            return Err(Error::Integrity {
                expected,
                actual: written,
            });
        }
    }

    if let Err(e) = tokio::fs::rename(partial, destination).await {
        discard_partial(partial).await;
        return Err(Error::IoWrite(e));
    }

    tracing::info!(
        asset = %asset,
        path = %destination.display(),
        bytes = written,
        "download complete"
    );
    Ok(DownloadResult {
        path: destination.to_path_buf(),
        bytes_written: written,
    })
}

/// Stream the response body into `partial`, returning the byte count
///
/// Chunk faults from the remote stream map to [`Error::RemoteRead`]; file
/// faults map to [`Error::IoWrite`] via `From`.
async fn stream_to_file(response: Response, partial: &Path) -> Result<u64> {
    let mut file = File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            Error::RemoteRead(format!("bitstream interrupted after {written} bytes: {e}"))
        })?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Best-effort removal of a partial file; never masks the original error
async fn discard_partial(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %partial.display(),
                error = %e,
                "could not remove partial download"
            );
        }
    }
}

/// Temporary path in the same directory as the destination
fn partial_path(destination: &Path) -> Result<PathBuf> {
    let name = destination.file_name().ok_or_else(|| {
        Error::IoWrite(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "destination path has no file name",
        ))
    })?;
    let mut partial_name = name.to_os_string();
    partial_name.push(".part");
    Ok(destination.with_file_name(partial_name))
}
