//! Full metadata retrieval for a single entity
//!
//! Traversal list pages carry abbreviated records; [`fetch`] resolves a
//! reference to the fully populated record. It is a paid round trip per
//! entity — avoid calling it inside a tight loop over a huge tree unless
//! the detail is actually required.

use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::session::Session;
use crate::types::{EntityRef, FullEntity};
use reqwest::StatusCode;

/// Fetch every metadata field for one entity
///
/// Idempotent: repeated calls with the same still-valid reference return
/// equal data modulo server-side mutation. A reference that no longer
/// resolves (e.g., concurrent deletion mid-traversal) surfaces as
/// [`Error::NotFound`]; transient transport faults are retried within the
/// session's budget.
pub async fn fetch(session: &Session, reference: &EntityRef) -> Result<FullEntity> {
    with_retry(session.retry(), || fetch_once(session, reference)).await
}

async fn fetch_once(session: &Session, reference: &EntityRef) -> Result<FullEntity> {
    let path = format!(
        "/api/entity/entities/{}",
        urlencoding::encode(reference.as_str())
    );
    let response = session.get(&path).await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(reference.to_string()));
    }
    let response = response.error_for_status()?;
    Ok(response.json::<FullEntity>().await?)
}
