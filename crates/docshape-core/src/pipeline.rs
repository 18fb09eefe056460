//! The conversion pipeline
//!
//! One request is one run: resolve a usable bearer token, fetch the export,
//! parse it, fetch and parse the schema it names, transform, render, and
//! deliver. Calls are sequential; the only retry anywhere is the single
//! token refresh below.

use tracing::{info, instrument, warn};

use crate::client::Upstream;
use crate::document;
use crate::error::{Error, Result};
use crate::render;
use crate::schema::Schema;
use crate::transform;

/// Convert one annotated document end to end.
///
/// Token handling follows the capture API's session rules: a preset token is
/// tried first, and a 401 answer (or having no preset token at all) triggers
/// exactly one login for a fresh token plus one refetch. Whatever status the
/// final export attempt reports, anything other than 200 surfaces as
/// [`Error::Upstream`] carrying that status.
#[instrument(skip(upstream, preset_token))]
pub async fn run_export<U>(
    upstream: &U,
    preset_token: Option<&str>,
    queue_id: &str,
    annotation_id: &str,
) -> Result<()>
where
    U: Upstream + ?Sized,
{
    let (token, status, body) =
        fetch_with_refresh(upstream, preset_token, queue_id, annotation_id).await?;

    if status != 200 {
        return Err(Error::Upstream {
            message: format!("export request answered {}", status),
            status: Some(status),
            source: None,
        });
    }

    let document = document::parse(&body)?;
    let schema_url = document.schema_url().ok_or(Error::SchemaUrlMissing)?;

    let schema_json = upstream.fetch_schema(schema_url, &token).await?;
    let schema = Schema::from_value(schema_json)?;

    let output = transform::transform(&document, &schema);
    let xml = render::to_pretty_xml(&output)?;

    upstream.deliver(&xml, annotation_id).await?;
    info!(annotation_id, queue_id, "export converted and delivered");
    Ok(())
}

async fn fetch_with_refresh<U>(
    upstream: &U,
    preset_token: Option<&str>,
    queue_id: &str,
    annotation_id: &str,
) -> Result<(String, u16, String)>
where
    U: Upstream + ?Sized,
{
    if let Some(token) = preset_token {
        let (status, body) = upstream
            .fetch_export(queue_id, annotation_id, token)
            .await?;
        if status != 401 {
            return Ok((token.to_string(), status, body));
        }
        warn!("preset token rejected, logging in for a fresh one");
    }

    let token = upstream.login().await?;
    let (status, body) = upstream
        .fetch_export(queue_id, annotation_id, &token)
        .await?;
    Ok((token, status, body))
}
