//! Migrate command implementation.

use super::{CliResult, Target};
use tracing::info;

/// Copies every record of `source` into `destination`.
///
/// Records already in the destination are kept unless the source has the
/// same root key, in which case the source value wins.
pub async fn run(source: &Target, destination: &Target) -> CliResult<String> {
    info!(
        from = ?source.kind,
        to = ?destination.kind,
        "migrating records"
    );

    let from = source.open().await?;
    let to = destination.open().await?;
    let copied = to.import_from(from.backend().as_ref()).await;

    from.close().await?;
    to.close().await?;

    let copied = copied?;
    Ok(format!("Copied {copied} record(s)"))
}
