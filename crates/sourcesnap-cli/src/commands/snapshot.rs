//! `sourcesnap snapshot`: one direct snapshot run.

use anyhow::anyhow;
use sourcesnap_api::{SnapshotCreatedResponse, SnapshotService};
use sourcesnap_core::{OriginRepo, SnapshotRequest};

use crate::cli::{OutputFormat, SnapshotArgs};
use crate::client::{CliError, CliResult, snapshot_service};
use crate::output::render_snapshot;

pub(crate) async fn handle_snapshot(args: &SnapshotArgs, format: OutputFormat) -> CliResult<()> {
    let created = execute_snapshot(args).await?;
    render_snapshot(&created, format)
}

pub(crate) async fn execute_snapshot(args: &SnapshotArgs) -> CliResult<SnapshotCreatedResponse> {
    args.check_limits()?;
    let origin_token = args.origin_token()?;
    let request = SnapshotRequest::new(
        OriginRepo::new(args.owner.trim(), args.repo.trim()),
        args.git_ref.trim(),
        &args.path,
        args.segments.iter().map(|segment| segment.trim()),
    )?;
    let service = snapshot_service(args)?;

    let result = service
        .snapshot(request, origin_token)
        .await
        .map_err(|err| CliError::failure(anyhow!(err).context("snapshot failed")))?;
    Ok(SnapshotCreatedResponse::from(&result))
}
