//! Result renderers.

use sourcesnap_api::SnapshotCreatedResponse;

use crate::cli::OutputFormat;
use crate::client::CliResult;

pub(crate) fn render_snapshot(
    created: &SnapshotCreatedResponse,
    format: OutputFormat,
) -> CliResult<()> {
    println!("{}", format_snapshot(created, format)?);
    Ok(())
}

fn format_snapshot(created: &SnapshotCreatedResponse, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(created)?,
        OutputFormat::Table => format!(
            "container: {}\nprefix: {}\nfiles: {}\nurl: {}",
            created.container, created.prefix, created.file_count, created.url
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn created() -> SnapshotCreatedResponse {
        SnapshotCreatedResponse {
            container: "bucket".to_string(),
            prefix: "user/42/job1".to_string(),
            file_count: 3,
            url: "file:///srv/bucket/user/42/job1".to_string(),
        }
    }

    #[test]
    fn json_output_matches_api_body() -> Result<()> {
        let text = format_snapshot(&created(), OutputFormat::Json)?;
        let parsed: SnapshotCreatedResponse = serde_json::from_str(&text)?;
        assert_eq!(parsed, created());
        Ok(())
    }

    #[test]
    fn table_output_lists_fields() -> Result<()> {
        let text = format_snapshot(&created(), OutputFormat::Table)?;
        assert!(text.contains("prefix: user/42/job1"));
        assert!(text.contains("files: 3"));
        Ok(())
    }
}
