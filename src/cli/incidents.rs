//! `incidents` command: one-shot listing with a headline summary.

use super::output;
use super::IncidentsArgs;
use crate::client::ApiClient;
use crate::stats::IncidentStats;

pub async fn handle_incidents(args: &IncidentsArgs, client: &ApiClient) -> anyhow::Result<String> {
    let incidents = client.fetch_incidents().await?;

    if args.json {
        return Ok(output::format_incidents_json(&incidents));
    }

    let stats = IncidentStats::from_incidents(&incidents);
    Ok(format!(
        "{}\n{}",
        output::format_incident_stats(&stats),
        output::format_incidents_table(&incidents)
    ))
}
