//! `slo` command: one-shot lifecycle SLO verdict.

use super::output;
use super::SloArgs;
use crate::client::ApiClient;

pub async fn handle_slo(args: &SloArgs, client: &ApiClient) -> anyhow::Result<String> {
    let slo = client.fetch_slo().await?;

    if args.json {
        Ok(output::format_slo_json(&slo))
    } else {
        Ok(output::format_slo_table(&slo))
    }
}
