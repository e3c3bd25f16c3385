//! `trace` command: correlate every event recorded under a request id.

use super::output;
use super::TraceArgs;
use crate::client::ApiClient;
use crate::trace;

pub async fn handle_trace(args: &TraceArgs, client: &ApiClient) -> anyhow::Result<String> {
    let response = trace::lookup(client, &args.request_id).await?;

    if args.json {
        Ok(output::format_trace_json(&response))
    } else {
        Ok(output::format_trace_table(&response))
    }
}
