use koshflow_infra::{fetch_report, ReportKind, RequestOptions, Resource, ResourceApi};
use reqwest::Method;
use serde_json::Value;

use crate::context::AppContext;

/// `GET <path>`, retried on transient failures
pub async fn get(
    ctx: &AppContext,
    path: &str,
    query: Vec<(String, String)>,
) -> anyhow::Result<Value> {
    ctx.require_session().await?;

    let options = RequestOptions { query, ..RequestOptions::default() };
    let client = &ctx.client;
    let value = ctx.retry.run(|| client.request(Method::GET, path, options.clone())).await?;
    Ok(value)
}

pub async fn list(
    ctx: &AppContext,
    resource: Resource,
    query: &[(String, String)],
) -> anyhow::Result<Value> {
    ctx.require_session().await?;

    let api = ResourceApi::new(&ctx.client, resource);
    Ok(ctx.retry.run(|| api.list(query)).await?)
}

pub async fn report(
    ctx: &AppContext,
    kind: ReportKind,
    query: &[(String, String)],
) -> anyhow::Result<Value> {
    ctx.require_session().await?;

    let client = &ctx.client;
    Ok(ctx.retry.run(|| fetch_report(client, kind, query)).await?)
}
