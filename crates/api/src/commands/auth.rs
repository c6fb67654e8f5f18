use koshflow_domain::{LoginRequest, RegisterRequest};
use serde_json::{json, Value};

use crate::cli::RegisterArgs;
use crate::context::AppContext;

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> anyhow::Result<Value> {
    let response = ctx.auth.login(&LoginRequest::new(email, password)).await?;
    Ok(json!({ "user": response.user, "company": response.company }))
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> anyhow::Result<Value> {
    let request = RegisterRequest {
        name: args.name,
        email: args.email,
        password: args.password,
        company_name: args.company_name,
        gstin: args.gstin,
        phone: args.phone,
    };
    let response = ctx.auth.register(&request).await?;
    Ok(json!({ "user": response.user, "company": response.company }))
}

pub async fn logout(ctx: &AppContext) -> anyhow::Result<Value> {
    // Load the stored pair so the server-side revoke has a token to send.
    ctx.client.tokens().initialize().await.map_err(koshflow_infra::ApiError::from)?;
    ctx.auth.logout().await?;
    Ok(json!({ "loggedOut": true }))
}

pub async fn whoami(ctx: &AppContext) -> anyhow::Result<Value> {
    let profile = ctx.require_session().await?;
    Ok(serde_json::to_value(profile)?)
}
