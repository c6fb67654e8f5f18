//! Thin wrappers over the accounting resource endpoints
//!
//! Bodies and responses are passed through as JSON.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::Value;

use super::client::{ApiClient, RequestOptions};
use super::errors::ApiError;

/// CRUD collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Contacts,
    Products,
    Invoices,
    Accounts,
    Taxes,
}

impl Resource {
    pub const ALL: [Self; 5] =
        [Self::Contacts, Self::Products, Self::Invoices, Self::Accounts, Self::Taxes];

    pub fn path(self) -> &'static str {
        match self {
            Self::Contacts => "/contacts",
            Self::Products => "/products",
            Self::Invoices => "/invoices",
            Self::Accounts => "/accounts",
            Self::Taxes => "/taxes",
        }
    }

    fn name(self) -> &'static str {
        &self.path()[1..]
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().trim_start_matches('/').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| format!("unknown resource: {value}"))
    }
}

/// Report endpoints under `/reports`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    ProfitLoss,
    BalanceSheet,
    Aging,
    Dashboard,
}

impl ReportKind {
    pub const ALL: [Self; 4] = [Self::ProfitLoss, Self::BalanceSheet, Self::Aging, Self::Dashboard];

    pub fn path(self) -> &'static str {
        match self {
            Self::ProfitLoss => "/reports/profit-loss",
            Self::BalanceSheet => "/reports/balance-sheet",
            Self::Aging => "/reports/aging",
            Self::Dashboard => "/reports/dashboard",
        }
    }

    fn name(self) -> &'static str {
        &self.path()["/reports/".len()..]
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| format!("unknown report: {value}"))
    }
}

/// CRUD calls for one [`Resource`]
pub struct ResourceApi<'a> {
    client: &'a ApiClient,
    resource: Resource,
}

impl<'a> ResourceApi<'a> {
    pub fn new(client: &'a ApiClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.resource.path(), id)
    }

    pub async fn list(&self, query: &[(String, String)]) -> Result<Value, ApiError> {
        let options = RequestOptions { query: query.to_vec(), ..RequestOptions::default() };
        self.client.request(Method::GET, self.resource.path(), options).await
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.client.request(Method::GET, &self.item_path(id), RequestOptions::new()).await
    }

    pub async fn create(&self, body: Value) -> Result<Value, ApiError> {
        let options = RequestOptions::new().body(body);
        self.client.request(Method::POST, self.resource.path(), options).await
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<Value, ApiError> {
        let options = RequestOptions::new().body(body);
        self.client.request(Method::PUT, &self.item_path(id), options).await
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.client.request(Method::DELETE, &self.item_path(id), RequestOptions::new()).await
    }
}

/// Fetch a report, passing filters (date range, as-of date) as query pairs
pub async fn fetch_report(
    client: &ApiClient,
    kind: ReportKind,
    query: &[(String, String)],
) -> Result<Value, ApiError> {
    let options = RequestOptions { query: query.to_vec(), ..RequestOptions::default() };
    client.request(Method::GET, kind.path(), options).await
}
