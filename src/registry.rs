use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::constants::USER_AGENT;

/// One taxonomy entry of a registry record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyRecord {
    pub code: String,
    pub description: String,
    pub primary: Option<bool>,
    pub state: String,
    pub license: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Invalid(String),
    Found(String, Vec<TaxonomyRecord>),
    NotFound(String),
}

/// Source of taxonomy data for a well-formed NPI.
///
/// Implementations absorb their own failures: anything short of a usable
/// result is reported as [`LookupOutcome::NotFound`].
pub trait TaxonomyLookup {
    async fn lookup(&self, npi: &str) -> LookupOutcome;
}

#[derive(Debug, Deserialize)]
struct NpiApiResponse {
    #[serde(default)]
    result_count: i64,
    #[serde(default)]
    results: Vec<NpiResult>,
}

#[derive(Debug, Deserialize)]
struct NpiResult {
    #[serde(default)]
    taxonomies: Vec<NpiTaxonomy>,
}

#[derive(Debug, Deserialize)]
struct NpiTaxonomy {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    desc: Option<Value>,
    #[serde(default)]
    primary: Option<Value>,
    #[serde(default)]
    state: Option<Value>,
    #[serde(default)]
    license: Option<Value>,
}

impl From<NpiTaxonomy> for TaxonomyRecord {
    fn from(raw: NpiTaxonomy) -> Self {
        Self {
            code: text_field(raw.code.as_ref()),
            description: text_field(raw.desc.as_ref()),
            primary: raw.primary.as_ref().and_then(primary_flag),
            state: text_field(raw.state.as_ref()),
            license: text_field(raw.license.as_ref()),
        }
    }
}

/// Registry fields are nominally strings but are read leniently: scalars are
/// rendered as text, null and nested values become empty.
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn primary_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// NPPES registry client. One GET per lookup, no retries.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    api_base_url: String,
    api_version: String,
}

impl RegistryClient {
    pub fn new(api_base_url: &str, api_version: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed creating HTTP client")?;
        Ok(Self {
            client,
            api_base_url: api_base_url.to_string(),
            api_version: api_version.to_string(),
        })
    }

    async fn fetch_taxonomies(&self, npi: &str) -> Result<Option<Vec<TaxonomyRecord>>> {
        let resp = self
            .client
            .get(&self.api_base_url)
            .query(&[("number", npi), ("version", self.api_version.as_str())])
            .send()
            .await
            .with_context(|| format!("NPI API request failed for {npi}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("NPI API status {status} for {npi}"));
        }

        let body: NpiApiResponse = resp
            .json()
            .await
            .with_context(|| format!("Invalid NPI API JSON for {npi}"))?;
        Ok(taxonomies_from_response(body))
    }
}

impl TaxonomyLookup for RegistryClient {
    async fn lookup(&self, npi: &str) -> LookupOutcome {
        match self.fetch_taxonomies(npi).await {
            Ok(Some(records)) => LookupOutcome::Found(npi.to_string(), records),
            Ok(None) => LookupOutcome::NotFound(npi.to_string()),
            Err(err) => {
                tracing::warn!(npi, error = %format!("{err:#}"), "registry lookup failed");
                LookupOutcome::NotFound(npi.to_string())
            }
        }
    }
}

fn taxonomies_from_response(body: NpiApiResponse) -> Option<Vec<TaxonomyRecord>> {
    if body.result_count <= 0 {
        return None;
    }
    let first = body.results.into_iter().next()?;
    let records: Vec<TaxonomyRecord> = first
        .taxonomies
        .into_iter()
        .map(TaxonomyRecord::from)
        .collect();
    if records.is_empty() {
        None
    } else {
        Some(records)
    }
}
