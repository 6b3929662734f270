use std::future::Future;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};

use super::{AccessToken, SObject, Soql};

/// Record-level operations against the Salesforce REST API.
///
/// The reconciliation workflow is written against this trait so the same
/// orchestration runs against the live org or an in-memory backend.
pub trait RecordApi: Send + Sync {
    /// Run a query and return the first page of records, or None when nothing matches.
    fn query(&self, soql: &Soql) -> impl Future<Output = Result<Option<Vec<Value>>>> + Send;

    /// Create one record and return its id.
    fn create(&self, object: SObject, fields: Value) -> impl Future<Output = Result<String>> + Send;

    /// Update one record by id and return the response body (`null` for 204).
    fn update(
        &self,
        object: SObject,
        id: &str,
        fields: Value,
    ) -> impl Future<Output = Result<Value>> + Send;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "totalSize", default)]
    total_size: u64,
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Debug, Clone)]
pub struct SalesforceClient {
    client: Client,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl SalesforceClient {
    pub fn new(client: Client, token: &AccessToken, api_version: &str) -> Self {
        Self {
            client,
            instance_url: token.instance_url.trim_end_matches('/').to_string(),
            access_token: token.access_token.clone(),
            api_version: api_version.to_string(),
        }
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    pub fn sobject_url(&self, object: SObject, id: Option<&str>) -> String {
        match id {
            Some(id) => self.data_url(&format!("sobjects/{}/{}", object, id)),
            None => self.data_url(&format!("sobjects/{}", object)),
        }
    }
}

/// Log and convert a non-2xx response.
async fn upstream_error(object: SObject, action: &str, response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Error {} {}: HTTP {} {}", action, object, status, body);
    AppError::Upstream {
        object: object.to_string(),
        status,
        body,
    }
}

impl RecordApi for SalesforceClient {
    async fn query(&self, soql: &Soql) -> Result<Option<Vec<Value>>> {
        let object = soql.object();
        let q = soql.to_string();
        tracing::debug!("Querying {}: {}", object, q);

        let response = self
            .client
            .get(self.data_url("query"))
            .bearer_auth(&self.access_token)
            .query(&[("q", q.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error querying {} records: {}", object, e);
                AppError::from(e)
            })?;

        if !response.status().is_success() {
            return Err(upstream_error(object, "querying", response).await);
        }

        let page: QueryResponse = response.json().await?;
        if page.records.len() as u64 != page.total_size {
            tracing::debug!(
                "{} query returned {} of {} records (first page only)",
                object,
                page.records.len(),
                page.total_size
            );
        }

        if page.records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(page.records))
        }
    }

    async fn create(&self, object: SObject, fields: Value) -> Result<String> {
        let response = self
            .client
            .post(self.sobject_url(object, None))
            .bearer_auth(&self.access_token)
            .json(&fields)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error creating {}: {}", object, e);
                AppError::from(e)
            })?;

        if !response.status().is_success() {
            return Err(upstream_error(object, "creating", response).await);
        }

        let created: CreateResponse = response.json().await?;
        tracing::info!("{} created: {}", object, created.id);
        Ok(created.id)
    }

    async fn update(&self, object: SObject, id: &str, fields: Value) -> Result<Value> {
        let response = self
            .client
            .patch(self.sobject_url(object, Some(id)))
            .bearer_auth(&self.access_token)
            .json(&fields)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error updating {} {}: {}", object, id, e);
                AppError::from(e)
            })?;

        if !response.status().is_success() {
            return Err(upstream_error(object, "updating", response).await);
        }

        let text = response.text().await?;
        tracing::info!("{} updated: {}", object, id);
        if text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SalesforceClient {
        let token = AccessToken {
            access_token: "00Dxx!token".to_string(),
            instance_url: "https://acme.my.salesforce.com/".to_string(),
        };
        SalesforceClient::new(Client::new(), &token, "v60.0")
    }

    #[test]
    fn sobject_urls() {
        let client = client();
        assert_eq!(
            client.sobject_url(SObject::PaymentAuthorization, None),
            "https://acme.my.salesforce.com/services/data/v60.0/sobjects/PaymentAuthorization"
        );
        assert_eq!(
            client.sobject_url(SObject::CardPaymentMethod, Some("03O000000000001")),
            "https://acme.my.salesforce.com/services/data/v60.0/sobjects/CardPaymentMethod/03O000000000001"
        );
    }
}
