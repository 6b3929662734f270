use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AppError, Result, msg};

use super::is_valid_shop_domain;

const LATEST_METAOBJECT_QUERY: &str = r#"
query LatestMetaobject($type: String!) {
  metaobjects(type: $type, first: 1, reverse: true, sortKey: "updated_at") {
    edges {
      node {
        id
        fields {
          key
          value
        }
      }
    }
  }
}
"#;

const METAOBJECTS_QUERY: &str = r#"
query Metaobjects($type: String!) {
  metaobjects(type: $type, first: 10, reverse: true, sortKey: "updated_at") {
    edges {
      node {
        id
        handle
        updatedAt
        fields {
          key
          value
        }
      }
    }
  }
}
"#;

const METAOBJECT_DEFINITIONS_QUERY: &str = r#"
query MetaobjectDefinitions {
  metaobjectDefinitions(first: 50) {
    edges {
      node {
        id
        name
        type
        fieldDefinitions {
          key
          name
        }
      }
    }
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MetaobjectsData {
    metaobjects: Connection<MetaobjectNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct MetaobjectNode {
    fields: Vec<MetaobjectField>,
}

#[derive(Debug, Deserialize)]
struct MetaobjectField {
    key: String,
    value: Option<String>,
}

/// Admin GraphQL client for one shop, authenticated with its offline token.
#[derive(Debug, Clone)]
pub struct ShopifyAdminClient {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl ShopifyAdminClient {
    pub fn new(client: Client, shop: &str, api_version: &str, access_token: &str) -> Result<Self> {
        if !is_valid_shop_domain(shop) {
            return Err(AppError::BadRequest(msg::INVALID_SHOP_DOMAIN.into()));
        }

        Ok(Self {
            client,
            endpoint: format!("https://{}/admin/api/{}/graphql.json", shop, api_version),
            access_token: access_token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a query or mutation and return its `data`. GraphQL-level errors are
    /// reported as failures even when the HTTP status is 200.
    pub async fn graphql(&self, query: &str, variables: Option<&Value>) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| AppError::Shopify(format!("GraphQL request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Shopify(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| AppError::Shopify(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = body.errors {
            return Err(AppError::Shopify(format!("GraphQL errors: {}", errors)));
        }

        body.data
            .ok_or_else(|| AppError::Shopify("GraphQL response has no data".into()))
    }

    /// Fields of the most recently updated metaobject of `metaobject_type`,
    /// folded into a key/value map. None when no such metaobject exists.
    pub async fn latest_metaobject_fields(
        &self,
        metaobject_type: &str,
    ) -> Result<Option<HashMap<String, String>>> {
        let variables = json!({ "type": metaobject_type });
        let data = self
            .graphql(LATEST_METAOBJECT_QUERY, Some(&variables))
            .await?;
        let data: MetaobjectsData = serde_json::from_value(data)?;

        Ok(data
            .metaobjects
            .edges
            .into_iter()
            .next()
            .map(|edge| fold_fields(edge.node.fields)))
    }

    pub async fn metaobjects(&self, metaobject_type: &str) -> Result<Value> {
        let variables = json!({ "type": metaobject_type });
        self.graphql(METAOBJECTS_QUERY, Some(&variables)).await
    }

    pub async fn metaobject_definitions(&self) -> Result<Value> {
        self.graphql(METAOBJECT_DEFINITIONS_QUERY, None).await
    }
}

fn fold_fields(fields: Vec<MetaobjectField>) -> HashMap<String, String> {
    fields
        .into_iter()
        .filter_map(|f| f.value.map(|v| (f.key, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uses_shop_and_version() {
        let client =
            ShopifyAdminClient::new(Client::new(), "acme.myshopify.com", "2023-07", "shpat_x")
                .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://acme.myshopify.com/admin/api/2023-07/graphql.json"
        );
    }

    #[test]
    fn rejects_non_shop_hosts() {
        let result = ShopifyAdminClient::new(Client::new(), "internal.corp", "2023-07", "t");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn metaobject_fields_fold_into_map() {
        let data: MetaobjectsData = serde_json::from_value(json!({
            "metaobjects": { "edges": [ { "node": { "id": "gid://1", "fields": [
                { "key": "instance_url", "value": "https://acme.my.salesforce.com" },
                { "key": "client_id", "value": "cid" },
                { "key": "client_secret", "value": null }
            ] } } ] }
        }))
        .unwrap();

        let node = data.metaobjects.edges.into_iter().next().unwrap().node;
        let fields = fold_fields(node.fields);
        assert_eq!(fields["instance_url"], "https://acme.my.salesforce.com");
        assert_eq!(fields["client_id"], "cid");
        assert!(!fields.contains_key("client_secret"));
    }
}
