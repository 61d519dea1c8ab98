use std::collections::BTreeMap;

use async_trait::async_trait;
use common::Money;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{CatalogClient, CatalogError, Component, ComponentId, Result, Service, ServiceId};

#[derive(Debug, Deserialize)]
struct RawComponent {
    id: Value,
    name: String,
    purchase_price: Value,
    repair_price: Value,
    #[serde(default)]
    stock_quantity: u32,
}

#[derive(Debug, Deserialize)]
struct RawService {
    service: String,
    approx_charges: Value,
}

/// Catalog served by the workshop back office over HTTP.
///
/// Prices arrive as decimal strings or numbers and are converted exactly.
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("workshop-catalog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `segments` onto the base URL, percent-encoding each one.
    ///
    /// A trailing empty segment keeps the back office's trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CatalogError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<Option<T>> {
        tracing::debug!(%url, operation, "catalog request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                operation,
                status: status.as_u16(),
            });
        }

        Ok(Some(response.json().await?))
    }
}

/// Ids that cannot name a single path segment never match a catalog record.
fn is_addressable(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".."
}

fn id_from_json(value: &Value) -> Result<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(CatalogError::InvalidRecord(format!("bad id {other}"))),
    }
}

fn money_from_json(field: &str, value: &Value) -> Result<Money> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(CatalogError::InvalidRecord(format!(
                "{field} is not a number: {other}"
            )));
        }
    };
    Money::parse_decimal(&text)
        .map_err(|e| CatalogError::InvalidRecord(format!("{field}: {e}")))
}

impl TryFrom<RawComponent> for Component {
    type Error = CatalogError;

    fn try_from(raw: RawComponent) -> Result<Self> {
        Ok(Component {
            id: ComponentId::new(id_from_json(&raw.id)?),
            name: raw.name,
            purchase_price: money_from_json("purchase_price", &raw.purchase_price)?,
            repair_price: money_from_json("repair_price", &raw.repair_price)?,
            stock_quantity: raw.stock_quantity,
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_component(&self, id: &ComponentId) -> Result<Option<Component>> {
        if !is_addressable(id.as_str()) {
            return Ok(None);
        }
        let url = self.endpoint(&["api", "components", id.as_str(), ""])?;
        let Some(raw) = self.get_json::<RawComponent>("get_component", url).await? else {
            return Ok(None);
        };

        let component = Component::try_from(raw)?;
        if &component.id != id {
            tracing::warn!(
                requested = %id,
                returned = %component.id,
                "catalog answered with another component"
            );
            return Ok(None);
        }
        Ok(Some(component))
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        let raw: Vec<RawComponent> = self
            .get_json("list_components", self.endpoint(&["api", "components", ""])?)
            .await?
            .ok_or(CatalogError::Status {
                operation: "list_components",
                status: StatusCode::NOT_FOUND.as_u16(),
            })?;
        raw.into_iter().map(Component::try_from).collect()
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        // Keyed by service id: {"1": {"service": "...", "approx_charges": "800.00"}}
        let raw: BTreeMap<String, RawService> = self
            .get_json("list_services", self.endpoint(&["pay", "services", ""])?)
            .await?
            .ok_or(CatalogError::Status {
                operation: "list_services",
                status: StatusCode::NOT_FOUND.as_u16(),
            })?;

        raw.into_iter()
            .map(|(id, raw)| {
                Ok(Service {
                    id: ServiceId::new(id),
                    name: raw.service,
                    approx_charge: money_from_json("approx_charges", &raw.approx_charges)?,
                })
            })
            .collect()
    }
}
