// ============================================================================
// BizDesk Infrastructure - OpenFactura Tax Document Source
// File: crates/bizdesk-infrastructure/src/gateways/openfactura.rs
// Description: Haulmer OpenFactura DTE listing and detail client
// ============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use bizdesk_core::domain::Direction;
use bizdesk_core::error::DomainError;
use bizdesk_core::gateways::{
    RemoteDocument, RemoteDocumentItem, RemoteDocumentPage, RemoteDocumentSummary, TaxDocumentSource,
};
use bizdesk_shared::config::OpenFacturaSettings;

use super::{ensure_success, http_client, network_error};

const SERVICE: &str = "openfactura";

pub struct OpenFacturaSource {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ListRequest {
    #[serde(rename = "Page")]
    page: String,
    #[serde(rename = "FchEmis")]
    issue_date: DateRange,
}

#[derive(Serialize)]
struct DateRange {
    gte: String,
    lte: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default = "first_page")]
    current_page: u32,
    #[serde(default = "first_page")]
    last_page: u32,
    #[serde(default)]
    data: Vec<Value>,
}

fn first_page() -> u32 {
    1
}

impl OpenFacturaSource {
    pub fn new(settings: &OpenFacturaSettings) -> Result<Self, DomainError> {
        Ok(Self {
            client: http_client("openfactura", settings.timeout_seconds)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn ensure_configured(&self) -> Result<(), DomainError> {
        if self.api_key.is_empty() {
            return Err(DomainError::external(SERVICE, "API key not configured"));
        }
        Ok(())
    }
}

#[async_trait]
impl TaxDocumentSource for OpenFacturaSource {
    async fn list_documents(
        &self,
        direction: Direction,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<RemoteDocumentPage, DomainError> {
        self.ensure_configured()?;

        let request = ListRequest {
            page: page.to_string(),
            issue_date: DateRange {
                gte: from.format("%Y-%m-%d").to_string(),
                lte: to.format("%Y-%m-%d").to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/v2/dte/document/{}", self.base_url, direction.as_str()))
            .header("apikey", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable list: {}", e)))?;

        let documents: Vec<RemoteDocumentSummary> = body.data.iter().filter_map(summary_of).collect();
        debug!(
            direction = direction.as_str(),
            page = body.current_page,
            last_page = body.last_page,
            documents = documents.len(),
            "OpenFactura page listed"
        );

        Ok(RemoteDocumentPage {
            current_page: body.current_page,
            last_page: body.last_page,
            documents,
        })
    }

    async fn fetch_document(
        &self,
        direction: Direction,
        summary: &RemoteDocumentSummary,
    ) -> Result<RemoteDocument, DomainError> {
        self.ensure_configured()?;

        let url = format!(
            "{}/v2/dte/document/{}/{}/{}/json",
            self.base_url,
            summary.emitter_rut.replace('.', ""),
            summary.document_type,
            summary.folio
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| DomainError::external(SERVICE, format!("unreadable document: {}", e)))?;

        debug!(direction = direction.as_str(), folio = summary.folio, "OpenFactura document fetched");
        map_document(summary, body)
    }
}

fn as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn summary_of(row: &Value) -> Option<RemoteDocumentSummary> {
    Some(RemoteDocumentSummary {
        document_type: i32::try_from(as_i64(row.get("TipoDTE"))?).ok()?,
        folio: as_i64(row.get("Folio"))?,
        emitter_rut: as_string(row.get("RUTEmisor"))?,
    })
}

/// Maps the DTE JSON (`Encabezado` + `Detalle`) into a remote document.
fn map_document(summary: &RemoteDocumentSummary, body: Value) -> Result<RemoteDocument, DomainError> {
    let root = body.get("json").unwrap_or(&body);
    let header = root
        .get("Encabezado")
        .ok_or_else(|| DomainError::external(SERVICE, "document has no Encabezado"))?;
    let id_doc = header.get("IdDoc");
    let emitter = header.get("Emisor");
    let receiver = header.get("Receptor");
    let totals = header.get("Totales");

    let issue_date = as_string(id_doc.and_then(|d| d.get("FchEmis")))
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .ok_or_else(|| DomainError::external(SERVICE, "document has no valid FchEmis"))?;

    let lines: Vec<&Value> = match root.get("Detalle") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    };

    let items = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| RemoteDocumentItem {
            line_number: as_i64(line.get("NroLinDet"))
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(i as i32 + 1),
            name: as_string(line.get("NmbItem")).unwrap_or_default(),
            description: as_string(line.get("DscItem")),
            quantity: as_f64(line.get("QtyItem")).unwrap_or(1.0),
            unit_price: as_f64(line.get("PrcItem")).unwrap_or(0.0),
            amount: as_i64(line.get("MontoItem")).unwrap_or(0),
        })
        .collect();

    let total = |key: &str| as_i64(totals.and_then(|t| t.get(key))).unwrap_or(0);

    Ok(RemoteDocument {
        document_type: as_i64(id_doc.and_then(|d| d.get("TipoDTE")))
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(summary.document_type),
        folio: as_i64(id_doc.and_then(|d| d.get("Folio"))).unwrap_or(summary.folio),
        emitter_rut: as_string(emitter.and_then(|e| e.get("RUTEmisor")))
            .unwrap_or_else(|| summary.emitter_rut.clone()),
        emitter_name: as_string(emitter.and_then(|e| e.get("RznSoc").or_else(|| e.get("RznSocEmisor"))))
            .unwrap_or_default(),
        receiver_rut: as_string(receiver.and_then(|r| r.get("RUTRecep"))),
        issue_date,
        net_amount: total("MntNeto"),
        exempt_amount: total("MntExe"),
        tax_amount: total("IVA"),
        total_amount: total("MntTotal"),
        items,
        raw: body,
    })
}
