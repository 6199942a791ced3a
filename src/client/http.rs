use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use super::{
    BackendError, LotNumberRequest, LotReceiptRequest, PalletReceiptRequest, WarehouseBackend,
};
use crate::models::{
    ChecklistItem, DamageReport, DamageReportFilter, InboundOrder, InboundOrderStatus, Location,
    NewDamageReport, NewPallet, Pallet, PutAwaySuggestion, ScanEvent, ScannedEntity, Sublocation,
    WorkflowRules,
};

/// Warehouse data API client over HTTP.
///
/// The client sets no request timeout and performs no retries: a hanging or
/// failed call is surfaced to the triggering operation as-is.
#[derive(Clone)]
pub struct HttpWarehouseBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWarehouseBackend {
    pub fn new(base_url: &str, api_token: Option<&str>) -> Result<Self, BackendError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = api_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| BackendError::Transport(format!("invalid API token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.text().await {
            Ok(body) if !body.trim().is_empty() => body,
            _ => status.to_string(),
        };

        match status {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(message)),
            s if s.is_client_error() => Err(BackendError::Rejected(message)),
            _ => Err(BackendError::Transport(message)),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(Self::check(response).await?).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

#[async_trait]
impl WarehouseBackend for HttpWarehouseBackend {
    #[instrument(skip(self))]
    async fn get_inbound_order(&self, id: Uuid) -> Result<InboundOrder, BackendError> {
        self.get_json(&format!("/inbound-orders/{}", id)).await
    }

    #[instrument(skip(self))]
    async fn update_inbound_order_status(
        &self,
        id: Uuid,
        status: InboundOrderStatus,
    ) -> Result<InboundOrder, BackendError> {
        let response = self
            .http
            .put(self.url(&format!("/inbound-orders/{}/status", id)))
            .json(&json!({ "status": status }))
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }

    #[instrument(skip(self))]
    async fn receive_inbound_item(
        &self,
        item_id: Uuid,
        new_total_qty: i32,
        location_id: Uuid,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url(&format!("/inbound-items/{}/receive", item_id)))
            .json(&json!({
                "new_total_qty": new_total_qty,
                "location_id": location_id,
            }))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self, receipt), fields(item_id = %receipt.item_id))]
    async fn receive_with_lot(&self, receipt: &LotReceiptRequest) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url(&format!("/inbound-items/{}/receive-lot", receipt.item_id)))
            .json(receipt)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self, receipt), fields(item_id = %receipt.item_id))]
    async fn receive_inbound_item_to_pallet(
        &self,
        receipt: &PalletReceiptRequest,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url(&format!(
                "/inbound-items/{}/receive-pallet",
                receipt.item_id
            )))
            .json(receipt)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn reject_inbound_item(
        &self,
        item_id: Uuid,
        qty: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url(&format!("/inbound-items/{}/reject", item_id)))
            .json(&json!({ "qty": qty, "reason": reason, "notes": notes }))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self, pallet))]
    async fn create_pallet_for_receiving(
        &self,
        pallet: &NewPallet,
    ) -> Result<Pallet, BackendError> {
        let response = self
            .http
            .post(self.url("/pallets"))
            .json(pallet)
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }

    #[instrument(skip(self))]
    async fn get_pallet_lpns(&self) -> Result<Vec<Pallet>, BackendError> {
        self.get_json("/pallets").await
    }

    #[instrument(skip(self))]
    async fn get_inbound_workflow_rules_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<WorkflowRules, BackendError> {
        self.get_json(&format!("/inbound-orders/{}/workflow-rules", order_id))
            .await
    }

    #[instrument(skip(self, request))]
    async fn generate_lot_number(
        &self,
        request: &LotNumberRequest,
    ) -> Result<String, BackendError> {
        #[derive(serde::Deserialize)]
        struct LotNumberResponse {
            lot_number: String,
        }

        let response = self
            .http
            .post(self.url("/lot-numbers/generate"))
            .json(request)
            .send()
            .await?;
        let body: LotNumberResponse = Self::decode(Self::check(response).await?).await?;
        Ok(body.lot_number)
    }

    #[instrument(skip(self))]
    async fn place_on_inspection_hold(
        &self,
        item_id: Uuid,
        order_id: Uuid,
        reason: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url(&format!("/inbound-items/{}/inspection-hold", item_id)))
            .json(&json!({ "order_id": order_id, "reason": reason }))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn get_suggested_put_away(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        qty: i32,
    ) -> Result<PutAwaySuggestion, BackendError> {
        self.get_json(&format!(
            "/putaway/suggestion?product_id={}&location_id={}&qty={}",
            product_id, location_id, qty
        ))
        .await
    }

    #[instrument(skip(self))]
    async fn confirm_put_away(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        sublocation_id: Uuid,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/putaway/confirm"))
            .json(&json!({
                "product_id": product_id,
                "location_id": location_id,
                "sublocation_id": sublocation_id,
            }))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn get_sublocations(&self, location_id: Uuid) -> Result<Vec<Sublocation>, BackendError> {
        self.get_json(&format!("/locations/{}/sublocations", location_id))
            .await
    }

    #[instrument(skip(self))]
    async fn get_locations(&self) -> Result<Vec<Location>, BackendError> {
        self.get_json("/locations").await
    }

    #[instrument(skip(self, event), fields(code = %event.code))]
    async fn log_scan_event(&self, event: &ScanEvent) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/scan-events"))
            .json(event)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn resolve_barcode(&self, code: &str) -> Result<Option<ScannedEntity>, BackendError> {
        match self
            .get_json::<ScannedEntity>(&format!("/barcodes/{}", code))
            .await
        {
            Ok(entity) => Ok(Some(entity)),
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, filter))]
    async fn get_damage_reports(
        &self,
        filter: &DamageReportFilter,
    ) -> Result<Vec<DamageReport>, BackendError> {
        let mut query = Vec::new();
        if let Some(order_id) = filter.order_id {
            query.push(format!("order_id={}", order_id));
        }
        if let Some(product_id) = filter.product_id {
            query.push(format!("product_id={}", product_id));
        }
        let path = if query.is_empty() {
            "/damage-reports".to_string()
        } else {
            format!("/damage-reports?{}", query.join("&"))
        };
        self.get_json(&path).await
    }

    #[instrument(skip(self, report))]
    async fn create_damage_report(
        &self,
        report: &NewDamageReport,
    ) -> Result<DamageReport, BackendError> {
        let response = self
            .http
            .post(self.url("/damage-reports"))
            .json(report)
            .send()
            .await?;
        Self::decode(Self::check(response).await?).await
    }

    #[instrument(skip(self))]
    async fn get_arrival_checklist(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<ChecklistItem>, BackendError> {
        self.get_json(&format!("/inbound-orders/{}/checklist", order_id))
            .await
    }

    #[instrument(skip(self))]
    async fn set_checklist_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        done: bool,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .put(self.url(&format!(
                "/inbound-orders/{}/checklist/{}",
                order_id, item_id
            )))
            .json(&json!({ "done": done }))
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }
}
