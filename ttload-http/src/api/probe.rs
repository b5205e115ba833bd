//! Read-only queries of the auxiliary services

use crate::client::TrainTicketClient;
use crate::errors::ApiError;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use tracing::debug;
use ttload_core::{PlacePair, DATE_FORMAT};

const ASSURANCE_TYPES_PATH: &str = "/api/v1/assuranceservice/assurances/types";
const ROUTES_PATH: &str = "/api/v1/routeservice/routes";
const ADMIN_TRAVEL_PATH: &str = "/api/v1/admintravelservice/admintravel";
const ADMIN_PRICES_PATH: &str = "/api/v1/adminbasicservice/adminbasic/prices";
const ADMIN_CONFIGS_PATH: &str = "/api/v1/adminbasicservice/adminbasic/configs";

impl TrainTicketClient {
    /// GET `path` and return the `data` of the envelope, `Null` when absent
    async fn get_data(&self, path: &str) -> Result<JsonValue, ApiError> {
        let request = self.with_token(self.http().get(self.url(path)));
        let body = self.send(path, request, &[StatusCode::OK]).await?;
        let response = Self::decode::<JsonValue>(&body)?;

        debug!(path, status = response.status, "Probe answered");
        Ok(response.data.unwrap_or(JsonValue::Null))
    }

    /// Food on offer for a train between two stations
    pub async fn query_food(
        &self,
        route: &PlacePair,
        train_number: &str,
        date: NaiveDate,
    ) -> Result<JsonValue, ApiError> {
        let path = format!(
            "/api/v1/foodservice/foods/{}/{}/{}/{}",
            date.format(DATE_FORMAT),
            route.from,
            route.to,
            train_number
        );
        self.get_data(&path).await
    }

    /// All routes, or one route by id
    pub async fn query_route(&self, route_id: Option<&str>) -> Result<JsonValue, ApiError> {
        match route_id {
            Some(id) => self.get_data(&format!("{}/{}", ROUTES_PATH, id)).await,
            None => self.get_data(ROUTES_PATH).await,
        }
    }

    pub async fn query_assurances(&self) -> Result<JsonValue, ApiError> {
        self.get_data(ASSURANCE_TYPES_PATH).await
    }

    /// Trips as listed by the admin travel service; the envelope must report success
    pub async fn query_admin_travel(&self) -> Result<JsonValue, ApiError> {
        let request = self.with_token(self.http().get(self.url(ADMIN_TRAVEL_PATH)));
        let body = self.send(ADMIN_TRAVEL_PATH, request, &[StatusCode::OK]).await?;
        let data = Self::require_success(ADMIN_TRAVEL_PATH, Self::decode::<JsonValue>(&body)?)?;
        Ok(data.unwrap_or(JsonValue::Null))
    }

    pub async fn query_admin_prices(&self) -> Result<JsonValue, ApiError> {
        self.get_data(ADMIN_PRICES_PATH).await
    }

    pub async fn query_admin_configs(&self) -> Result<JsonValue, ApiError> {
        self.get_data(ADMIN_CONFIGS_PATH).await
    }
}
