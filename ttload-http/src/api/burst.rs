//! Burst-injection parameters of the instrumented services

use crate::client::TrainTicketClient;
use crate::errors::ApiError;
use reqwest::StatusCode;
use tracing::info;
use ttload_core::{BurstParams, BurstyService};

impl TrainTicketClient {
    /// Send `[period, rate, duration]` to a service's burst controller.
    ///
    /// Logs in first when there is no valid token.
    pub async fn set_burst_params(
        &self,
        service: BurstyService,
        params: BurstParams,
    ) -> Result<(), ApiError> {
        let path = service.set_params_path();
        let request = self
            .authorized(self.http().post(self.url(&path)).json(&params))
            .await?;

        self.send(&path, request, &[StatusCode::OK]).await?;
        info!(
            %service,
            period = params.period,
            rate = params.rate,
            duration = params.duration,
            "Burst parameters set"
        );
        Ok(())
    }

    /// Raw body of a service's current burst parameters
    pub async fn get_burst_params(&self, service: BurstyService) -> Result<String, ApiError> {
        let path = service.get_params_path();
        let request = self.authorized(self.http().get(self.url(&path))).await?;

        self.send(&path, request, &[StatusCode::OK]).await
    }
}
