//! TrainTicket client implementation

use crate::config::ClientConfig;
use crate::cookies::SessionCookies;
use crate::errors::{ApiError, CancelAttempt};
use crate::session::Session;
use crate::types::{
    order_records, trip_search, ApiResponse, ConsignRequest, ContactItem, Credentials, LoginData,
    PaymentRequest, RebookRequest, Reservation, TripItem, TripQuery,
};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use ttload_core::{
    AdvancedSearch, OrderPartition, OrderRecord, PlacePair, TrainKind, TripSearch, DATE_TIME_FORMAT,
};
use ttload_resilience::{RetryExecutor, StopListener};

/// Path of the login endpoint
pub const LOGIN_PATH: &str = "/api/v1/users/login";

const PAYMENT_PATH: &str = "/api/v1/inside_pay_service/inside_payment";
const CONSIGN_PATH: &str = "/api/v1/consignservice/consigns";
const REBOOK_PATH: &str = "/api/v1/rebookservice/rebook";
const TRIPS_PARALLEL_PATH: &str = "/api/v1/travelservice/trips/left_parallel";

// The gateway's login page hands these out; the login endpoint expects them
const SESSION_COOKIES: &[&str] = &[
    "JSESSIONID=9ED5635A2A892A4BA31E7E98533A279D",
    "YsbCaptcha=025080CF8BA94594B09E283F17815444",
];

/// The TrainTicket calls made by the load scenarios.
///
/// Every authenticated call logs in again first when the token has expired.
#[async_trait::async_trait]
pub trait TicketApi: Send + Sync {
    /// Id of the logged-in user, if any
    fn user_id(&self) -> Option<String>;

    async fn login(&self) -> Result<(), ApiError>;

    /// Trips left between two stations on a date
    async fn query_trips(
        &self,
        kind: TrainKind,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<TripSearch, ApiError>;

    /// High-speed trips left, computed by the travel service in parallel
    async fn query_trips_parallel(
        &self,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<Vec<String>, ApiError>;

    /// Travel plans ranked by `search`
    async fn query_advanced(
        &self,
        search: AdvancedSearch,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<Vec<JsonValue>, ApiError>;

    /// Current orders of the user in one order service
    async fn fetch_orders(&self, partition: OrderPartition) -> Result<Vec<OrderRecord>, ApiError>;

    /// Contact ids of the user
    async fn query_contacts(&self) -> Result<Vec<String>, ApiError>;

    async fn preserve(&self, kind: TrainKind, reservation: &Reservation) -> Result<(), ApiError>;

    async fn pay_order(&self, order_id: &str, trip_id: &str) -> Result<(), ApiError>;

    /// Cancel an order, retrying network errors and any failed status
    async fn cancel_order(&self, order_id: &str) -> Result<(), ApiError>;

    async fn collect_ticket(&self, order_id: &str) -> Result<(), ApiError>;

    async fn enter_station(&self, order_id: &str) -> Result<(), ApiError>;

    async fn put_consign(&self, order: &OrderRecord) -> Result<(), ApiError>;

    async fn rebook(&self, request: &RebookRequest) -> Result<(), ApiError>;
}

/// One simulated user talking to a TrainTicket gateway.
///
/// Owns its own cookie jar, so sessions never share cookies. Each login
/// empties the jar before seeding the gateway session cookies.
pub struct TrainTicketClient {
    base_url: String,
    http: Client,
    cookies: Arc<SessionCookies>,
    config: ClientConfig,
    session: RwLock<Session>,
    stop: Option<StopListener>,
}

impl std::fmt::Debug for TrainTicketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainTicketClient")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id())
            .finish()
    }
}

impl TrainTicketClient {
    /// Create a client for the gateway at `base_url`, e.g. `http://10.0.0.5:8080`
    pub fn new(base_url: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        debug!(
            "Creating TrainTicket client for {} with {}s timeout",
            base_url,
            config.timeout.as_secs()
        );

        let cookies = Arc::new(SessionCookies::new());
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            base_url,
            http,
            cookies,
            config,
            session: RwLock::new(Session::new()),
            stop: None,
        })
    }

    /// Abandon retry back-off once `stop` fires
    pub fn with_stop(mut self, stop: StopListener) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A copy of the current login state
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn reset_cookies(&self, url: &str) -> Result<(), ApiError> {
        let url = Url::parse(url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.cookies.reset(SESSION_COOKIES, &url);
        Ok(())
    }

    /// Log in again when the token is missing or expired
    pub(crate) async fn ensure_login(&self) -> Result<(), ApiError> {
        let due = self.session.read().needs_login();
        if due {
            info!("Token missing or expired, logging in");
            self.login().await?;
        }
        Ok(())
    }

    fn require_user_id(&self) -> Result<String, ApiError> {
        self.user_id().ok_or(ApiError::NotLoggedIn)
    }

    fn require_token(&self) -> Result<String, ApiError> {
        self.session
            .read()
            .token()
            .map(str::to_string)
            .ok_or(ApiError::NotLoggedIn)
    }

    /// Attach a valid bearer token, logging in first if needed
    pub(crate) async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        self.ensure_login().await?;
        Ok(request.bearer_auth(self.require_token()?))
    }

    /// Attach the bearer token if there is one; never logs in
    pub(crate) fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.read().token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and return the body of an accepted response
    pub(crate) async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(endpoint, status = status.as_u16(), "Response received");

        if !accepted.contains(&status) {
            return Err(ApiError::status(endpoint, status.as_u16(), &body));
        }
        Ok(body)
    }

    pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<ApiResponse<T>, ApiError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Fail with `Rejected` unless the envelope reports status 1
    pub(crate) fn require_success<T>(
        endpoint: &str,
        response: ApiResponse<T>,
    ) -> Result<Option<T>, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Rejected {
                endpoint: endpoint.to_string(),
                message: response.message(),
            });
        }
        Ok(response.data)
    }

    async fn cancel_once(&self, order_id: &str) -> Result<(), ApiError> {
        self.ensure_login().await?;
        let user_id = self.require_user_id()?;
        let path = format!("/api/v1/cancelservice/cancel/{}/{}", order_id, user_id);
        let request = self.authorized(self.http.get(self.url(&path))).await?;

        self.send(&path, request, &[StatusCode::OK]).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TicketApi for TrainTicketClient {
    fn user_id(&self) -> Option<String> {
        self.session.read().user_id().map(str::to_string)
    }

    async fn login(&self) -> Result<(), ApiError> {
        let url = self.url(LOGIN_PATH);
        self.reset_cookies(&url)?;

        let credentials = Credentials {
            username: &self.config.username,
            password: &self.config.password,
        };
        let request = self
            .http
            .post(&url)
            .header("Proxy-Connection", "keep-alive")
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ORIGIN, url.as_str())
            .header(REFERER, format!("{}/client_login.html", self.base_url))
            .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .json(&credentials);

        let body = self.send(LOGIN_PATH, request, &[StatusCode::OK]).await?;
        let response: ApiResponse<LoginData> = Self::decode(&body)?;

        if response.data.is_none() && !response.is_success() {
            return Err(ApiError::Rejected {
                endpoint: LOGIN_PATH.to_string(),
                message: response.message(),
            });
        }
        let data = response
            .data
            .ok_or_else(|| ApiError::unexpected(LOGIN_PATH, "data missing"))?;
        let user_id = data
            .user_id
            .ok_or_else(|| ApiError::unexpected(LOGIN_PATH, "userId not found"))?;
        let token = data
            .token
            .ok_or_else(|| ApiError::unexpected(LOGIN_PATH, "token not found"))?;

        info!(user = %self.config.username, user_id = %user_id, "Logged in");
        self.session
            .write()
            .establish(user_id, token, self.config.token_ttl, Instant::now());
        Ok(())
    }

    async fn query_trips(
        &self,
        kind: TrainKind,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<TripSearch, ApiError> {
        let path = kind.trips_left_path();
        let request = self.http.post(self.url(path)).json(&TripQuery::new(route, date));

        let body = self.send(path, request, &[StatusCode::OK]).await?;
        let response: ApiResponse<JsonValue> = Self::decode(&body)?;

        let trips: Vec<TripItem> = match response.data {
            Some(data @ JsonValue::Array(_)) => serde_json::from_value(data)?,
            _ => {
                debug!(%kind, %route, "No trips in response");
                return Ok(TripSearch::default());
            }
        };

        let search = trip_search(trips);
        debug!(%kind, %route, trips = search.trip_ids.len(), "Trip search finished");
        Ok(search)
    }

    async fn query_trips_parallel(
        &self,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<Vec<String>, ApiError> {
        let request = self
            .http
            .post(self.url(TRIPS_PARALLEL_PATH))
            .json(&TripQuery::new(route, date));

        let body = self.send(TRIPS_PARALLEL_PATH, request, &[StatusCode::OK]).await?;
        let response: ApiResponse<JsonValue> = Self::decode(&body)?;

        match response.data {
            Some(data @ JsonValue::Array(_)) => {
                let trips: Vec<TripItem> = serde_json::from_value(data)?;
                Ok(trips.iter().map(TripItem::id).collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn query_advanced(
        &self,
        search: AdvancedSearch,
        route: &PlacePair,
        date: NaiveDate,
    ) -> Result<Vec<JsonValue>, ApiError> {
        let path = search.path();
        let request = self.with_token(self.http.post(self.url(path)).json(&TripQuery::new(route, date)));

        let body = self.send(path, request, &[StatusCode::OK]).await?;
        let response: ApiResponse<JsonValue> = Self::decode(&body)?;

        match response.data {
            Some(JsonValue::Array(plans)) => Ok(plans),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_orders(&self, partition: OrderPartition) -> Result<Vec<OrderRecord>, ApiError> {
        let path = partition.refresh_path();
        let request = self.authorized(self.http.post(self.url(path))).await?;
        let user_id = self.require_user_id()?;
        let request = request.json(&json!({ "loginId": user_id }));

        let body = self.send(path, request, &[StatusCode::OK]).await?;
        let response: ApiResponse<JsonValue> = Self::decode(&body)?;

        let items = match response.data {
            Some(JsonValue::Array(items)) => items,
            _ => return Err(ApiError::unexpected(path, "data is not an array")),
        };

        let snapshot_time = Local::now().format(DATE_TIME_FORMAT).to_string();
        let total = items.len();
        let records = order_records(items, &snapshot_time);
        if records.len() < total {
            warn!(
                %partition,
                dropped = total - records.len(),
                "Dropped orders without id or status"
            );
        }
        debug!(%partition, orders = records.len(), "Fetched orders");
        Ok(records)
    }

    async fn query_contacts(&self) -> Result<Vec<String>, ApiError> {
        self.ensure_login().await?;
        let user_id = self.require_user_id()?;
        let path = format!("/api/v1/contactservice/contacts/account/{}", user_id);
        let request = self.authorized(self.http.get(self.url(&path))).await?;

        let body = self.send(&path, request, &[StatusCode::OK]).await?;
        let response: ApiResponse<JsonValue> = Self::decode(&body)?;

        match response.data {
            Some(data @ JsonValue::Array(_)) => {
                let contacts: Vec<ContactItem> = serde_json::from_value(data)?;
                debug!(contacts = contacts.len(), "Fetched contacts");
                Ok(contacts.into_iter().map(|c| c.id).collect())
            }
            _ => Err(ApiError::unexpected(&path, "data is not an array")),
        }
    }

    async fn preserve(&self, kind: TrainKind, reservation: &Reservation) -> Result<(), ApiError> {
        let path = kind.preserve_path();
        let request = self
            .authorized(self.http.post(self.url(path)))
            .await?
            .json(reservation);

        let body = self.send(path, request, &[StatusCode::OK]).await?;
        Self::require_success(path, Self::decode::<JsonValue>(&body)?)?;

        info!(
            trip = %reservation.trip_id,
            from = %reservation.from,
            to = %reservation.to,
            "Ticket preserved"
        );
        Ok(())
    }

    async fn pay_order(&self, order_id: &str, trip_id: &str) -> Result<(), ApiError> {
        let request = self
            .authorized(self.http.post(self.url(PAYMENT_PATH)))
            .await?
            .json(&PaymentRequest { order_id, trip_id });

        self.send(PAYMENT_PATH, request, &[StatusCode::OK]).await?;
        info!(order_id, "Order paid");
        Ok(())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ApiError> {
        let mut executor = RetryExecutor::new(self.config.cancel_retry.clone());
        if let Some(stop) = &self.stop {
            executor = executor.with_stop(stop.clone());
        }

        executor
            .execute(move || async move { self.cancel_once(order_id).await.map_err(CancelAttempt) })
            .await
            .map_err(|e| e.into_inner().0)?;

        info!(order_id, "Order cancelled");
        Ok(())
    }

    async fn collect_ticket(&self, order_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/v1/executeservice/execute/collected/{}", order_id);
        let request = self.authorized(self.http.get(self.url(&path))).await?;

        self.send(&path, request, &[StatusCode::OK]).await?;
        info!(order_id, "Ticket collected");
        Ok(())
    }

    async fn enter_station(&self, order_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/v1/executeservice/execute/execute/{}", order_id);
        let request = self.authorized(self.http.get(self.url(&path))).await?;

        self.send(&path, request, &[StatusCode::OK]).await?;
        info!(order_id, "Entered station");
        Ok(())
    }

    async fn put_consign(&self, order: &OrderRecord) -> Result<(), ApiError> {
        let consign = ConsignRequest::for_order(order, Local::now().naive_local());
        let request = self
            .authorized(self.http.put(self.url(CONSIGN_PATH)))
            .await?
            .json(&consign);

        self.send(CONSIGN_PATH, request, &[StatusCode::OK, StatusCode::CREATED])
            .await?;
        info!(order_id = %order.order_id, "Consignment put");
        Ok(())
    }

    async fn rebook(&self, request: &RebookRequest) -> Result<(), ApiError> {
        let http_request = self
            .authorized(self.http.post(self.url(REBOOK_PATH)))
            .await?
            .json(request);

        let body = self.send(REBOOK_PATH, http_request, &[StatusCode::OK]).await?;
        Self::require_success(REBOOK_PATH, Self::decode::<JsonValue>(&body)?)?;

        info!(order_id = %request.order_id, trip = %request.trip_id, "Order rebooked");
        Ok(())
    }
}
