//! Core type definitions for the TrainTicket backend

use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used by the travel and preserve services
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time format used by the consign service and order snapshots
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| CoreError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Kind of train, which decides the travel and preserve services to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainKind {
    /// G and D trains served by `ts-travel-service`
    HighSpeed,
    /// Everything else, served by `ts-travel2-service`
    Normal,
}

impl TrainKind {
    /// Path of the "trips left" search endpoint
    pub fn trips_left_path(&self) -> &'static str {
        match self {
            TrainKind::HighSpeed => "/api/v1/travelservice/trips/left",
            TrainKind::Normal => "/api/v1/travel2service/trips/left",
        }
    }

    /// Path of the reservation endpoint
    pub fn preserve_path(&self) -> &'static str {
        match self {
            TrainKind::HighSpeed => "/api/v1/preserveservice/preserve",
            TrainKind::Normal => "/api/v1/preserveotherservice/preserveOther",
        }
    }

    /// The route this tool books for each kind of train
    pub fn default_route(&self) -> PlacePair {
        match self {
            TrainKind::HighSpeed => PlacePair::new("Shang Hai", "Su Zhou"),
            TrainKind::Normal => PlacePair::new("Shang Hai", "Nan Jing"),
        }
    }
}

impl fmt::Display for TrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainKind::HighSpeed => write!(f, "high-speed"),
            TrainKind::Normal => write!(f, "normal"),
        }
    }
}

/// A departure and arrival station
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacePair {
    pub from: String,
    pub to: String,
}

impl PlacePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Same stations, opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for PlacePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl FromStr for PlacePair {
    type Err = CoreError;

    /// Parses `"Shang Hai:Su Zhou"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                Ok(PlacePair::new(from.trim(), to.trim()))
            }
            _ => Err(CoreError::InvalidRoute(format!(
                "expected FROM:TO, got '{}'",
                s
            ))),
        }
    }
}

/// Seat classes accepted by the preserve and rebook services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatType {
    FirstClass,
    SecondClass,
}

impl SeatType {
    pub fn all() -> &'static [SeatType] {
        &[SeatType::FirstClass, SeatType::SecondClass]
    }

    /// Wire code; the services take it as a string
    pub fn code(&self) -> &'static str {
        match self {
            SeatType::FirstClass => "2",
            SeatType::SecondClass => "3",
        }
    }
}

impl FromStr for SeatType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" => Ok(SeatType::FirstClass),
            "3" => Ok(SeatType::SecondClass),
            _ => Err(CoreError::InvalidSeatType(s.to_string())),
        }
    }
}

/// Result of a trip search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSearch {
    /// Trip ids such as `D1345` (train type followed by number)
    pub trip_ids: Vec<String>,
    /// Departure date of the trips found, taken from their start time
    pub trip_date: Option<String>,
}

impl TripSearch {
    pub fn is_empty(&self) -> bool {
        self.trip_ids.is_empty()
    }
}

/// Travel plan searches offered by `ts-travel-plan-service`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancedSearch {
    Quickest,
    Cheapest,
    MinStation,
}

impl AdvancedSearch {
    pub fn path(&self) -> &'static str {
        match self {
            AdvancedSearch::Quickest => "/api/v1/travelplanservice/travelPlan/quickest",
            AdvancedSearch::Cheapest => "/api/v1/travelplanservice/travelPlan/cheapest",
            AdvancedSearch::MinStation => "/api/v1/travelplanservice/travelPlan/minStation",
        }
    }
}

/// Services that expose burst-injection parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurstyService {
    #[serde(rename = "ts-basic-service")]
    Basic,
    #[serde(rename = "ts-cancel-service")]
    Cancel,
    #[serde(rename = "ts-seat-service")]
    Seat,
    #[serde(rename = "ts-travel-service")]
    Travel,
}

impl BurstyService {
    pub fn all() -> &'static [BurstyService] {
        &[
            BurstyService::Basic,
            BurstyService::Cancel,
            BurstyService::Seat,
            BurstyService::Travel,
        ]
    }

    /// Kubernetes service name
    pub fn as_str(&self) -> &'static str {
        match self {
            BurstyService::Basic => "ts-basic-service",
            BurstyService::Cancel => "ts-cancel-service",
            BurstyService::Seat => "ts-seat-service",
            BurstyService::Travel => "ts-travel-service",
        }
    }

    /// Path segment of the service behind the gateway
    fn api_segment(&self) -> &'static str {
        match self {
            BurstyService::Basic => "basicservice",
            BurstyService::Cancel => "cancelservice",
            BurstyService::Seat => "seatservice",
            BurstyService::Travel => "travelservice",
        }
    }

    pub fn set_params_path(&self) -> String {
        format!("/api/v1/{}/setBurstParams", self.api_segment())
    }

    pub fn get_params_path(&self) -> String {
        format!("/api/v1/{}/getBurstParams", self.api_segment())
    }
}

impl fmt::Display for BurstyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BurstyService {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BurstyService::all()
            .iter()
            .copied()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| CoreError::UnknownService(s.to_string()))
    }
}

/// Burst injection parameters, sent as `[period, rate, duration]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[i64; 3]", from = "[i64; 3]")]
pub struct BurstParams {
    pub period: i64,
    pub rate: i64,
    pub duration: i64,
}

impl From<BurstParams> for [i64; 3] {
    fn from(params: BurstParams) -> Self {
        [params.period, params.rate, params.duration]
    }
}

impl From<[i64; 3]> for BurstParams {
    fn from(values: [i64; 3]) -> Self {
        Self {
            period: values[0],
            rate: values[1],
            duration: values[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-09-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 9, 29).unwrap());

        assert!(matches!(
            parse_date("29/09/2024"),
            Err(CoreError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_train_kind_paths() {
        assert_eq!(
            TrainKind::HighSpeed.trips_left_path(),
            "/api/v1/travelservice/trips/left"
        );
        assert_eq!(
            TrainKind::Normal.preserve_path(),
            "/api/v1/preserveotherservice/preserveOther"
        );
        assert_eq!(TrainKind::Normal.default_route().to, "Nan Jing");
    }

    #[test]
    fn test_place_pair_from_str() {
        let pair: PlacePair = "Shang Hai:Su Zhou".parse().unwrap();
        assert_eq!(pair, PlacePair::new("Shang Hai", "Su Zhou"));
        assert_eq!(pair.reversed().from, "Su Zhou");
        assert!("Shang Hai".parse::<PlacePair>().is_err());
        assert!(":Su Zhou".parse::<PlacePair>().is_err());
    }

    #[test]
    fn test_seat_type_codes() {
        assert_eq!(SeatType::FirstClass.code(), "2");
        assert_eq!("3".parse::<SeatType>().unwrap(), SeatType::SecondClass);
        assert!("1".parse::<SeatType>().is_err());
    }

    #[test]
    fn test_bursty_service_parsing() {
        assert_eq!(
            "ts-seat-service".parse::<BurstyService>().unwrap(),
            BurstyService::Seat
        );
        assert_eq!(
            BurstyService::Cancel.set_params_path(),
            "/api/v1/cancelservice/setBurstParams"
        );
        assert_eq!(
            BurstyService::Travel.get_params_path(),
            "/api/v1/travelservice/getBurstParams"
        );
        assert!(matches!(
            "ts-order-service".parse::<BurstyService>(),
            Err(CoreError::UnknownService(_))
        ));
    }

    #[test]
    fn test_burst_params_serialize_as_array() {
        let params = BurstParams {
            period: 60,
            rate: 5,
            duration: 10,
        };
        assert_eq!(serde_json::to_string(&params).unwrap(), "[60,5,10]");
    }
}
