//! Current weather from the Gismeteo v3 API and its chat rendering.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use taskbot_core::render::escape_html;

use crate::error::ServiceError;
use crate::gateway::{Coordinates, WeatherProvider};

pub const GISMETEO_CURRENT_URL: &str = "https://api.gismeteo.net/v3/weather/current/";
const TOKEN_HEADER: &str = "X-Gismeteo-Token";
const NOT_AVAILABLE: &str = "n/a";

/// The subset of a current-conditions report the bot shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub air_c: Option<f64>,
    pub comfort_c: Option<f64>,
    pub description: Option<String>,
    pub humidity_percent: Option<f64>,
    pub pressure_mm_hg: Option<f64>,
    pub wind_speed_m_s: Option<f64>,
    /// 0 = calm, 1..=8 = N, NE, E, SE, S, SW, W, NW.
    pub wind_direction: Option<u64>,
    pub cloudiness_percent: Option<f64>,
    /// 0 = none, 1 = rain, 2 = snow, 3 = mixed.
    pub precipitation_type: Option<u64>,
    pub emoji: Option<String>,
}

impl WeatherSnapshot {
    pub fn from_data(data: &Value) -> Self {
        let number = |pointer: &str| data.pointer(pointer).and_then(Value::as_f64);
        let code = |pointer: &str| data.pointer(pointer).and_then(Value::as_u64);
        let description = match data.get("description") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Object(map)) => map.get("full").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };

        Self {
            air_c: number("/temperature/air/C"),
            comfort_c: number("/temperature/comfort/C"),
            description,
            humidity_percent: number("/humidity/percent"),
            pressure_mm_hg: number("/pressure/mm_hg_atm"),
            wind_speed_m_s: number("/wind/speed/m_s"),
            wind_direction: code("/wind/direction/scale_8"),
            cloudiness_percent: number("/cloudiness/percent"),
            precipitation_type: code("/precipitation/type"),
            emoji: data
                .pointer("/icon/emoji")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

pub struct GismeteoProvider {
    token: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GismeteoProvider {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Self::with_endpoint(token, GISMETEO_CURRENT_URL, timeout)
    }

    pub fn with_endpoint(
        token: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            token: token.into(),
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl WeatherProvider for GismeteoProvider {
    async fn fetch(&self, at: Coordinates) -> Result<WeatherSnapshot, ServiceError> {
        tracing::debug!(
            latitude = at.latitude,
            longitude = at.longitude,
            "requesting current weather"
        );
        let response = self
            .client
            .get(&self.endpoint)
            .header(TOKEN_HEADER, &self.token)
            .query(&[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("lang", "ru".to_string()),
            ])
            .send()
            .await
            .map_err(ServiceError::from_request)?;

        let status = response.status();
        let body = response.text().await.map_err(ServiceError::from_request)?;
        let payload: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                detail: payload.as_ref().and_then(first_error_detail),
            });
        }

        let payload =
            payload.ok_or_else(|| ServiceError::Decode("weather response is not JSON".into()))?;
        parse_current(&payload)
    }
}

/// Validate the `meta` block and extract `data` from a current-weather payload.
pub fn parse_current(payload: &Value) -> Result<WeatherSnapshot, ServiceError> {
    let meta = payload.get("meta");
    let meta_status = meta
        .and_then(|meta| meta.get("status_code"))
        .and_then(Value::as_i64);
    let meta_ok = meta
        .and_then(|meta| meta.get("status"))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    if meta_status != Some(200) || !meta_ok {
        let mut description = match meta_status {
            Some(code) => format!("Gismeteo API error (status {code})"),
            None => "Gismeteo API error".to_string(),
        };
        if let Some(detail) = first_error_detail(payload) {
            description.push_str(&format!(": {detail}"));
        }
        return Err(ServiceError::Api {
            code: meta_status,
            description,
        });
    }

    match payload.get("data") {
        Some(data) if !data.is_null() && data.as_object().map_or(true, |m| !m.is_empty()) => {
            Ok(WeatherSnapshot::from_data(data))
        }
        _ => Err(ServiceError::Decode(
            "Gismeteo returned empty weather data".into(),
        )),
    }
}

fn first_error_detail(payload: &Value) -> Option<String> {
    payload
        .pointer("/meta/errors/0/detail")
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn wind_direction_label(code: Option<u64>) -> &'static str {
    match code {
        Some(0) => "Calm",
        Some(1) => "N",
        Some(2) => "NE",
        Some(3) => "E",
        Some(4) => "SE",
        Some(5) => "S",
        Some(6) => "SW",
        Some(7) => "W",
        Some(8) => "NW",
        _ => "-",
    }
}

pub fn precipitation_label(code: Option<u64>) -> &'static str {
    match code {
        Some(0) => "None",
        Some(1) => "Rain",
        Some(2) => "Snow",
        Some(3) => "Mixed",
        _ => "-",
    }
}

fn value_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Chat message (HTML parse mode) describing `snapshot` at `location`.
pub fn format_weather(snapshot: &WeatherSnapshot, location: &str) -> String {
    let emoji = snapshot.emoji.as_deref().unwrap_or("❓");
    let description = snapshot
        .description
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "No description".to_string());

    [
        format!("<b>{}</b> | Now {emoji}", escape_html(location)),
        String::new(),
        format!(
            "🌡️ <b>Temp.</b>: {}°C (feels like {}°C)",
            value_or_na(snapshot.air_c),
            value_or_na(snapshot.comfort_c)
        ),
        format!("📝 <b>Description</b>: {description}"),
        format!("💧 <b>Humidity</b>: {}%", value_or_na(snapshot.humidity_percent)),
        format!(
            "🧭 <b>Pressure</b>: {} mm Hg",
            value_or_na(snapshot.pressure_mm_hg)
        ),
        format!(
            "💨 <b>Wind</b>: {}, {} m/s",
            wind_direction_label(snapshot.wind_direction),
            value_or_na(snapshot.wind_speed_m_s)
        ),
        format!(
            "☁️ <b>Cloudiness</b>: {}%",
            value_or_na(snapshot.cloudiness_percent)
        ),
        format!(
            "☔ <b>Precipitation</b>: {}",
            precipitation_label(snapshot.precipitation_type)
        ),
    ]
    .join("\n")
}
