//! Place-name lookup against a Nominatim search endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ResolveError, ServiceError};
use crate::gateway::{Coordinates, LocationResolver, Place};

pub const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";
pub const USER_AGENT: &str = concat!("taskbot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

impl SearchHit {
    fn into_place(self) -> Result<Place, ServiceError> {
        let latitude = self
            .lat
            .parse::<f64>()
            .map_err(|_| ServiceError::Decode(format!("invalid latitude '{}'", self.lat)))?;
        let longitude = self
            .lon
            .parse::<f64>()
            .map_err(|_| ServiceError::Decode(format!("invalid longitude '{}'", self.lon)))?;
        Ok(Place {
            coordinates: Coordinates {
                latitude,
                longitude,
            },
            display_name: self.display_name,
        })
    }
}

pub struct NominatimResolver {
    base: String,
    client: reqwest::Client,
}

impl NominatimResolver {
    pub fn new(timeout: Duration) -> Result<Self, ServiceError> {
        Self::with_base(NOMINATIM_BASE, timeout)
    }

    pub fn with_base(base: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl LocationResolver for NominatimResolver {
    async fn resolve(&self, query: &str) -> Result<Place, ResolveError> {
        let response = self
            .client
            .get(format!("{}/search", self.base))
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("accept-language", "ru"),
            ])
            .send()
            .await
            .map_err(ServiceError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                detail: None,
            }
            .into());
        }

        let body = response.text().await.map_err(ServiceError::from_request)?;
        let place = parse_search(&body, query)?;
        tracing::debug!(
            query,
            latitude = place.coordinates.latitude,
            longitude = place.coordinates.longitude,
            "location resolved"
        );
        Ok(place)
    }
}

/// First hit of a `format=jsonv2` search response.
pub fn parse_search(body: &str, query: &str) -> Result<Place, ResolveError> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(body).map_err(|err| ServiceError::Decode(err.to_string()))?;
    match hits.into_iter().next() {
        Some(hit) => Ok(hit.into_place()?),
        None => Err(ResolveError::NotFound {
            query: query.to_string(),
        }),
    }
}
