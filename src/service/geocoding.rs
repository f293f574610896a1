use std::time::Duration;

use serde::Deserialize;
use tracing::instrument;

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    config::GeocodingConfig,
};

/**
 * A single hit returned by the geocoding endpoint.
 */
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    #[allow(dead_code)]
    name: Option<String>,
}

/**
 * Response body of the geocoding endpoint.
 */
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    hits: Vec<GeocodeHit>,
}

/**
 * Client for the external geocoding service used to verify that a city
 * name denotes a real location. The lookup is read-only; when the
 * service is unreachable, city creation is blocked.
 */
pub struct GeocodingService {
    /**
     * The HTTP client used for lookups.
     */
    client: reqwest::Client,
    /**
     * Base URL of the geocoding endpoint.
     */
    url: String,
    /**
     * API key sent with every lookup.
     */
    api_key: String,
}

impl GeocodingService {
    /**
     * Creates a new instance of `GeocodingService`.
     *
     * # Arguments
     * `config`: The geocoding configuration.
     *
     * # Returns
     * A Result containing the service or an `ApplicationError` of type
     * `Initialization`.
     */
    pub fn new(config: &GeocodingConfig) -> Result<Self, ApplicationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout))
            .build()
            .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create geocoding http client: {err}")))?;
        Ok(GeocodingService { client, url: config.url.clone(), api_key: config.api_key.clone() })
    }

    /**
     * Checks whether the given city name denotes a real, known city.
     *
     * # Arguments
     * `name`: The city name to look up.
     *
     * # Returns
     * A Result containing true if the geocoding service knows the city,
     * or an `ApplicationError` of type `GeocodingUnavailable` when the
     * service cannot be reached or answers unusably.
     */
    #[instrument(skip(self), fields(result))]
    pub async fn city_exists(&self, name: &str) -> Result<bool, ApplicationError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", name), ("limit", "1"), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| ApplicationError::new(ErrorType::GeocodingUnavailable, format!("Failed to reach geocoding service: {err}")))?;
        if !response.status().is_success() {
            tracing::warn!("Geocoding service answered with status {}", response.status());
            return Err(ApplicationError::new(ErrorType::GeocodingUnavailable, format!("Geocoding service answered with status {}", response.status())));
        }
        let body = response.text().await.map_err(|err| ApplicationError::new(ErrorType::GeocodingUnavailable, format!("Failed to read geocoding response: {err}")))?;
        Self::decode_hits(&body)
    }

    /**
     * Decodes a geocoding response body and reports whether it contains
     * any hits.
     *
     * # Arguments
     * `body`: The raw JSON response body.
     *
     * # Returns
     * A Result containing true if at least one hit is present, or an
     * `ApplicationError` of type `GeocodingUnavailable` for malformed
     * payloads.
     */
    fn decode_hits(body: &str) -> Result<bool, ApplicationError> {
        let response: GeocodeResponse =
            serde_json::from_str(body).map_err(|err| ApplicationError::new(ErrorType::GeocodingUnavailable, format!("Failed to decode geocoding response: {err}")))?;
        Ok(!response.hits.is_empty())
    }
}
