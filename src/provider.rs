//! Place lookup capability: reverse geocoding and text search.
//!
//! The builder only talks to [`PlaceProvider`]; the Google Maps web-service
//! client and the offline gazetteer are the two implementations.

use std::time::Duration as StdDuration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Coordinates;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// One place returned by a text search, before it becomes a place record.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
	pub name: Option<String>,
	pub formatted_address: Option<String>,
	pub location: Coordinates,
	pub rating: Option<f64>,
	pub types: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("maps API key is not configured (set TRIP_PLANNER_MAPS_KEY or use --offline)")]
	MissingApiKey,

	#[error("maps request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("invalid maps request url: {0}")]
	Url(String),

	#[error("maps service returned {status}{}", message_suffix(.message))]
	Status {
		status: String,
		message: Option<String>,
	},

	#[error("no result for this location")]
	NoResults,

	#[error("failed to read gazetteer: {0}")]
	GazetteerIo(#[from] std::io::Error),

	#[error("failed to parse gazetteer: {0}")]
	GazetteerParse(#[from] toml::de::Error),
}

fn message_suffix(message: &Option<String>) -> String {
	message
		.as_deref()
		.map(|message| format!(": {message}"))
		.unwrap_or_default()
}

pub trait PlaceProvider {
	/// Resolves a coordinate to a formatted address.
	fn geocode(&self, location: Coordinates) -> Result<String, ProviderError>;

	/// Searches places by free text, biased towards `near`.
	fn text_search(
		&self,
		query: &str,
		near: Coordinates,
		radius_m: u32,
	) -> Result<Vec<PlaceCandidate>, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GoogleMapsProvider {
	client: reqwest::blocking::Client,
	api_key: String,
}

impl GoogleMapsProvider {
	/// Fails when no API key is configured; the builder cannot resolve
	/// places without one.
	pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
		let api_key = api_key
			.filter(|key| !key.trim().is_empty())
			.ok_or(ProviderError::MissingApiKey)?;
		let client = reqwest::blocking::Client::builder()
			.timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
			.build()?;

		Ok(Self { client, api_key })
	}

	fn get<T: for<'de> Deserialize<'de>>(&self, base: &str, params: &[(&str, String)]) -> Result<T, ProviderError> {
		let mut pairs = params.to_vec();
		pairs.push(("key", self.api_key.clone()));
		let url = Url::parse_with_params(base, &pairs)
			.map_err(|err| ProviderError::Url(err.to_string()))?;
		tracing::debug!(endpoint = base, "maps request");

		let response = self.client.get(url).send()?.error_for_status()?;
		Ok(response.json::<T>()?)
	}
}

impl PlaceProvider for GoogleMapsProvider {
	fn geocode(&self, location: Coordinates) -> Result<String, ProviderError> {
		let body: GeocodeResponse = self.get(
			GEOCODE_URL,
			&[("latlng", format!("{},{}", location.lat, location.lng))],
		)?;

		match body.status.as_str() {
			"OK" => body
				.results
				.into_iter()
				.next()
				.map(|result| result.formatted_address)
				.ok_or(ProviderError::NoResults),
			"ZERO_RESULTS" => Err(ProviderError::NoResults),
			_ => Err(ProviderError::Status {
				status: body.status,
				message: body.error_message,
			}),
		}
	}

	fn text_search(
		&self,
		query: &str,
		near: Coordinates,
		radius_m: u32,
	) -> Result<Vec<PlaceCandidate>, ProviderError> {
		let body: TextSearchResponse = self.get(
			TEXT_SEARCH_URL,
			&[
				("query", query.to_string()),
				("location", format!("{},{}", near.lat, near.lng)),
				("radius", radius_m.to_string()),
			],
		)?;

		match body.status.as_str() {
			"OK" => Ok(body
				.results
				.into_iter()
				.filter_map(TextSearchResult::into_candidate)
				.collect()),
			"ZERO_RESULTS" => Ok(Vec::new()),
			_ => Err(ProviderError::Status {
				status: body.status,
				message: body.error_message,
			}),
		}
	}
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
	status: String,
	#[serde(default)]
	error_message: Option<String>,
	#[serde(default)]
	results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
	formatted_address: String,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
	status: String,
	#[serde(default)]
	error_message: Option<String>,
	#[serde(default)]
	results: Vec<TextSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
	name: Option<String>,
	formatted_address: Option<String>,
	geometry: Option<Geometry>,
	rating: Option<f64>,
	#[serde(default)]
	types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
	location: Coordinates,
}

impl TextSearchResult {
	// Results without a position cannot be placed on the map.
	fn into_candidate(self) -> Option<PlaceCandidate> {
		let location = self.geometry?.location;
		Some(PlaceCandidate {
			name: self.name,
			formatted_address: self.formatted_address,
			location,
			rating: self.rating,
			types: self.types,
		})
	}
}
