use std::fmt::{Display, Formatter};
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use clap::ValueEnum;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Itinerary, PlannedLocation};
use crate::session::AuthSession;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
	#[default]
	Popular,
	Likes,
}

impl Display for SortBy {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			SortBy::Popular => write!(f, "popular"),
			SortBy::Likes => write!(f, "likes"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLocation {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub lat: f64,
	pub lng: f64,
	pub order: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelPlan {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub start_date: String,
	pub end_date: String,
	pub duration: u32,
	pub participants: u32,
	#[serde(default)]
	pub likes: u32,
	#[serde(default)]
	pub locations: Option<Vec<PlanLocation>>,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTravelPlanRequest {
	pub title: String,
	pub start_date: NaiveDate,
	pub end_date: NaiveDate,
	pub participants: u32,
	pub locations: Vec<PlannedLocation>,
}

impl CreateTravelPlanRequest {
	/// `None` until the trip has both dates.
	pub fn from_itinerary(itinerary: &Itinerary) -> Option<Self> {
		let details = itinerary.details();
		Some(Self {
			title: details.title.clone(),
			start_date: details.start_date?,
			end_date: details.end_date?,
			participants: details.participants,
			locations: itinerary.flatten(),
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	#[serde(default)]
	pub id: String,
	pub email: String,
	#[serde(default)]
	pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
	pub access_token: String,
	pub user: User,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
	email: &'a str,
	password: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: Option<String>,
}

#[derive(Debug, Error)]
pub enum BackendError {
	#[error("backend request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("travel plan not found: {0}")]
	NotFound(String),

	#[error("{message}")]
	Rejected { status: u16, message: String },

	#[error("failed to encode request: {0}")]
	Encode(serde_json::Error),

	#[error("invalid backend url: {0}")]
	Url(String),
}

pub trait PlanBackend {
	fn list_plans(&self, sort: SortBy) -> Result<Vec<TravelPlan>, BackendError>;
	fn get_plan(&self, id: &str) -> Result<TravelPlan, BackendError>;
	fn create_plan(&self, request: &CreateTravelPlanRequest) -> Result<TravelPlan, BackendError>;
	fn login(&self, email: &str, password: &str) -> Result<AuthResponse, BackendError>;
	fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse, BackendError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
	client: reqwest::blocking::Client,
	base_url: String,
	token: Option<String>,
}

impl HttpBackend {
	pub fn new(base_url: impl Into<String>, session: Option<&AuthSession>) -> Result<Self, BackendError> {
		let client = reqwest::blocking::Client::builder()
			.timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
			.build()?;
		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			token: session.map(|session| session.token.clone()),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// `/travel-plans/{id}` with the id as one percent-encoded segment.
	fn plan_url(&self, id: &str) -> Result<Url, BackendError> {
		let mut url = Url::parse(&self.url("/travel-plans"))
			.map_err(|err| BackendError::Url(err.to_string()))?;
		url.path_segments_mut()
			.map_err(|()| BackendError::Url(self.base_url.clone()))?
			.push(id);
		Ok(url)
	}

	fn authorize(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
		match &self.token {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}

	fn auth(&self, path: &str, credentials: &Credentials<'_>) -> Result<AuthResponse, BackendError> {
		let body = serde_json::to_vec(credentials).map_err(BackendError::Encode)?;
		let response = self
			.client
			.post(self.url(path))
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(body)
			.send()?;
		read_json(response, path)
	}
}

impl PlanBackend for HttpBackend {
	fn list_plans(&self, sort: SortBy) -> Result<Vec<TravelPlan>, BackendError> {
		let path = format!("/travel-plans?sortBy={sort}");
		tracing::debug!(%sort, "listing travel plans");
		let response = self.authorize(self.client.get(self.url(&path))).send()?;
		read_json(response, &path)
	}

	fn get_plan(&self, id: &str) -> Result<TravelPlan, BackendError> {
		let url = self.plan_url(id)?;
		let path = url.path().to_string();
		let response = self.authorize(self.client.get(url)).send()?;
		if response.status() == StatusCode::NOT_FOUND {
			return Err(BackendError::NotFound(id.to_string()));
		}
		read_json(response, &path)
	}

	fn create_plan(&self, request: &CreateTravelPlanRequest) -> Result<TravelPlan, BackendError> {
		let body = serde_json::to_vec(request).map_err(BackendError::Encode)?;
		tracing::debug!(locations = request.locations.len(), "creating travel plan");
		let response = self
			.authorize(self.client.post(self.url("/travel-plans")))
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(body)
			.send()?;
		read_json(response, "/travel-plans")
	}

	fn login(&self, email: &str, password: &str) -> Result<AuthResponse, BackendError> {
		self.auth(
			"/auth/login",
			&Credentials {
				email,
				password,
				name: None,
			},
		)
	}

	fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthResponse, BackendError> {
		self.auth(
			"/auth/register",
			&Credentials {
				email,
				password,
				name: Some(name),
			},
		)
	}
}

fn read_json<T: for<'de> Deserialize<'de>>(
	response: reqwest::blocking::Response,
	path: &str,
) -> Result<T, BackendError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response.json::<T>()?);
	}

	let body = response.text().unwrap_or_default();
	let message = rejection_message(&body)
		.unwrap_or_else(|| format!("{path} returned {status}"));
	tracing::warn!(path, status = status.as_u16(), "backend rejected request");
	Err(BackendError::Rejected {
		status: status.as_u16(),
		message,
	})
}

fn rejection_message(body: &str) -> Option<String> {
	let payload: ErrorPayload = serde_json::from_str(body).ok()?;
	payload.message.or(payload.error)
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::{CreateTravelPlanRequest, HttpBackend, TravelPlan, rejection_message};
	use crate::domain::{Coordinates, Itinerary, PlaceRecord};

	#[test]
	fn plan_ids_stay_inside_the_plan_path() {
		let backend = HttpBackend::new("http://localhost:4000/api/", None).expect("client");

		let url = backend.plan_url("42").expect("url");
		assert_eq!(url.as_str(), "http://localhost:4000/api/travel-plans/42");

		let url = backend.plan_url("1?sortBy=x").expect("url");
		assert_eq!(url.path(), "/api/travel-plans/1%3FsortBy=x");
		assert_eq!(url.query(), None);

		let url = backend.plan_url("../auth/login").expect("url");
		assert_eq!(url.path(), "/api/travel-plans/..%2Fauth%2Flogin");
	}

	#[test]
	fn create_request_uses_backend_field_names() {
		let mut itinerary = Itinerary::new();
		itinerary.set_title("Gyeongju history walk");
		itinerary.set_participants(3);
		itinerary.set_date_range(
			NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
			NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
		);
		itinerary.add_place(
			1,
			PlaceRecord::new("Bulguksa", "15-1 Jinhyeon-dong", Coordinates::new(35.7898, 129.332)),
		);

		let request = CreateTravelPlanRequest::from_itinerary(&itinerary).expect("dates are set");
		let value = serde_json::to_value(&request).expect("request should serialize");
		assert_eq!(
			value,
			json!({
				"title": "Gyeongju history walk",
				"startDate": "2024-05-01",
				"endDate": "2024-05-03",
				"participants": 3,
				"locations": [
					{
						"lat": 35.7898,
						"lng": 129.332,
						"name": "Bulguksa",
						"address": "15-1 Jinhyeon-dong",
						"order": 1
					}
				]
			})
		);
	}

	#[test]
	fn create_request_needs_dates() {
		assert!(CreateTravelPlanRequest::from_itinerary(&Itinerary::new()).is_none());
	}

	#[test]
	fn parses_plan_with_missing_optional_fields() {
		let raw = r#"{
			"id": "42",
			"title": "Gangneung sea trip",
			"startDate": "2024-06-15",
			"endDate": "2024-06-16",
			"duration": 2,
			"participants": 5
		}"#;
		let plan: TravelPlan = serde_json::from_str(raw).expect("plan should parse");
		assert_eq!(plan.likes, 0);
		assert!(plan.locations.is_none());
		assert_eq!(plan.description, "");
	}

	#[test]
	fn extracts_rejection_message() {
		assert_eq!(
			rejection_message(r#"{"message":"Invalid credentials"}"#).as_deref(),
			Some("Invalid credentials")
		);
		assert_eq!(
			rejection_message(r#"{"error":"Failed to fetch travel plans"}"#).as_deref(),
			Some("Failed to fetch travel plans")
		);
		assert_eq!(rejection_message("<html>"), None);
	}
}
