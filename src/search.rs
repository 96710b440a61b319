use crate::domain::{Coordinates, Itinerary, PlaceRecord, UNNAMED_PLACE_NAME};
use crate::provider::{PlaceCandidate, PlaceProvider, ProviderError};

pub const MAX_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
	Idle,
	Querying,
	Showing,
}

/// Handle for an issued query. Responses carrying an older ticket than the
/// latest issued one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
	seq: u64,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
	query: String,
	results: Vec<PlaceCandidate>,
	visible: bool,
	phase: SearchPhase,
	issued: u64,
}

impl Default for SearchSession {
	fn default() -> Self {
		Self {
			query: String::new(),
			results: Vec::new(),
			visible: false,
			phase: SearchPhase::Idle,
			issued: 0,
		}
	}
}

impl SearchSession {
	pub fn query_text(&self) -> &str {
		&self.query
	}

	pub fn results(&self) -> &[PlaceCandidate] {
		&self.results
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn phase(&self) -> SearchPhase {
		self.phase
	}

	/// Runs a search and applies its outcome in one step.
	pub fn query(
		&mut self,
		text: &str,
		provider: &dyn PlaceProvider,
		near: Coordinates,
		radius_m: u32,
	) {
		let Some(ticket) = self.begin(text) else {
			return;
		};
		let outcome = provider.text_search(text.trim(), near, radius_m);
		self.apply(ticket, outcome);
	}

	/// Records a new query. A blank query resets the session and issues
	/// nothing.
	pub fn begin(&mut self, text: &str) -> Option<SearchTicket> {
		self.issued += 1;
		if text.trim().is_empty() {
			self.reset();
			return None;
		}

		self.query = text.to_string();
		self.phase = SearchPhase::Querying;
		Some(SearchTicket { seq: self.issued })
	}

	/// Applies a provider response. Returns false when the response belongs
	/// to a query that has since been superseded.
	pub fn apply(
		&mut self,
		ticket: SearchTicket,
		outcome: Result<Vec<PlaceCandidate>, ProviderError>,
	) -> bool {
		if ticket.seq != self.issued {
			tracing::debug!(stale = ticket.seq, latest = self.issued, "dropping stale search response");
			return false;
		}

		match outcome {
			Ok(mut results) if !results.is_empty() => {
				results.truncate(MAX_SEARCH_RESULTS);
				self.results = results;
				self.visible = true;
				self.phase = SearchPhase::Showing;
			}
			Ok(_) => {
				self.hide_results();
			}
			Err(err) => {
				tracing::warn!(error = %err, "place search failed");
				self.hide_results();
			}
		}
		true
	}

	/// Turns the chosen result into a place on the active day and resets the
	/// session. Returns the new record as stored, or `None` when the
	/// itinerary refused it. The session resets either way.
	pub fn select(&mut self, index: usize, itinerary: &mut Itinerary) -> Option<PlaceRecord> {
		let candidate = self.results.get(index)?;
		let record = place_from_candidate(candidate);
		let day = itinerary.active_day();
		let added = itinerary.add_place(day, record.clone());

		self.dismiss();
		added.then_some(record)
	}

	/// Clears the query and results and invalidates anything in flight.
	pub fn dismiss(&mut self) {
		self.issued += 1;
		self.reset();
	}

	fn hide_results(&mut self) {
		self.results.clear();
		self.visible = false;
		self.phase = SearchPhase::Querying;
	}

	fn reset(&mut self) {
		self.query.clear();
		self.results.clear();
		self.visible = false;
		self.phase = SearchPhase::Idle;
	}
}

pub fn place_from_candidate(candidate: &PlaceCandidate) -> PlaceRecord {
	PlaceRecord::new(
		candidate
			.name
			.clone()
			.unwrap_or_else(|| UNNAMED_PLACE_NAME.to_string()),
		candidate.formatted_address.clone().unwrap_or_default(),
		candidate.location,
	)
	.with_rating(candidate.rating)
	.with_types(candidate.types.clone())
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;
	use pretty_assertions::assert_eq;

	use super::{MAX_SEARCH_RESULTS, SearchPhase, SearchSession, place_from_candidate};
	use crate::domain::{Coordinates, Itinerary};
	use crate::gazetteer::{GazetteerEntry, GazetteerProvider};
	use crate::provider::{PlaceCandidate, PlaceProvider, ProviderError};

	const SEOUL: Coordinates = Coordinates {
		lat: 37.5665,
		lng: 126.9780,
	};

	struct FailingProvider;

	impl PlaceProvider for FailingProvider {
		fn geocode(&self, _location: Coordinates) -> Result<String, ProviderError> {
			Err(ProviderError::NoResults)
		}

		fn text_search(
			&self,
			_query: &str,
			_near: Coordinates,
			_radius_m: u32,
		) -> Result<Vec<PlaceCandidate>, ProviderError> {
			Err(ProviderError::Status {
				status: "OVER_QUERY_LIMIT".to_string(),
				message: None,
			})
		}
	}

	fn many_cafes() -> GazetteerProvider {
		GazetteerProvider::new(
			(0..8)
				.map(|index| GazetteerEntry {
					name: format!("Cafe {index}"),
					address: "Seoul".to_string(),
					lat: 37.5 + f64::from(index) * 0.01,
					lng: 127.0,
					rating: Some(4.0),
					types: vec!["cafe".to_string()],
				})
				.collect(),
		)
	}

	fn candidate(name: &str) -> PlaceCandidate {
		PlaceCandidate {
			name: Some(name.to_string()),
			formatted_address: Some(format!("{name} address")),
			location: SEOUL,
			rating: None,
			types: Vec::new(),
		}
	}

	fn trip() -> Itinerary {
		let mut itinerary = Itinerary::new();
		itinerary.set_date_range(
			NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
			NaiveDate::from_ymd_opt(2024, 3, 17).unwrap(),
		);
		itinerary
	}

	#[test]
	fn keeps_at_most_five_results_and_shows_panel() {
		let mut session = SearchSession::default();
		session.query("cafe", &many_cafes(), SEOUL, 50_000);
		assert_eq!(session.results().len(), MAX_SEARCH_RESULTS);
		assert!(session.is_visible());
		assert_eq!(session.phase(), SearchPhase::Showing);
	}

	#[test]
	fn empty_query_always_resets() {
		let mut session = SearchSession::default();
		session.query("cafe", &many_cafes(), SEOUL, 50_000);
		session.query("   ", &many_cafes(), SEOUL, 50_000);
		assert!(session.results().is_empty());
		assert!(!session.is_visible());
		assert_eq!(session.phase(), SearchPhase::Idle);
	}

	#[test]
	fn failure_or_no_match_hides_results() {
		let mut session = SearchSession::default();
		session.query("cafe", &many_cafes(), SEOUL, 50_000);
		session.query("cafe", &FailingProvider, SEOUL, 50_000);
		assert!(session.results().is_empty());
		assert!(!session.is_visible());

		session.query("cafe", &many_cafes(), SEOUL, 50_000);
		session.query("museum", &many_cafes(), SEOUL, 50_000);
		assert!(session.results().is_empty());
		assert!(!session.is_visible());
	}

	#[test]
	fn stale_response_is_discarded() {
		let mut session = SearchSession::default();
		let older = session.begin("ca").expect("ticket");
		let newer = session.begin("cafe").expect("ticket");

		assert!(session.apply(newer, Ok(vec![candidate("Cafe Latest")])));
		assert!(!session.apply(older, Ok(vec![candidate("Stale")])));
		assert_eq!(session.results()[0].name.as_deref(), Some("Cafe Latest"));

		let cleared = session.begin("");
		assert!(cleared.is_none());
		assert!(!session.apply(newer, Ok(vec![candidate("Too late")])));
		assert!(!session.is_visible());
	}

	#[test]
	fn select_adds_to_active_day_and_returns_to_idle() {
		let mut itinerary = trip();
		itinerary.set_active_day(2);
		let mut session = SearchSession::default();
		let ticket = session.begin("palace").expect("ticket");
		session.apply(ticket, Ok(vec![candidate("Gyeongbokgung"), candidate("Changdeokgung")]));

		let record = session.select(1, &mut itinerary).expect("selection should add a place");
		assert_eq!(record.name(), "Changdeokgung");
		assert_eq!(itinerary.day(2).unwrap().places().len(), 1);
		assert_eq!(itinerary.day(2).unwrap().places()[0].id(), record.id());
		assert_eq!(itinerary.place_count(), 1);

		assert_eq!(session.query_text(), "");
		assert!(session.results().is_empty());
		assert!(!session.is_visible());
		assert_eq!(session.phase(), SearchPhase::Idle);
	}

	#[test]
	fn select_out_of_range_changes_nothing() {
		let mut itinerary = trip();
		let mut session = SearchSession::default();
		let ticket = session.begin("palace").expect("ticket");
		session.apply(ticket, Ok(vec![candidate("Gyeongbokgung")]));

		assert!(session.select(3, &mut itinerary).is_none());
		assert_eq!(itinerary.place_count(), 0);
		assert!(session.is_visible());
	}

	#[test]
	fn select_without_dates_still_closes_the_panel() {
		let mut itinerary = Itinerary::new();
		let mut session = SearchSession::default();
		let ticket = session.begin("palace").expect("ticket");
		session.apply(ticket, Ok(vec![candidate("Gyeongbokgung")]));
		assert_eq!(session.phase(), SearchPhase::Showing);

		assert!(session.select(0, &mut itinerary).is_none());
		assert_eq!(itinerary.place_count(), 0);
		assert_eq!(session.query_text(), "");
		assert!(session.results().is_empty());
		assert!(!session.is_visible());
		assert_eq!(session.phase(), SearchPhase::Idle);
	}

	#[test]
	fn unnamed_candidate_gets_placeholder_name() {
		let mut raw = candidate("ignored");
		raw.name = None;
		raw.rating = Some(4.2);
		let record = place_from_candidate(&raw);
		assert_eq!(record.name(), "Selected place");
		assert_eq!(record.rating(), Some(4.2));
	}
}
