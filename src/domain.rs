use chrono::NaiveDate;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

use crate::route::{Route, derive_route};

const ID_LEN: usize = 12;

pub const DROPPED_POINT_NAME: &str = "Selected location";
pub const UNNAMED_PLACE_NAME: &str = "Selected place";
pub const MISSING_ADDRESS: &str = "No address information";
pub const POINT_OF_INTEREST_TAG: &str = "point_of_interest";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
	pub lat: f64,
	pub lng: f64,
}

impl Coordinates {
	pub fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
	id: String,
	name: String,
	address: String,
	location: Coordinates,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	rating: Option<f64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	types: Vec<String>,
}

impl PlaceRecord {
	pub fn new(name: impl Into<String>, address: impl Into<String>, location: Coordinates) -> Self {
		Self {
			id: generate_id(),
			name: name.into(),
			address: address.into(),
			location,
			rating: None,
			types: Vec::new(),
		}
	}

	/// A point dropped on the map, named with the placeholder until renamed.
	pub fn dropped_point(location: Coordinates, address: Option<String>) -> Self {
		Self::new(
			DROPPED_POINT_NAME,
			address.unwrap_or_else(|| MISSING_ADDRESS.to_string()),
			location,
		)
		.with_types(vec![POINT_OF_INTEREST_TAG.to_string()])
	}

	pub fn with_rating(mut self, rating: Option<f64>) -> Self {
		self.rating = rating;
		self
	}

	pub fn with_types(mut self, types: Vec<String>) -> Self {
		self.types = types;
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn address(&self) -> &str {
		&self.address
	}

	pub fn location(&self) -> Coordinates {
		self.location
	}

	pub fn rating(&self) -> Option<f64> {
		self.rating
	}

	pub fn types(&self) -> &[String] {
		&self.types
	}

	fn set_name(&mut self, name: String) {
		self.name = name;
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
	day: u32,
	places: Vec<PlaceRecord>,
}

impl DayBucket {
	fn new(day: u32) -> Self {
		Self {
			day,
			places: Vec::new(),
		}
	}

	pub fn day(&self) -> u32 {
		self.day
	}

	pub fn places(&self) -> &[PlaceRecord] {
		&self.places
	}

	pub fn is_empty(&self) -> bool {
		self.places.is_empty()
	}

	pub fn coordinates(&self) -> Vec<Coordinates> {
		self.places.iter().map(PlaceRecord::location).collect()
	}

	fn place_mut(&mut self, place_id: &str) -> Option<&mut PlaceRecord> {
		self.places.iter_mut().find(|place| place.id == place_id)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
	#[serde(default)]
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_date: Option<NaiveDate>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_date: Option<NaiveDate>,
	pub participants: u32,
}

impl Default for TripDetails {
	fn default() -> Self {
		Self {
			title: String::new(),
			start_date: None,
			end_date: None,
			participants: 1,
		}
	}
}

/// One entry of the submission list: a place with its global visiting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedLocation {
	pub lat: f64,
	pub lng: f64,
	pub name: String,
	pub address: String,
	pub order: u32,
}

#[derive(Debug, Clone)]
pub struct Itinerary {
	details: TripDetails,
	days: Vec<DayBucket>,
	active_day: u32,
	route: Route,
}

impl Default for Itinerary {
	fn default() -> Self {
		Self::new()
	}
}

impl Itinerary {
	pub fn new() -> Self {
		Self {
			details: TripDetails::default(),
			days: Vec::new(),
			active_day: 1,
			route: Route::empty(),
		}
	}

	/// Rebuilds an itinerary from stored details and `(day, place)` pairs.
	/// Places assigned to a day outside the trip are dropped.
	pub fn from_parts(details: TripDetails, placements: Vec<(u32, PlaceRecord)>) -> Self {
		let mut itinerary = Self::new();
		itinerary.details.title = details.title;
		itinerary.details.participants = details.participants.max(1);
		if let (Some(start), Some(end)) = (details.start_date, details.end_date) {
			itinerary.set_date_range(start, end);
		}

		for (day, place) in placements {
			if !itinerary.add_place(day, place) {
				tracing::warn!(day, "dropping stored place outside the trip's days");
			}
		}

		itinerary
	}

	pub fn details(&self) -> &TripDetails {
		&self.details
	}

	pub fn title(&self) -> &str {
		&self.details.title
	}

	/// Titles are single-line; embedded line breaks become spaces.
	pub fn set_title(&mut self, title: impl Into<String>) {
		let title: String = title.into();
		self.details.title = title
			.split(['\r', '\n'])
			.filter(|part| !part.trim().is_empty())
			.map(str::trim)
			.collect::<Vec<_>>()
			.join(" ");
	}

	pub fn set_participants(&mut self, participants: u32) -> bool {
		if participants == 0 {
			return false;
		}
		self.details.participants = participants;
		true
	}

	pub fn duration(&self) -> u32 {
		self.days.len() as u32
	}

	pub fn days(&self) -> &[DayBucket] {
		&self.days
	}

	pub fn day(&self, day: u32) -> Option<&DayBucket> {
		let index = day.checked_sub(1)? as usize;
		self.days.get(index)
	}

	pub fn active_day(&self) -> u32 {
		self.active_day
	}

	pub fn active_bucket(&self) -> Option<&DayBucket> {
		self.day(self.active_day)
	}

	pub fn route(&self) -> &Route {
		&self.route
	}

	pub fn place_count(&self) -> usize {
		self.days.iter().map(|bucket| bucket.places.len()).sum()
	}

	pub fn find_place(&self, place_id: &str) -> Option<(u32, &PlaceRecord)> {
		self.days.iter().find_map(|bucket| {
			bucket
				.places
				.iter()
				.find(|place| place.id == place_id)
				.map(|place| (bucket.day, place))
		})
	}

	/// Title, both dates and at least one participant: the gate before places
	/// can be assigned.
	pub fn details_complete(&self) -> bool {
		!self.details.title.trim().is_empty()
			&& self.details.start_date.is_some()
			&& self.details.end_date.is_some()
			&& self.details.participants >= 1
	}

	/// Resets every day bucket. Places assigned before the change are
	/// discarded.
	pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
		let Some(duration) = trip_duration(start, end) else {
			tracing::debug!(%start, %end, "ignoring date range that ends before it starts");
			return false;
		};

		self.details.start_date = Some(start);
		self.details.end_date = Some(end);
		self.days = (1..=duration).map(DayBucket::new).collect();
		self.active_day = 1;
		self.recompute_route();
		tracing::debug!(duration, "rebuilt day buckets");
		true
	}

	pub fn add_place(&mut self, day: u32, place: PlaceRecord) -> bool {
		let Some(bucket) = self.bucket_mut(day) else {
			return false;
		};
		tracing::debug!(day, place_id = place.id(), "adding place");
		bucket.places.push(place);
		self.refresh_if_active(day);
		true
	}

	pub fn remove_place(&mut self, day: u32, place_id: &str) -> bool {
		let Some(bucket) = self.bucket_mut(day) else {
			return false;
		};
		let before = bucket.places.len();
		bucket.places.retain(|place| place.id != place_id);
		if bucket.places.len() == before {
			return false;
		}
		tracing::debug!(day, place_id, "removed place");
		self.refresh_if_active(day);
		true
	}

	pub fn rename_place(&mut self, day: u32, place_id: &str, new_name: &str) -> bool {
		let trimmed = new_name.trim();
		if trimmed.is_empty() {
			return false;
		}

		let Some(place) = self
			.bucket_mut(day)
			.and_then(|bucket| bucket.place_mut(place_id))
		else {
			return false;
		};
		place.set_name(trimmed.to_string());
		true
	}

	pub fn set_active_day(&mut self, day: u32) -> bool {
		if self.day(day).is_none() {
			return false;
		}
		self.active_day = day;
		self.recompute_route();
		true
	}

	pub fn flatten(&self) -> Vec<PlannedLocation> {
		self.days
			.iter()
			.flat_map(|bucket| bucket.places.iter())
			.enumerate()
			.map(|(index, place)| PlannedLocation {
				lat: place.location.lat,
				lng: place.location.lng,
				name: place.name.clone(),
				address: place.address.clone(),
				order: index as u32 + 1,
			})
			.collect()
	}

	/// Every stored place paired with the day it belongs to, in flatten order.
	pub fn placements(&self) -> impl Iterator<Item = (u32, &PlaceRecord)> {
		self.days
			.iter()
			.flat_map(|bucket| bucket.places.iter().map(move |place| (bucket.day, place)))
	}

	fn bucket_mut(&mut self, day: u32) -> Option<&mut DayBucket> {
		let index = day.checked_sub(1)? as usize;
		self.days.get_mut(index)
	}

	fn refresh_if_active(&mut self, day: u32) {
		if day == self.active_day {
			self.recompute_route();
		}
	}

	fn recompute_route(&mut self) {
		let coordinates = self
			.active_bucket()
			.map(DayBucket::coordinates)
			.unwrap_or_default();
		self.route = derive_route(&coordinates);
	}
}

/// Inclusive day count between two dates, `None` when `end` precedes `start`.
pub fn trip_duration(start: NaiveDate, end: NaiveDate) -> Option<u32> {
	let days = end.signed_duration_since(start).num_days();
	u32::try_from(days + 1).ok().filter(|duration| *duration >= 1)
}

pub fn generate_id() -> String {
	thread_rng()
		.sample_iter(&Alphanumeric)
		.take(ID_LEN)
		.map(char::from)
		.collect()
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;
	use pretty_assertions::assert_eq;

	use super::{Coordinates, Itinerary, PlaceRecord, trip_duration};

	fn date(year: i32, month: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(year, month, day).unwrap()
	}

	fn place(name: &str, lat: f64, lng: f64) -> PlaceRecord {
		PlaceRecord::new(name, format!("{name} address"), Coordinates::new(lat, lng))
	}

	fn three_day_trip() -> Itinerary {
		let mut itinerary = Itinerary::new();
		assert!(itinerary.set_date_range(date(2024, 3, 15), date(2024, 3, 17)));
		itinerary
	}

	#[test]
	fn date_range_builds_one_empty_bucket_per_day() {
		let itinerary = three_day_trip();
		assert_eq!(itinerary.duration(), 3);
		assert_eq!(itinerary.days().len(), 3);
		let indices = itinerary.days().iter().map(|bucket| bucket.day()).collect::<Vec<_>>();
		assert_eq!(indices, vec![1, 2, 3]);
		assert!(itinerary.days().iter().all(|bucket| bucket.is_empty()));
	}

	#[test]
	fn duration_matches_inclusive_day_count() {
		for (start, end, expected) in [
			(date(2024, 2, 14), date(2024, 2, 14), 1),
			(date(2024, 2, 28), date(2024, 3, 1), 3),
			(date(2023, 12, 30), date(2024, 1, 2), 4),
		] {
			let mut itinerary = Itinerary::new();
			itinerary.set_date_range(start, end);
			assert_eq!(trip_duration(start, end), Some(expected));
			assert_eq!(itinerary.duration(), expected);
			assert_eq!(itinerary.days().len() as u32, expected);
		}
	}

	#[test]
	fn reversed_date_range_is_ignored() {
		let mut itinerary = three_day_trip();
		itinerary.add_place(1, place("Haeundae", 35.1587, 129.1603));
		assert!(!itinerary.set_date_range(date(2024, 3, 17), date(2024, 3, 15)));
		assert_eq!(itinerary.duration(), 3);
		assert_eq!(itinerary.place_count(), 1);
	}

	#[test]
	fn changing_dates_discards_all_places() {
		let mut itinerary = three_day_trip();
		itinerary.add_place(1, place("Haeundae", 35.1587, 129.1603));
		itinerary.add_place(3, place("Gwangalli", 35.1532, 129.1186));

		itinerary.set_date_range(date(2024, 3, 15), date(2024, 3, 18));
		assert_eq!(itinerary.duration(), 4);
		assert_eq!(itinerary.place_count(), 0);
		assert_eq!(itinerary.active_day(), 1);
	}

	#[test]
	fn flatten_orders_by_day_then_insertion() {
		let mut itinerary = three_day_trip();
		itinerary.add_place(2, place("day2", 35.0, 129.0));
		let flat = itinerary.flatten();
		assert_eq!(flat.len(), 1);
		assert_eq!(flat[0].order, 1);

		itinerary.add_place(1, place("day1-a", 35.1, 129.1));
		itinerary.add_place(1, place("day1-b", 35.2, 129.2));
		let flat = itinerary.flatten();
		let rows = flat
			.iter()
			.map(|location| (location.name.as_str(), location.order))
			.collect::<Vec<_>>();
		assert_eq!(rows, vec![("day1-a", 1), ("day1-b", 2), ("day2", 3)]);
		assert_eq!(flat.len(), itinerary.place_count());
	}

	#[test]
	fn add_place_out_of_range_is_ignored() {
		let mut itinerary = three_day_trip();
		assert!(!itinerary.add_place(0, place("nowhere", 0.0, 0.0)));
		assert!(!itinerary.add_place(4, place("nowhere", 0.0, 0.0)));
		assert_eq!(itinerary.place_count(), 0);
	}

	#[test]
	fn blank_rename_keeps_previous_name() {
		let mut itinerary = three_day_trip();
		let record = place("Bulguksa", 35.7898, 129.3320);
		let id = record.id().to_string();
		itinerary.add_place(1, record);

		assert!(!itinerary.rename_place(1, &id, "   "));
		assert_eq!(itinerary.find_place(&id).unwrap().1.name(), "Bulguksa");

		assert!(itinerary.rename_place(1, &id, "  Seokguram  "));
		assert_eq!(itinerary.find_place(&id).unwrap().1.name(), "Seokguram");
	}

	#[test]
	fn removing_unknown_place_changes_nothing() {
		let mut itinerary = three_day_trip();
		itinerary.add_place(1, place("Hongdae", 37.5563, 126.9236));
		let before = itinerary.day(1).unwrap().clone();

		assert!(!itinerary.remove_place(1, "missing"));
		assert_eq!(itinerary.day(1).unwrap(), &before);
	}

	#[test]
	fn route_follows_active_day_mutations() {
		let mut itinerary = three_day_trip();
		let first = place("a", 37.0, 127.0);
		let first_id = first.id().to_string();
		itinerary.add_place(1, first);
		assert!(itinerary.route().is_empty());

		itinerary.add_place(1, place("b", 37.1, 127.1));
		assert_eq!(itinerary.route().len(), 2);

		itinerary.add_place(2, place("c", 36.0, 128.0));
		assert_eq!(itinerary.route().len(), 2);

		itinerary.remove_place(1, &first_id);
		assert!(itinerary.route().is_empty());

		assert!(itinerary.set_active_day(2));
		assert!(itinerary.route().is_empty());
		assert!(!itinerary.set_active_day(9));
		assert_eq!(itinerary.active_day(), 2);
	}

	#[test]
	fn from_parts_drops_places_outside_the_trip() {
		let mut source = three_day_trip();
		source.set_title("Busan food tour");
		source.add_place(3, place("kept", 35.0, 129.0));
		let placements = source
			.placements()
			.map(|(day, place)| (day, place.clone()))
			.chain(std::iter::once((7, place("dropped", 0.0, 0.0))))
			.collect::<Vec<_>>();

		let restored = Itinerary::from_parts(source.details().clone(), placements);
		assert_eq!(restored.title(), "Busan food tour");
		assert_eq!(restored.place_count(), 1);
		assert_eq!(restored.day(3).unwrap().places()[0].name(), "kept");
	}

	#[test]
	fn title_line_breaks_collapse_to_spaces() {
		let mut itinerary = Itinerary::new();
		itinerary.set_title("Gyeongju\r\n\nday trip");
		assert_eq!(itinerary.title(), "Gyeongju day trip");
		itinerary.set_title("Andong hahoe");
		assert_eq!(itinerary.title(), "Andong hahoe");
	}

	#[test]
	fn details_gate_requires_title_dates_and_participants() {
		let mut itinerary = Itinerary::new();
		assert!(!itinerary.details_complete());
		itinerary.set_title("Jeju");
		assert!(!itinerary.details_complete());
		itinerary.set_date_range(date(2024, 4, 1), date(2024, 4, 4));
		assert!(itinerary.details_complete());
		assert!(!itinerary.set_participants(0));
		assert_eq!(itinerary.details().participants, 1);
	}
}
