//! Event handlers of the plan builder.
//!
//! [`Builder`] owns the itinerary together with the edit and search sessions
//! and keeps a [`MapSurface`] in step with the active day: markers are added
//! and removed one at a time as places change, and the day's path is pushed
//! on the first [`Builder::tick`] after the settle delay.

use std::time::{Duration as StdDuration, Instant};

use chrono::NaiveDate;

use crate::backend::CreateTravelPlanRequest;
use crate::config::Config;
use crate::domain::{Coordinates, Itinerary, PlaceRecord};
use crate::edit::EditSession;
use crate::map::{DEFAULT_ZOOM, MapSurface, PLACE_ZOOM};
use crate::provider::PlaceProvider;
use crate::search::SearchSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderSettings {
	pub search_radius_m: u32,
	pub route_settle_delay: StdDuration,
}

impl From<&Config> for BuilderSettings {
	fn from(config: &Config) -> Self {
		Self {
			search_radius_m: config.search_radius_m,
			route_settle_delay: config.route_settle_delay,
		}
	}
}

pub struct Builder<M: MapSurface> {
	itinerary: Itinerary,
	edit: EditSession,
	search: SearchSession,
	map: M,
	settings: BuilderSettings,
	render_due: Option<Instant>,
}

impl<M: MapSurface> Builder<M> {
	/// Takes over an itinerary (fresh or loaded from a draft) and seeds the
	/// map with the active day.
	pub fn new(itinerary: Itinerary, map: M, settings: BuilderSettings) -> Self {
		let mut builder = Self {
			itinerary,
			edit: EditSession::default(),
			search: SearchSession::default(),
			map,
			settings,
			render_due: None,
		};
		builder.seed_markers();
		builder.schedule_render();
		builder
	}

	pub fn itinerary(&self) -> &Itinerary {
		&self.itinerary
	}

	pub fn edit(&self) -> &EditSession {
		&self.edit
	}

	pub fn search_session(&self) -> &SearchSession {
		&self.search
	}

	pub fn map(&self) -> &M {
		&self.map
	}

	pub fn map_mut(&mut self) -> &mut M {
		&mut self.map
	}

	pub fn render_pending(&self) -> bool {
		self.render_due.is_some()
	}

	pub fn set_title(&mut self, title: &str) {
		self.itinerary.set_title(title.trim());
	}

	pub fn set_participants(&mut self, participants: u32) -> bool {
		self.itinerary.set_participants(participants)
	}

	/// Rebuilds the day buckets; every placed location is discarded along
	/// with its marker.
	pub fn set_dates(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
		if !self.itinerary.set_date_range(start, end) {
			return false;
		}

		tracing::debug!(%start, %end, days = self.itinerary.duration(), "trip dates changed");
		self.edit.cancel();
		self.seed_markers();
		self.schedule_render();
		true
	}

	/// Adds a place at a clicked coordinate to the active day. The address
	/// comes from reverse geocoding; when that fails the place keeps the
	/// placeholder address. The new place starts out in edit mode so it can
	/// be named.
	pub fn drop_point(&mut self, location: Coordinates, provider: &dyn PlaceProvider) -> Option<String> {
		if !self.itinerary.details_complete() {
			return None;
		}

		let address = match provider.geocode(location) {
			Ok(address) => Some(address),
			Err(err) => {
				tracing::warn!(error = %err, lat = location.lat, lng = location.lng, "reverse geocoding failed");
				None
			}
		};
		let record = PlaceRecord::dropped_point(location, address);
		self.insert_on_active_day(record)
	}

	/// Searches around `near`. A blank query clears the result list.
	pub fn search(&mut self, text: &str, provider: &dyn PlaceProvider, near: Coordinates) {
		self.search.query(text, provider, near, self.settings.search_radius_m);
	}

	/// Places the chosen search result on the active day and zooms to it.
	pub fn select_result(&mut self, index: usize) -> Option<String> {
		if !self.itinerary.details_complete() {
			self.search.dismiss();
			return None;
		}

		let record = self.search.select(index, &mut self.itinerary)?;
		tracing::debug!(place = record.name(), day = self.itinerary.active_day(), "search result placed");
		self.map.center_on(record.location(), PLACE_ZOOM);
		self.after_insert(&record);
		Some(record.id().to_string())
	}

	pub fn begin_edit(&mut self, place_id: &str) -> bool {
		let Some((_, place)) = self.itinerary.find_place(place_id) else {
			return false;
		};
		let name = place.name().to_string();
		self.edit.begin(place_id, &name);
		true
	}

	pub fn update_edit_draft(&mut self, text: &str) {
		self.edit.update_draft(text);
	}

	/// Renames the place being edited on whichever day holds it. A blank
	/// draft leaves the name alone. Edit mode ends in both cases.
	pub fn commit_edit(&mut self) -> bool {
		let Some(place_id) = self.edit.editing().map(str::to_string) else {
			return false;
		};
		let Some((day, _)) = self.itinerary.find_place(&place_id) else {
			self.edit.cancel();
			return false;
		};

		if !self.edit.commit(&mut self.itinerary, day) {
			return false;
		}

		if day == self.itinerary.active_day() {
			if let Some((_, place)) = self.itinerary.find_place(&place_id) {
				self.map.place_marker(place.id(), place.location(), place.name());
			}
		}
		true
	}

	pub fn cancel_edit(&mut self) {
		self.edit.cancel();
	}

	/// Removes a place from the active day together with its marker.
	pub fn remove_place(&mut self, place_id: &str) -> bool {
		let day = self.itinerary.active_day();
		if !self.itinerary.remove_place(day, place_id) {
			return false;
		}

		if self.edit.is_editing(place_id) {
			self.edit.cancel();
		}
		self.map.remove_marker(place_id);
		self.schedule_render();
		true
	}

	pub fn set_active_day(&mut self, day: u32) -> bool {
		if !self.itinerary.set_active_day(day) {
			return false;
		}

		self.seed_markers();
		self.schedule_render();
		true
	}

	/// Pushes the active day's path once the settle delay has passed.
	/// Returns true when a render happened.
	pub fn tick(&mut self, now: Instant) -> bool {
		match self.render_due {
			Some(due) if now >= due => {
				self.render_due = None;
				self.map.render_path(self.itinerary.route());
				true
			}
			_ => false,
		}
	}

	/// The create request for the backend, once the trip details are
	/// complete and at least one place is planned.
	pub fn submission(&self) -> Option<CreateTravelPlanRequest> {
		if !self.itinerary.details_complete() || self.itinerary.place_count() == 0 {
			return None;
		}
		CreateTravelPlanRequest::from_itinerary(&self.itinerary)
	}

	fn insert_on_active_day(&mut self, record: PlaceRecord) -> Option<String> {
		let day = self.itinerary.active_day();
		if !self.itinerary.add_place(day, record.clone()) {
			return None;
		}
		tracing::debug!(place = record.name(), day, "place added");
		self.after_insert(&record);
		Some(record.id().to_string())
	}

	fn after_insert(&mut self, record: &PlaceRecord) {
		self.map.place_marker(record.id(), record.location(), record.name());
		self.edit.begin(record.id(), record.name());
		self.schedule_render();
	}

	fn seed_markers(&mut self) {
		self.map.clear_markers();
		let Some(bucket) = self.itinerary.active_bucket() else {
			return;
		};
		for place in bucket.places() {
			self.map.place_marker(place.id(), place.location(), place.name());
		}
		if let Some(first) = bucket.places().first() {
			self.map.center_on(first.location(), DEFAULT_ZOOM);
		}
	}

	fn schedule_render(&mut self) {
		self.render_due = Some(Instant::now() + self.settings.route_settle_delay);
	}
}
