use crate::domain::Coordinates;
use crate::route::Route;

pub const DEFAULT_ZOOM: u8 = 11;
pub const PLACE_ZOOM: u8 = 16;
const MIN_ZOOM: u8 = 1;
const MAX_ZOOM: u8 = 18;
// Fraction of the visible span moved by one pan step.
const PAN_STEP: f64 = 0.25;

/// Rendering side of the map: the builder pushes markers, the view center
/// and the active day's path through this, and never reads them back.
pub trait MapSurface {
	fn center_on(&mut self, center: Coordinates, zoom: u8);
	fn place_marker(&mut self, id: &str, location: Coordinates, label: &str);
	fn remove_marker(&mut self, id: &str);
	fn clear_markers(&mut self);
	fn render_path(&mut self, route: &Route);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
	pub id: String,
	pub location: Coordinates,
	pub label: String,
}

/// In-memory map scene drawn by the terminal canvas.
#[derive(Debug, Clone)]
pub struct MapView {
	center: Coordinates,
	zoom: u8,
	markers: Vec<Marker>,
	path: Route,
}

impl MapView {
	pub fn new(center: Coordinates) -> Self {
		Self {
			center,
			zoom: DEFAULT_ZOOM,
			markers: Vec::new(),
			path: Route::empty(),
		}
	}

	pub fn center(&self) -> Coordinates {
		self.center
	}

	pub fn zoom(&self) -> u8 {
		self.zoom
	}

	pub fn markers(&self) -> &[Marker] {
		&self.markers
	}

	pub fn path(&self) -> &Route {
		&self.path
	}

	pub fn zoom_by(&mut self, delta: i8) {
		self.zoom = self.zoom.saturating_add_signed(delta).clamp(MIN_ZOOM, MAX_ZOOM);
	}

	/// Moves the view by whole pan steps; positive `east`/`north` move the
	/// center east and north.
	pub fn pan(&mut self, east: i32, north: i32) {
		let (lng_span, lat_span) = self.spans();
		self.center.lng = wrap_longitude(self.center.lng + f64::from(east) * lng_span * PAN_STEP);
		self.center.lat = (self.center.lat + f64::from(north) * lat_span * PAN_STEP).clamp(-85.0, 85.0);
	}

	/// Longitude and latitude bounds of the visible area.
	pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
		let (lng_span, lat_span) = self.spans();
		(
			[self.center.lng - lng_span / 2.0, self.center.lng + lng_span / 2.0],
			[self.center.lat - lat_span / 2.0, self.center.lat + lat_span / 2.0],
		)
	}

	fn spans(&self) -> (f64, f64) {
		let lng_span = 360.0 / 2f64.powi(i32::from(self.zoom) - 1);
		(lng_span, lng_span / 2.0)
	}
}

impl MapSurface for MapView {
	fn center_on(&mut self, center: Coordinates, zoom: u8) {
		self.center = center;
		self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
	}

	fn place_marker(&mut self, id: &str, location: Coordinates, label: &str) {
		if let Some(marker) = self.markers.iter_mut().find(|marker| marker.id == id) {
			marker.location = location;
			marker.label = label.to_string();
			return;
		}

		self.markers.push(Marker {
			id: id.to_string(),
			location,
			label: label.to_string(),
		});
	}

	fn remove_marker(&mut self, id: &str) {
		self.markers.retain(|marker| marker.id != id);
	}

	fn clear_markers(&mut self) {
		self.markers.clear();
	}

	fn render_path(&mut self, route: &Route) {
		self.path = route.clone();
	}
}

fn wrap_longitude(lng: f64) -> f64 {
	(lng + 180.0).rem_euclid(360.0) - 180.0
}
