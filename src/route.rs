use crate::domain::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Ordered path through a day's places. Origin is the first point,
/// destination the last, everything between is a waypoint in visiting order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
	points: Vec<Coordinates>,
}

impl Route {
	pub fn empty() -> Self {
		Self { points: Vec::new() }
	}

	pub fn points(&self) -> &[Coordinates] {
		&self.points
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	pub fn origin(&self) -> Option<Coordinates> {
		self.points.first().copied()
	}

	pub fn destination(&self) -> Option<Coordinates> {
		self.points.last().copied()
	}

	pub fn waypoints(&self) -> &[Coordinates] {
		match self.points.len() {
			0..=2 => &[],
			len => &self.points[1..len - 1],
		}
	}

	pub fn leg_distances_km(&self) -> Vec<f64> {
		self.points
			.windows(2)
			.map(|pair| haversine_km(pair[0], pair[1]))
			.collect()
	}

	pub fn total_km(&self) -> f64 {
		self.leg_distances_km().iter().sum()
	}
}

/// Fewer than two points draw nothing; the order is never optimized.
pub fn derive_route(points: &[Coordinates]) -> Route {
	if points.len() < 2 {
		return Route::empty();
	}

	Route {
		points: points.to_vec(),
	}
}

pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
	let lat1 = from.lat.to_radians();
	let lat2 = to.lat.to_radians();
	let delta_lat = (to.lat - from.lat).to_radians();
	let delta_lng = (to.lng - from.lng).to_radians();

	let a = (delta_lat / 2.0).sin().powi(2)
		+ lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
	2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

pub fn format_distance(km: f64) -> String {
	if km < 1.0 {
		format!("{:.0} m", km * 1000.0)
	} else {
		format!("{km:.1} km")
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::{derive_route, format_distance, haversine_km};
	use crate::domain::Coordinates;

	#[test]
	fn fewer_than_two_points_yield_empty_path() {
		assert!(derive_route(&[]).is_empty());
		assert!(derive_route(&[Coordinates::new(37.5665, 126.9780)]).is_empty());
	}

	#[test]
	fn keeps_input_order_without_optimizing() {
		let points = vec![
			Coordinates::new(35.1587, 129.1603),
			Coordinates::new(37.5665, 126.9780),
			Coordinates::new(35.1532, 129.1186),
			Coordinates::new(33.4584, 126.9427),
		];
		let route = derive_route(&points);
		assert_eq!(route.len(), 4);
		assert_eq!(route.points(), points.as_slice());
		assert_eq!(route.origin(), Some(points[0]));
		assert_eq!(route.destination(), Some(points[3]));
		assert_eq!(route.waypoints(), &points[1..3]);
	}

	#[test]
	fn two_point_route_has_no_waypoints() {
		let route = derive_route(&[Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0)]);
		assert!(route.waypoints().is_empty());
		assert_eq!(route.leg_distances_km().len(), 1);
	}

	#[test]
	fn measures_great_circle_distance() {
		let haeundae = Coordinates::new(35.1587, 129.1603);
		let gwangalli = Coordinates::new(35.1532, 129.1186);
		let km = haversine_km(haeundae, gwangalli);
		assert!((km - 3.84).abs() < 0.05, "unexpected distance {km}");

		let route = derive_route(&[haeundae, gwangalli, haeundae]);
		assert!((route.total_km() - 2.0 * km).abs() < 1e-9);
	}

	#[test]
	fn formats_short_and_long_distances() {
		assert_eq!(format_distance(0.42), "420 m");
		assert_eq!(format_distance(12.345), "12.3 km");
	}
}
