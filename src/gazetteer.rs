use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::domain::Coordinates;
use crate::provider::{PlaceCandidate, PlaceProvider, ProviderError};
use crate::route::haversine_km;

const GEOCODE_MATCH_RADIUS_KM: f64 = 1.0;

#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerEntry {
	pub name: String,
	pub address: String,
	pub lat: f64,
	pub lng: f64,
	#[serde(default)]
	pub rating: Option<f64>,
	#[serde(default)]
	pub types: Vec<String>,
}

impl GazetteerEntry {
	fn location(&self) -> Coordinates {
		Coordinates::new(self.lat, self.lng)
	}

	fn matches(&self, needle: &str) -> bool {
		self.name.to_lowercase().contains(needle) || self.address.to_lowercase().contains(needle)
	}
}

#[derive(Debug, Deserialize)]
struct GazetteerFile {
	#[serde(default)]
	places: Vec<GazetteerEntry>,
}

/// Offline place provider over a fixed list of named places.
#[derive(Debug, Clone, Default)]
pub struct GazetteerProvider {
	entries: Vec<GazetteerEntry>,
}

impl GazetteerProvider {
	pub fn new(entries: Vec<GazetteerEntry>) -> Self {
		Self { entries }
	}

	pub fn load(path: &Path) -> Result<Self, ProviderError> {
		let raw = fs::read_to_string(path)?;
		let file: GazetteerFile = toml::from_str(&raw)?;
		tracing::debug!(entries = file.places.len(), path = %path.display(), "loaded gazetteer");
		Ok(Self::new(file.places))
	}

	pub fn builtin() -> Self {
		let entry = |name: &str, address: &str, lat: f64, lng: f64, kind: &str| GazetteerEntry {
			name: name.to_string(),
			address: address.to_string(),
			lat,
			lng,
			rating: None,
			types: vec![kind.to_string()],
		};

		Self::new(vec![
			entry("Haeundae Beach", "1394 U-dong, Haeundae-gu, Busan", 35.1587, 129.1603, "natural_feature"),
			entry("Gwangalli Beach", "219 Gwangan-dong, Suyeong-gu, Busan", 35.1532, 129.1186, "natural_feature"),
			entry("Seongsan Ilchulbong", "1 Seongsan-ri, Seongsan-eup, Seogwipo, Jeju", 33.4584, 126.9427, "tourist_attraction"),
			entry("Hallasan", "102 Jejudaehak-ro, Jeju", 33.3617, 126.5292, "natural_feature"),
			entry("Hongdae Street", "188-5 Yeonnam-dong, Mapo-gu, Seoul", 37.5563, 126.9236, "point_of_interest"),
			entry("Hangang Park", "330 Yeouido-dong, Yeongdeungpo-gu, Seoul", 37.5326, 126.9652, "park"),
			entry("Bulguksa", "15-1 Jinhyeon-dong, Gyeongju", 35.7898, 129.3320, "place_of_worship"),
			entry("Seokguram", "891 Jinhyeon-dong, Gyeongju", 35.7948, 129.3469, "place_of_worship"),
			entry("Jeongdongjin", "17 Jeongdongjin-ri, Gangdong-myeon, Gangneung", 37.6907, 129.0348, "point_of_interest"),
			entry("Anmok Beach", "20 Anmokhang-gil, Gangneung", 37.7719, 128.9479, "natural_feature"),
			entry("Jeonju Hanok Village", "99 Girin-daero, Wansan-gu, Jeonju", 35.8150, 127.1530, "tourist_attraction"),
			entry("Seoul City Hall", "110 Sejong-daero, Jung-gu, Seoul", 37.5665, 126.9780, "city_hall"),
		])
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl PlaceProvider for GazetteerProvider {
	fn geocode(&self, location: Coordinates) -> Result<String, ProviderError> {
		self.entries
			.iter()
			.map(|entry| (haversine_km(entry.location(), location), entry))
			.filter(|(km, _)| *km <= GEOCODE_MATCH_RADIUS_KM)
			.min_by(|left, right| left.0.total_cmp(&right.0))
			.map(|(_, entry)| entry.address.clone())
			.ok_or(ProviderError::NoResults)
	}

	fn text_search(
		&self,
		query: &str,
		near: Coordinates,
		_radius_m: u32,
	) -> Result<Vec<PlaceCandidate>, ProviderError> {
		let needle = query.trim().to_lowercase();
		let mut matches = self
			.entries
			.iter()
			.filter(|entry| entry.matches(&needle))
			.map(|entry| (haversine_km(entry.location(), near), entry))
			.collect::<Vec<_>>();
		matches.sort_by(|left, right| left.0.total_cmp(&right.0));

		Ok(matches
			.into_iter()
			.map(|(_, entry)| PlaceCandidate {
				name: Some(entry.name.clone()),
				formatted_address: Some(entry.address.clone()),
				location: entry.location(),
				rating: entry.rating,
				types: entry.types.clone(),
			})
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::GazetteerProvider;
	use crate::domain::Coordinates;
	use crate::provider::{PlaceProvider, ProviderError};

	#[test]
	fn text_search_is_case_insensitive_and_sorted_by_distance() {
		let provider = GazetteerProvider::builtin();
		let seoul = Coordinates::new(37.5665, 126.9780);
		let names = provider
			.text_search("BEACH", seoul, 50_000)
			.expect("search should work")
			.into_iter()
			.filter_map(|candidate| candidate.name)
			.collect::<Vec<_>>();
		assert_eq!(names, vec!["Anmok Beach", "Gwangalli Beach", "Haeundae Beach"]);
	}

	#[test]
	fn geocode_resolves_nearby_points_only() {
		let provider = GazetteerProvider::builtin();
		let address = provider
			.geocode(Coordinates::new(35.7900, 129.3325))
			.expect("point near Bulguksa");
		assert_eq!(address, "15-1 Jinhyeon-dong, Gyeongju");

		assert!(matches!(
			provider.geocode(Coordinates::new(0.0, 0.0)),
			Err(ProviderError::NoResults)
		));
	}

	#[test]
	fn loads_entries_from_toml() {
		let mut file = tempfile::NamedTempFile::new().expect("temp file");
		writeln!(
			file,
			r#"
[[places]]
name = "Namsan Tower"
address = "105 Namsangongwon-gil, Yongsan-gu, Seoul"
lat = 37.5512
lng = 126.9882
rating = 4.4
"#
		)
		.expect("write gazetteer");

		let provider = GazetteerProvider::load(file.path()).expect("gazetteer should load");
		assert_eq!(provider.len(), 1);
		let results = provider
			.text_search("namsan", Coordinates::new(37.5, 127.0), 1000)
			.expect("search should work");
		assert_eq!(results[0].rating, Some(4.4));
	}
}
