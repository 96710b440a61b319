use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::backend::{BackendError, PlanBackend, PlanLocation, SortBy, TravelPlan};
use crate::domain::Coordinates;
use crate::route::{Route, derive_route};

/// A stored plan's locations for one day, in visiting order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
	pub day: u32,
	pub locations: Vec<PlanLocation>,
}

impl DayGroup {
	pub fn route(&self) -> Route {
		let points = self
			.locations
			.iter()
			.map(|location| Coordinates::new(location.lat, location.lng))
			.collect::<Vec<_>>();
		derive_route(&points)
	}
}

/// Backend plans merged with the featured set. When the backend is
/// unreachable only the featured set is returned.
pub fn list_with_fallback(backend: &dyn PlanBackend, sort: SortBy) -> Vec<TravelPlan> {
	let mut plans = match backend.list_plans(sort) {
		Ok(remote) => remote,
		Err(err) => {
			tracing::warn!(error = %err, "falling back to featured plans");
			Vec::new()
		}
	};
	plans.extend(featured_plans());
	sort_plans(&mut plans, sort);
	plans
}

pub fn plan_with_fallback(backend: &dyn PlanBackend, id: &str) -> Result<TravelPlan, BackendError> {
	match backend.get_plan(id) {
		Ok(plan) => Ok(plan),
		Err(err) => {
			tracing::warn!(error = %err, id, "looking up plan in featured set");
			featured_plans()
				.into_iter()
				.find(|plan| plan.id == id)
				.ok_or_else(|| BackendError::NotFound(id.to_string()))
		}
	}
}

/// `likes` sorts by like count, `popular` by newest first.
pub fn sort_plans(plans: &mut [TravelPlan], sort: SortBy) {
	match sort {
		SortBy::Likes => plans.sort_by(|left, right| right.likes.cmp(&left.likes)),
		SortBy::Popular => plans.sort_by(|left, right| {
			created_at_key(&right.created_at).cmp(&created_at_key(&left.created_at))
		}),
	}
}

/// Splits a plan's locations into equal chunks, one per trip day. Days that
/// end up without locations are left out.
pub fn group_locations_by_day(plan: &TravelPlan) -> Vec<DayGroup> {
	let Some(locations) = plan.locations.as_ref().filter(|locations| !locations.is_empty()) else {
		return Vec::new();
	};
	let duration = plan.duration.max(1) as usize;
	let per_day = locations.len().div_ceil(duration);

	locations
		.chunks(per_day)
		.take(duration)
		.enumerate()
		.map(|(index, chunk)| {
			let mut day_locations = chunk.to_vec();
			day_locations.sort_by_key(|location| location.order);
			DayGroup {
				day: index as u32 + 1,
				locations: day_locations,
			}
		})
		.collect()
}

/// "Haeundae Beach and 2 more" style summary of a plan's places.
pub fn location_summary(plan: &TravelPlan) -> String {
	let Some(locations) = plan.locations.as_ref() else {
		return String::new();
	};
	let first = locations
		.first()
		.and_then(|location| location.name.clone())
		.unwrap_or_default();
	match locations.len() {
		0 => String::new(),
		1 => first,
		count => format!("{first} and {} more", count - 1),
	}
}

fn created_at_key(raw: &str) -> Option<NaiveDateTime> {
	if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
		return Some(timestamp.naive_utc());
	}
	NaiveDate::parse_from_str(raw, "%Y-%m-%d")
		.ok()
		.and_then(|day| day.and_hms_opt(0, 0, 0))
}

pub fn featured_plans() -> Vec<TravelPlan> {
	let location = |id: &str, name: &str, lat: f64, lng: f64, order: u32, address: &str| PlanLocation {
		id: Some(id.to_string()),
		name: Some(name.to_string()),
		lat,
		lng,
		order,
		description: None,
		address: Some(address.to_string()),
	};
	let plan = |id: &str,
				title: &str,
				description: &str,
				dates: (&str, &str, u32),
				participants: u32,
				likes: u32,
				created_at: &str,
				locations: Vec<PlanLocation>| TravelPlan {
		id: id.to_string(),
		title: title.to_string(),
		description: description.to_string(),
		start_date: dates.0.to_string(),
		end_date: dates.1.to_string(),
		duration: dates.2,
		participants,
		likes,
		locations: Some(locations),
		created_at: created_at.to_string(),
		updated_at: created_at.to_string(),
	};

	vec![
		plan(
			"1",
			"Busan food tour",
			"From Haeundae to Gwangalli, hunting for Busan's hidden restaurants",
			("2024-03-15", "2024-03-17", 3),
			2,
			127,
			"2024-01-15",
			vec![
				location("1", "Haeundae Beach", 35.1587, 129.1603, 1, "1394 U-dong, Haeundae-gu, Busan"),
				location("2", "Gwangalli Beach", 35.1532, 129.1186, 2, "219 Gwangan-dong, Suyeong-gu, Busan"),
			],
		),
		plan(
			"2",
			"Jeju healing trip",
			"Seongsan Ilchulbong and Hallasan, four days of Jeju nature",
			("2024-04-01", "2024-04-04", 4),
			4,
			89,
			"2024-01-20",
			vec![
				location("3", "Seongsan Ilchulbong", 33.4584, 126.9427, 1, "1 Seongsan-ri, Seongsan-eup, Seogwipo, Jeju"),
				location("4", "Hallasan", 33.3617, 126.5292, 2, "102 Jejudaehak-ro, Jeju"),
			],
		),
		plan(
			"3",
			"Seoul date course",
			"From Hongdae to the Han river, a romantic Seoul tour",
			("2024-02-14", "2024-02-14", 1),
			2,
			156,
			"2024-01-10",
			vec![
				location("5", "Hongdae Street", 37.5563, 126.9236, 1, "188-5 Yeonnam-dong, Mapo-gu, Seoul"),
				location("6", "Hangang Park", 37.5326, 126.9652, 2, "330 Yeouido-dong, Yeongdeungpo-gu, Seoul"),
			],
		),
		plan(
			"4",
			"Gyeongju history walk",
			"Bulguksa and Seokguram, following the thousand-year capital",
			("2024-05-01", "2024-05-03", 3),
			3,
			73,
			"2024-01-25",
			vec![
				location("7", "Bulguksa", 35.7898, 129.3320, 1, "15-1 Jinhyeon-dong, Gyeongju"),
				location("8", "Seokguram", 35.7948, 129.3469, 2, "891 Jinhyeon-dong, Gyeongju"),
			],
		),
		plan(
			"5",
			"Gangneung sea trip",
			"Sunrise at Jeongdongjin and coffee at Anmok beach",
			("2024-06-15", "2024-06-16", 2),
			5,
			94,
			"2024-02-01",
			vec![
				location("9", "Jeongdongjin", 37.6907, 129.0348, 1, "17 Jeongdongjin-ri, Gangdong-myeon, Gangneung"),
				location("10", "Anmok Beach", 37.7719, 128.9479, 2, "20 Anmokhang-gil, Gangneung"),
			],
		),
		plan(
			"6",
			"Jeonju hanok village",
			"Traditional culture in the hanok village and a bibimbap tour",
			("2024-03-20", "2024-03-21", 2),
			6,
			112,
			"2024-01-30",
			vec![location("11", "Jeonju Hanok Village", 35.8150, 127.1530, 1, "99 Girin-daero, Wansan-gu, Jeonju")],
		),
	]
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::{
		featured_plans, group_locations_by_day, list_with_fallback, location_summary,
		plan_with_fallback, sort_plans,
	};
	use crate::backend::{
		AuthResponse, BackendError, CreateTravelPlanRequest, PlanBackend, PlanLocation, SortBy,
		TravelPlan,
	};

	struct OfflineBackend;

	impl PlanBackend for OfflineBackend {
		fn list_plans(&self, _sort: SortBy) -> Result<Vec<TravelPlan>, BackendError> {
			Err(BackendError::Rejected {
				status: 500,
				message: "Failed to fetch travel plans".to_string(),
			})
		}

		fn get_plan(&self, id: &str) -> Result<TravelPlan, BackendError> {
			Err(BackendError::NotFound(id.to_string()))
		}

		fn create_plan(&self, _request: &CreateTravelPlanRequest) -> Result<TravelPlan, BackendError> {
			unreachable!("not used")
		}

		fn login(&self, _email: &str, _password: &str) -> Result<AuthResponse, BackendError> {
			unreachable!("not used")
		}

		fn register(&self, _email: &str, _password: &str, _name: &str) -> Result<AuthResponse, BackendError> {
			unreachable!("not used")
		}
	}

	struct OnePlanBackend(TravelPlan);

	impl PlanBackend for OnePlanBackend {
		fn list_plans(&self, _sort: SortBy) -> Result<Vec<TravelPlan>, BackendError> {
			Ok(vec![self.0.clone()])
		}

		fn get_plan(&self, _id: &str) -> Result<TravelPlan, BackendError> {
			Ok(self.0.clone())
		}

		fn create_plan(&self, _request: &CreateTravelPlanRequest) -> Result<TravelPlan, BackendError> {
			unreachable!("not used")
		}

		fn login(&self, _email: &str, _password: &str) -> Result<AuthResponse, BackendError> {
			unreachable!("not used")
		}

		fn register(&self, _email: &str, _password: &str, _name: &str) -> Result<AuthResponse, BackendError> {
			unreachable!("not used")
		}
	}

	fn location(order: u32, name: &str) -> PlanLocation {
		PlanLocation {
			id: None,
			name: Some(name.to_string()),
			lat: 35.0 + f64::from(order) * 0.01,
			lng: 129.0,
			order,
			description: None,
			address: None,
		}
	}

	fn remote_plan() -> TravelPlan {
		let mut plan = featured_plans().remove(0);
		plan.id = "remote-1".to_string();
		plan.likes = 500;
		plan.created_at = "2024-03-01T09:30:00Z".to_string();
		plan
	}

	#[test]
	fn backend_failure_lists_featured_plans_only() {
		let plans = list_with_fallback(&OfflineBackend, SortBy::Likes);
		let likes = plans.iter().map(|plan| plan.likes).collect::<Vec<_>>();
		assert_eq!(likes, vec![156, 127, 112, 94, 89, 73]);
	}

	#[test]
	fn remote_plans_are_merged_and_sorted_newest_first() {
		let plans = list_with_fallback(&OnePlanBackend(remote_plan()), SortBy::Popular);
		assert_eq!(plans.len(), 7);
		let ids = plans.iter().map(|plan| plan.id.as_str()).collect::<Vec<_>>();
		assert_eq!(ids, vec!["remote-1", "5", "6", "4", "2", "1", "3"]);
	}

	#[test]
	fn plan_lookup_falls_back_to_featured_set() {
		let plan = plan_with_fallback(&OfflineBackend, "4").expect("featured plan");
		assert_eq!(plan.title, "Gyeongju history walk");
		assert!(matches!(
			plan_with_fallback(&OfflineBackend, "999"),
			Err(BackendError::NotFound(_))
		));
	}

	#[test]
	fn groups_locations_into_even_day_chunks() {
		let mut plan = remote_plan();
		plan.duration = 3;
		plan.locations = Some(vec![
			location(2, "b"),
			location(1, "a"),
			location(3, "c"),
			location(5, "e"),
			location(4, "d"),
		]);

		let groups = group_locations_by_day(&plan);
		let names = groups
			.iter()
			.map(|group| {
				(
					group.day,
					group
						.locations
						.iter()
						.filter_map(|location| location.name.clone())
						.collect::<Vec<_>>(),
				)
			})
			.collect::<Vec<_>>();
		assert_eq!(
			names,
			vec![
				(1, vec!["a".to_string(), "b".to_string()]),
				(2, vec!["c".to_string(), "e".to_string()]),
				(3, vec!["d".to_string()]),
			]
		);
		assert_eq!(groups[0].route().len(), 2);
		assert!(groups[2].route().is_empty());
	}

	#[test]
	fn days_without_locations_are_omitted() {
		let mut plan = remote_plan();
		plan.duration = 4;
		plan.locations = Some(vec![location(1, "a"), location(2, "b")]);
		assert_eq!(group_locations_by_day(&plan).len(), 2);

		plan.locations = None;
		assert!(group_locations_by_day(&plan).is_empty());
	}

	#[test]
	fn sorting_by_likes_is_descending() {
		let mut plans = featured_plans();
		sort_plans(&mut plans, SortBy::Likes);
		assert_eq!(plans[0].title, "Seoul date course");
	}

	#[test]
	fn summarizes_locations() {
		let plans = featured_plans();
		assert_eq!(location_summary(&plans[0]), "Haeundae Beach and 1 more");
		assert_eq!(location_summary(&plans[5]), "Jeonju Hanok Village");
	}
}
