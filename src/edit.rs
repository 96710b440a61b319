use crate::domain::Itinerary;

/// Rename-in-progress state. At most one place is edited at a time; starting
/// a new edit silently replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
	editing: Option<String>,
	draft: String,
}

impl EditSession {
	pub fn begin(&mut self, place_id: impl Into<String>, current_name: &str) {
		self.editing = Some(place_id.into());
		self.draft = current_name.to_string();
	}

	pub fn update_draft(&mut self, text: impl Into<String>) {
		self.draft = text.into();
	}

	/// Applies the draft as the place's new name unless it is blank. The
	/// session ends either way.
	pub fn commit(&mut self, itinerary: &mut Itinerary, day: u32) -> bool {
		let renamed = match self.editing.as_deref() {
			Some(place_id) => itinerary.rename_place(day, place_id, &self.draft),
			None => false,
		};
		self.clear();
		renamed
	}

	pub fn cancel(&mut self) {
		self.clear();
	}

	pub fn editing(&self) -> Option<&str> {
		self.editing.as_deref()
	}

	pub fn is_editing(&self, place_id: &str) -> bool {
		self.editing.as_deref() == Some(place_id)
	}

	pub fn draft(&self) -> &str {
		&self.draft
	}

	fn clear(&mut self) {
		self.editing = None;
		self.draft.clear();
	}
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;
	use pretty_assertions::assert_eq;

	use super::EditSession;
	use crate::domain::{Coordinates, Itinerary, PlaceRecord};

	fn itinerary_with_place() -> (Itinerary, String) {
		let mut itinerary = Itinerary::new();
		itinerary.set_date_range(
			NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
			NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
		);
		let place = PlaceRecord::new("Selected location", "Gyeongju", Coordinates::new(35.79, 129.33));
		let id = place.id().to_string();
		itinerary.add_place(2, place);
		(itinerary, id)
	}

	#[test]
	fn commit_trims_and_renames_then_ends_session() {
		let (mut itinerary, id) = itinerary_with_place();
		let mut session = EditSession::default();
		session.begin(id.clone(), "Selected location");
		assert_eq!(session.draft(), "Selected location");

		session.update_draft("  Bulguksa Temple ");
		assert!(session.commit(&mut itinerary, 2));
		assert_eq!(itinerary.find_place(&id).unwrap().1.name(), "Bulguksa Temple");
		assert_eq!(session, EditSession::default());
	}

	#[test]
	fn blank_commit_is_rejected_but_still_ends_session() {
		let (mut itinerary, id) = itinerary_with_place();
		let mut session = EditSession::default();
		session.begin(id.clone(), "Selected location");
		session.update_draft("   ");

		assert!(!session.commit(&mut itinerary, 2));
		assert_eq!(itinerary.find_place(&id).unwrap().1.name(), "Selected location");
		assert!(session.editing().is_none());
	}

	#[test]
	fn cancel_leaves_place_untouched() {
		let (mut itinerary, id) = itinerary_with_place();
		let mut session = EditSession::default();
		session.begin(id.clone(), "Selected location");
		session.update_draft("Something else");
		session.cancel();

		assert!(!session.commit(&mut itinerary, 2));
		assert_eq!(itinerary.find_place(&id).unwrap().1.name(), "Selected location");
	}

	#[test]
	fn begin_replaces_previous_edit() {
		let mut session = EditSession::default();
		session.begin("first", "First");
		session.update_draft("half typed");
		session.begin("second", "Second");

		assert!(session.is_editing("second"));
		assert!(!session.is_editing("first"));
		assert_eq!(session.draft(), "Second");
	}
}
