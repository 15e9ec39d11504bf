use std::collections::HashSet;

use uuid::Uuid;

/// User ids that must never appear in a user's feed: the user and every counterpart of any
/// connection record involving them, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
	owner: Uuid,
	ids: HashSet<Uuid>,
}
impl ExclusionSet {
	pub fn new(owner: Uuid) -> Self {
		Self { owner, ids: HashSet::from([owner]) }
	}

	/// Builds the set from `(from_user, to_user)` pairs. Pairs not involving `owner` are
	/// ignored.
	pub fn from_pairs<I>(owner: Uuid, pairs: I) -> Self
	where
		I: IntoIterator<Item = (Uuid, Uuid)>,
	{
		let mut set = Self::new(owner);

		for (from_user, to_user) in pairs {
			set.add_pair(from_user, to_user);
		}

		set
	}

	pub fn add_pair(&mut self, from_user: Uuid, to_user: Uuid) {
		if from_user == self.owner {
			self.ids.insert(to_user);
		} else if to_user == self.owner {
			self.ids.insert(from_user);
		}
	}

	pub fn owner(&self) -> Uuid {
		self.owner
	}

	pub fn contains(&self, user_id: &Uuid) -> bool {
		self.ids.contains(user_id)
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	/// Sorted ids, suitable for binding as a query parameter.
	pub fn to_vec(&self) -> Vec<Uuid> {
		let mut ids: Vec<Uuid> = self.ids.iter().copied().collect();

		ids.sort_unstable();

		ids
	}
}
