const MAX_TERM_CHARS: usize = 100;
const MAX_AGE: u32 = 150;
/// Suggestions start at this many characters.
pub const MIN_SUGGESTION_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
	#[error("{field} must be at most {max} characters.")]
	TermTooLong { field: &'static str, max: usize },
	#[error("age_min must not exceed age_max.")]
	InvertedAgeRange,
	#[error("Ages must be at most {}.", MAX_AGE)]
	AgeOutOfRange,
}

/// Normalised profile search filters. Absent filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
	/// Matches first name, last name, or any skill.
	pub text: Option<String>,
	/// Matches any skill.
	pub skill: Option<String>,
	pub age_min: Option<u32>,
	pub age_max: Option<u32>,
	pub gender: Option<String>,
}
impl SearchFilter {
	pub fn new(
		text: Option<&str>,
		skill: Option<&str>,
		age_min: Option<u32>,
		age_max: Option<u32>,
		gender: Option<&str>,
	) -> Result<Self, SearchError> {
		if age_min.is_some_and(|age| age > MAX_AGE) || age_max.is_some_and(|age| age > MAX_AGE) {
			return Err(SearchError::AgeOutOfRange);
		}
		if let (Some(min), Some(max)) = (age_min, age_max)
			&& min > max
		{
			return Err(SearchError::InvertedAgeRange);
		}

		Ok(Self {
			text: term(text, "query")?,
			skill: term(skill, "skill")?,
			age_min,
			age_max,
			gender: term(gender, "gender")?,
		})
	}
}

/// Case-insensitive substring pattern for `ILIKE`, with `%`, `_` and `\` matched literally.
pub fn contains_pattern(term: &str) -> String {
	let mut pattern = String::with_capacity(term.len() + 2);

	pattern.push('%');

	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(ch);
	}

	pattern.push('%');

	pattern
}

/// The trimmed suggestion prefix, or `None` when it is too short to suggest anything.
pub fn suggestion_term(raw: &str) -> Option<&str> {
	let term = raw.trim();

	(term.chars().count() >= MIN_SUGGESTION_CHARS && term.chars().count() <= MAX_TERM_CHARS)
		.then_some(term)
}

fn term(raw: Option<&str>, field: &'static str) -> Result<Option<String>, SearchError> {
	let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
		return Ok(None);
	};

	if value.chars().count() > MAX_TERM_CHARS {
		return Err(SearchError::TermTooLong { field, max: MAX_TERM_CHARS });
	}

	Ok(Some(value.to_string()))
}
