/// Text fed to the embedding provider for a profile: skills joined by spaces, then the about
/// text. `None` when nothing but whitespace remains.
pub fn embedding_input(skills: &[String], about: &str) -> Option<String> {
	let text = format!("{} {}", skills.join(" "), about);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.to_string())
}

/// Trims each skill and drops the empty ones, keeping the original order.
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
	skills
		.iter()
		.map(|skill| skill.trim())
		.filter(|skill| !skill.is_empty())
		.map(str::to_string)
		.collect()
}
