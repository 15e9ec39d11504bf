pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_profiles.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_profiles.sql")),
				"tables/002_connection_requests.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_connection_requests.sql")),
				"tables/003_chat_rooms.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_chat_rooms.sql")),
				"tables/004_referral_requests.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_referral_requests.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
