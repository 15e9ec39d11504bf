use std::cmp::Ordering;

/// Cosine similarity of two vectors.
///
/// Returns `None` when the comparison is undefined: either side is empty, the lengths differ,
/// a component is not finite, or either magnitude is zero. Callers drop such pairs from
/// ranking instead of scoring them as the worst match.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f64;
	let mut lhs_norm = 0.0_f64;
	let mut rhs_norm = 0.0_f64;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		if !l.is_finite() || !r.is_finite() {
			return None;
		}

		let (l, r) = (f64::from(*l), f64::from(*r));

		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm == 0.0 || rhs_norm == 0.0 {
		return None;
	}

	let similarity = dot / (lhs_norm.sqrt() * rhs_norm.sqrt());

	if !similarity.is_finite() {
		return None;
	}

	Some(similarity.clamp(-1.0, 1.0) as f32)
}

/// Descending order for scores; NaN sorts last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
