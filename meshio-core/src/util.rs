//! Small pure helpers shared across the codecs

/// Absolute tolerance for floating point comparisons
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Compare two floats within [`DEFAULT_TOLERANCE`]
#[inline]
pub fn is_equal(a: f32, b: f32) -> bool {
    is_equal_with(a, b, DEFAULT_TOLERANCE as f32)
}

#[inline]
pub fn is_equal_with(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

/// Elementwise [`is_equal`] over RGB-style triples
pub fn triple_is_equal(a: &[f32; 3], b: &[f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| is_equal(*x, *y))
}

/// Parse three whitespace separated floats, e.g. the value of an `Ke` line
pub fn parse_f32_triple(value: &str) -> Option<[f32; 3]> {
    let mut parts = value.split_whitespace().map(str::parse::<f32>);
    let triple = [
        parts.next()?.ok()?,
        parts.next()?.ok()?,
        parts.next()?.ok()?,
    ];
    Some(triple)
}
