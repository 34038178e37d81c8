/// Describes the strength of a correlation coefficient by its magnitude.
///
/// | |r|         | Label       |
/// |-------------|-------------|
/// | >= 0.80     | very strong |
/// | >= 0.60     | strong      |
/// | >= 0.40     | moderate    |
/// | >= 0.20     | weak        |
/// | < 0.20      | negligible  |
pub fn grade(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.80 => "very strong",
        a if a >= 0.60 => "strong",
        a if a >= 0.40 => "moderate",
        a if a >= 0.20 => "weak",
        _ => "negligible",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade(1.00), "very strong");
        assert_eq!(grade(0.80), "very strong");
        assert_eq!(grade(0.79), "strong");
        assert_eq!(grade(0.60), "strong");
        assert_eq!(grade(0.59), "moderate");
        assert_eq!(grade(0.40), "moderate");
        assert_eq!(grade(0.39), "weak");
        assert_eq!(grade(0.20), "weak");
        assert_eq!(grade(0.19), "negligible");
        assert_eq!(grade(0.00), "negligible");
    }

    #[test]
    fn test_grade_uses_magnitude() {
        assert_eq!(grade(-0.85), "very strong");
        assert_eq!(grade(-0.1), "negligible");
    }
}
