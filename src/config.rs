use std::env;

/// Maximum number of workshops a student may be approved-enrolled in at
/// the same time. Read from the environment at call time so operators
/// can adjust it without a rebuild.
pub fn max_concurrent_enrollments() -> i64 {
    parse_max_concurrent(
        env::var("MAX_CONCURRENT_ENROLLMENTS")
            .ok()
            .or_else(|| env::var("MAX_WORKSHOPS_PER_STUDENT").ok()),
    )
}

fn parse_max_concurrent(raw: Option<String>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::parse_max_concurrent;

    #[test]
    fn defaults_to_one() {
        assert_eq!(parse_max_concurrent(None), 1);
        assert_eq!(parse_max_concurrent(Some("".into())), 1);
        assert_eq!(parse_max_concurrent(Some("abc".into())), 1);
    }

    #[test]
    fn rejects_non_positive_values() {
        assert_eq!(parse_max_concurrent(Some("0".into())), 1);
        assert_eq!(parse_max_concurrent(Some("-3".into())), 1);
    }

    #[test]
    fn accepts_positive_values() {
        assert_eq!(parse_max_concurrent(Some("2".into())), 2);
        assert_eq!(parse_max_concurrent(Some(" 5 ".into())), 5);
    }
}
