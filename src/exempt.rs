/// Routes that must never carry a credential and never trigger bootstrap.
///
/// Matching is by substring, so entries can be bare paths while descriptors
/// may carry query strings or versioned prefixes.
#[derive(Clone, Debug)]
pub struct ExemptRoutes {
    patterns: Vec<String>,
}

impl ExemptRoutes {
    pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            patterns: patterns.into_iter().collect(),
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| path.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> ExemptRoutes {
        ExemptRoutes::new(vec![
            "/auth/guest-register".to_string(),
            "/auth/refresh-token".to_string(),
            "/system/date".to_string(),
        ])
    }

    #[test]
    fn matches_exact_path() {
        assert!(routes().is_exempt("/auth/refresh-token"));
    }

    #[test]
    fn matches_with_query_suffix() {
        assert!(routes().is_exempt("/system/date?tz=utc"));
    }

    #[test]
    fn rejects_other_paths() {
        assert!(!routes().is_exempt("/records/list"));
    }
}
