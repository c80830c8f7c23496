#[cfg(test)]
mod tests {
    use super::super::logging::{init_logging, DEFAULT_LOG_FILTER};
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_logging_initialization() {
        // Other tests in this process may have installed a subscriber first,
        // so only the second call's outcome is fixed
        init_logging();
        assert!(!init_logging());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
