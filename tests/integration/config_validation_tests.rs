//! Configuration files as an operator would write them

#[cfg(test)]
mod tests {
    use gateway_stream::config::{Config, Validate};
    use gateway_stream::core::streaming::ClientFormat;
    use gateway_stream::GatewayError;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    async fn load(yaml: &str) -> gateway_stream::Result<Config> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        Config::from_file(file.path()).await
    }

    #[tokio::test]
    async fn test_empty_file_gives_defaults() {
        let config = load("{}\n").await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.streaming.client_format, ClientFormat::OpenAi);
        assert_eq!(config.streaming.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.streaming.audit.drain_limit, 9);
        assert!(config.streaming.audit.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_partial_sections_keep_other_defaults() {
        let config = load("streaming:\n  audit:\n    blocked_terms: [\"secret\"]\n").await.unwrap();
        assert_eq!(config.streaming.audit.blocked_terms, vec!["secret"]);
        assert_eq!(config.streaming.audit.sentence_terminators, "。！？；.!?;\n");
        assert!(!config.streaming.simulate_tool_calls);
    }

    #[tokio::test]
    async fn test_out_of_range_drain_limit_rejected() {
        let err = load("streaming:\n  audit:\n    drain_limit: 0\n").await.unwrap_err();
        match err {
            GatewayError::Config(message) => assert!(message.contains("drain_limit")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(load("streaming:\n  audit:\n    drain_limit: 65\n").await.is_err());
    }

    #[tokio::test]
    async fn test_zero_timeout_and_blank_terms_rejected() {
        assert!(load("streaming:\n  connect_timeout_secs: 0\n").await.is_err());
        assert!(load("streaming:\n  audit:\n    blocked_terms: [\"  \"]\n").await.is_err());
        assert!(load("logging:\n  level: \"\"\n").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_client_format_is_a_parse_error() {
        let err = load("streaming:\n  client_format: grpc\n").await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_section_validators_directly() {
        let mut config = Config::default();
        assert!(config.streaming.validate().is_ok());

        config.streaming.client_format = ClientFormat::Native;
        config.streaming.simulate_tool_calls = true;
        let message = config.streaming.validate().unwrap_err();
        assert!(message.contains("simulate_tool_calls"));

        config.streaming.simulate_tool_calls = false;
        config.streaming.audit.sentence_terminators.clear();
        assert!(config.validate().is_err());
    }
}
