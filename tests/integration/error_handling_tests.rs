//! Failures around the open signal and client disconnects

#[cfg(test)]
mod tests {
    use crate::common::CollectingLogger;
    use gateway_stream::config::StreamingConfig;
    use gateway_stream::core::providers::{ProviderError, Vendor};
    use gateway_stream::core::streaming::{PipelineBuilder, VendorEvent, stream_response};
    use gateway_stream::GatewayError;
    use std::time::Duration;

    type Events = futures::stream::Empty<Result<VendorEvent, ProviderError>>;

    #[tokio::test]
    async fn test_connect_failure_fails_open_and_logs_once() {
        let logger = CollectingLogger::new();
        let mut pipeline = PipelineBuilder::new("req-401", Vendor::Anthropic, StreamingConfig::default())
            .logger(logger.clone())
            .build();

        let connect = async { Err::<Events, _>(ProviderError::api_error("anthropic", 401, "invalid x-api-key")) };
        let handler = tokio::spawn(pipeline.handler.run(connect));

        let err = pipeline.open.wait(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.http_status(), 401);
        handler.await.unwrap();

        // only the error delta reached the client
        let frame = pipeline.events.recv().await.unwrap();
        assert!(frame.data.contains("invalid x-api-key"));
        assert!(pipeline.events.recv().await.is_none());

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].first_package_ms.is_none());
        assert_eq!(records[0].error.as_ref().unwrap().error_type, "api_error");
    }

    #[tokio::test]
    async fn test_open_timeout() {
        let pipeline = PipelineBuilder::new("req-slow", Vendor::OpenAi, StreamingConfig::default()).build();
        let connect = futures::future::pending::<Result<Events, ProviderError>>();
        let handler = tokio::spawn(pipeline.handler.run(connect));

        let err = pipeline.open.wait(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));
        handler.abort();
    }

    #[tokio::test]
    async fn test_client_gone_before_open_cancels() {
        let logger = CollectingLogger::new();
        let pipeline = PipelineBuilder::new("req-gone", Vendor::OpenAi, StreamingConfig::default())
            .logger(logger.clone())
            .build();
        drop(pipeline.events);

        let connect = futures::future::pending::<Result<Events, ProviderError>>();
        tokio::time::timeout(Duration::from_secs(5), pipeline.handler.run(connect))
            .await
            .expect("handler should stop when the client disconnects");

        let err = pipeline.open.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Cancelled(_)));
        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error.as_ref().unwrap().error_type, "cancelled");
    }

    #[tokio::test]
    async fn test_client_gone_mid_stream_stops_reading() {
        let logger = CollectingLogger::new();
        let mut pipeline = PipelineBuilder::new("req-mid", Vendor::OpenAi, StreamingConfig::default())
            .logger(logger.clone())
            .build();

        let first = VendorEvent::data(
            r#"{"id":"c","object":"chat.completion.chunk","created":1,"model":"m","choices":[{"index":0,"delta":{"content":"partial"},"finish_reason":null}]}"#,
        );
        // one event, then an upstream that never ends
        let events = futures::StreamExt::chain(
            futures::stream::iter(vec![Ok::<_, ProviderError>(first)]),
            futures::stream::pending(),
        );
        let connect = async move { Ok::<_, ProviderError>(events) };
        let handler = tokio::spawn(pipeline.handler.run(connect));

        pipeline.open.wait(Duration::from_secs(5)).await.unwrap();
        let frame = pipeline.events.recv().await.unwrap();
        assert!(frame.data.contains("partial"));
        drop(pipeline.events);

        tokio::time::timeout(Duration::from_secs(5), handler)
            .await
            .expect("handler should stop when the client disconnects")
            .unwrap();

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].response.first_content(), Some("partial"));
        assert_eq!(records[0].error.as_ref().unwrap().error_type, "cancelled");
    }

    #[tokio::test]
    async fn test_stream_response_maps_pre_open_failure_to_status() {
        let pipeline = PipelineBuilder::new("req-http", Vendor::Bedrock, StreamingConfig::default()).build();
        let connect = async { Err::<Events, _>(ProviderError::rate_limit("bedrock", "throttled")) };

        let err = stream_response(pipeline, connect, Duration::from_secs(5))
            .await
            .unwrap_err();
        let response = actix_web::ResponseError::error_response(&err);
        assert_eq!(response.status().as_u16(), 429);
    }
}
