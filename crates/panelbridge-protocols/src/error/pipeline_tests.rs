use super::*;

#[test]
fn test_timeout_display() {
    let err = PipelineError::Timeout {
        request_id: RequestId::from("abc"),
        after_ms: 100,
    };
    assert!(err.to_string().contains("abc"));
    assert!(err.to_string().contains("100ms"));
}

#[test]
fn test_retryable_classification() {
    assert!(PipelineError::ExtractionEmpty.is_retryable());
    assert!(PipelineError::TransportExhausted.is_retryable());
    assert!(
        PipelineError::Timeout {
            request_id: RequestId::from("x"),
            after_ms: 1
        }
        .is_retryable()
    );
    assert!(!PipelineError::ExtractionFailed("boom".into()).is_retryable());
    assert!(!PipelineError::BrokerInjectionFailed("denied".into()).is_retryable());
}

#[test]
fn test_injection_failure_suggests_reload() {
    let err = PipelineError::BrokerInjectionFailed("denied".into());
    assert!(err.user_message().contains("reload"));
}

#[test]
fn test_from_extraction_failure() {
    assert_eq!(
        PipelineError::from(ExtractionFailure::empty()),
        PipelineError::ExtractionEmpty
    );
    assert_eq!(
        PipelineError::from(ExtractionFailure::failed("bad")),
        PipelineError::ExtractionFailed("bad".into())
    );
}
