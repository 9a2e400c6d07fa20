    use super::*;

    #[test]
    fn test_api_request_serialization() {
        let request = ApiRequest {
            model: "gpt-4".to_string(),
            messages: vec![ApiMessage::system("Be brief."), ApiMessage::user("Hello")],
            max_tokens: Some(500),
            temperature: Some(0.5),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_api_request_skip_none_fields() {
        let request = ApiRequest {
            model: "gpt-4".to_string(),
            messages: vec![],
            max_tokens: None,
            temperature: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_api_response_minimal() {
        let json = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi"},"finish_reason":"stop"}]}"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.id.is_none());
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Hi"));
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_api_response_null_content() {
        let json = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":null},"finish_reason":"length"}]}"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[test]
    fn test_error_body() {
        let json = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;
        let body: ApiErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.message, "Invalid API key");
        assert_eq!(body.error.error_type.as_deref(), Some("invalid_request_error"));
    }
