    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    async fn server_with_models(names: &[&str]) -> MockServer {
        let server = MockServer::start().await;
        let models: Vec<_> = names
            .iter()
            .map(|n| serde_json::json!({ "name": n, "size": 1024 }))
            .collect();
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "models": models })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_provider_id_and_default_url() {
        let provider = OllamaProvider::default();
        assert_eq!(provider.id(), "ollama");
        assert_eq!(provider.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(OllamaProvider::new("http://host:1/").base_url(), "http://host:1");
    }

    #[test]
    fn test_build_body_maps_limits() {
        let request = GenerateRequest::new("llama2", "p").with_max_tokens(42).with_temperature(0.1);
        let body = OllamaProvider::build_body(&request);
        assert!(!body.stream);
        assert_eq!(body.options.num_predict, 42);
        assert_eq!(body.options.temperature, 0.1);
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = server_with_models(&["llama2:latest", "mistral:7b"]).await;
        let provider = OllamaProvider::new(server.uri());
        let models = provider.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "llama2:latest");
        assert_eq!(models[0].size, Some(1024));
        provider.check_connection().await.unwrap();
    }

    #[tokio::test]
    async fn test_check_connection_unreachable() {
        // Nothing listens on port 9 in the test environment.
        let provider = OllamaProvider::new("http://127.0.0.1:9");
        assert!(matches!(
            provider.check_connection().await,
            Err(AiError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_model_tagged_variant() {
        let server = server_with_models(&["llama2:latest"]).await;
        let provider = OllamaProvider::new(server.uri());
        assert!(provider.validate_model("llama2").await.valid);
        assert!(provider.validate_model("llama2:latest").await.valid);
    }

    #[tokio::test]
    async fn test_validate_model_unknown_lists_available() {
        let server = server_with_models(&["llama2:latest", "mistral:7b"]).await;
        let provider = OllamaProvider::new(server.uri());
        let result = provider.validate_model("gemma").await;
        assert!(!result.valid);
        assert_eq!(
            result.message.as_deref(),
            Some("Model \"gemma\" not found on Ollama server. Available models: llama2:latest, mistral:7b")
        );
    }

    #[tokio::test]
    async fn test_validate_model_prefix_without_colon_rejected() {
        let server = server_with_models(&["llama2-uncensored:latest"]).await;
        let provider = OllamaProvider::new(server.uri());
        assert!(!provider.validate_model("llama2").await.valid);
    }

    #[tokio::test]
    async fn test_validate_model_empty_name() {
        let provider = OllamaProvider::default();
        let result = provider.validate_model("  ").await;
        assert_eq!(
            result.message.as_deref(),
            Some("Model name is empty. Please select a valid model.")
        );
    }

    #[tokio::test]
    async fn test_validate_model_no_models() {
        let server = server_with_models(&[]).await;
        let provider = OllamaProvider::new(server.uri());
        let result = provider.validate_model("llama2").await;
        assert!(result.message.unwrap().starts_with("No models found"));
    }

    #[tokio::test]
    async fn test_validate_model_server_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let provider = OllamaProvider::new(server.uri());
        let result = provider.validate_model("llama2").await;
        assert_eq!(
            result.message.as_deref(),
            Some("Ollama server returned 503: Service Unavailable. Please check that Ollama is running.")
        );
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/generate"))
            .and(matchers::body_partial_json(serde_json::json!({
                "model": "llama2",
                "stream": false,
                "options": { "num_predict": 500 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama2",
                "response": "Consider a shorter title.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri());
        let response = provider
            .generate(GenerateRequest::new("llama2", "Review"))
            .await
            .unwrap();
        assert_eq!(response.text, "Consider a shorter title.");
    }

    #[tokio::test]
    async fn test_generate_empty_response() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "done": true })))
            .mount(&server)
            .await;
        let provider = OllamaProvider::new(server.uri());
        let result = provider.generate(GenerateRequest::new("llama2", "x")).await;
        assert!(matches!(result, Err(AiError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_generate_model_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"model 'x' not found"}"#))
            .mount(&server)
            .await;
        let provider = OllamaProvider::new(server.uri());
        match provider.generate(GenerateRequest::new("x", "y")).await {
            Err(AiError::ApiError { status, message }) => {
                assert_eq!(status, 404);
                assert!(message.contains("not found"));
            }
            other => panic!("Expected ApiError, got {other:?}"),
        }
    }
