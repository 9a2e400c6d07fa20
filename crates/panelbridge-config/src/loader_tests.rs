use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_empty_config() {
    let config = ConfigLoader::load_str("").unwrap();
    assert_eq!(config.relay.request_timeout_ms, 5000);
    assert!(config.relay.strict_origin);
}

#[test]
fn test_load_sections() {
    let content = r#"
        [extractor]
        selector_retries = 4
        supported_url_prefix = "https://docs.example.com/"

        [monitor]
        max_reattempts = 5

        [ai]
        provider = "ollama"
        model = "mistral"
    "#;
    let config = ConfigLoader::load_str(content).unwrap();
    assert_eq!(config.extractor.selector_retries, 4);
    assert_eq!(config.extractor.supported_url_prefix, "https://docs.example.com/");
    assert_eq!(config.monitor.max_reattempts, 5);
    assert_eq!(config.ai.provider, "ollama");
    assert_eq!(config.ai.model.as_deref(), Some("mistral"));
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[panel]").unwrap();
    writeln!(file, "content_char_limit = 1500").unwrap();

    let config = ConfigLoader::load(file.path()).unwrap();
    assert_eq!(config.panel.content_char_limit, 1500);
}

#[test]
fn test_load_nonexistent_file() {
    let result = ConfigLoader::load(Path::new("/nonexistent/path/panelbridge.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_load_invalid_toml() {
    let result = ConfigLoader::load_str("invalid = [unclosed");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_load_directory_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::load(dir.path());
    assert!(matches!(result, Err(ConfigError::Read { .. })), "{result:?}");
}

#[test]
fn test_load_or_default_explicit_missing() {
    let result = ConfigLoader::load_or_default(Some(Path::new("/nonexistent/pb.toml")));
    assert!(result.is_err());
}

#[test]
fn test_expand_env_vars() {
    // SAFETY: unique test-only variable
    unsafe {
        std::env::set_var("PANELBRIDGE_TEST_KEY", "sk-test");
    }
    let content = "[ai]\nopenai_api_key = \"${PANELBRIDGE_TEST_KEY}\"";
    let config = ConfigLoader::load_str(content).unwrap();
    assert_eq!(config.ai.openai_api_key.as_deref(), Some("sk-test"));
    unsafe {
        std::env::remove_var("PANELBRIDGE_TEST_KEY");
    }
}

#[test]
fn test_expand_env_vars_not_set() {
    let content = "value = \"${PANELBRIDGE_NONEXISTENT_12345}\"";
    let result = ConfigLoader::expand_env_vars(content);
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn test_expand_env_vars_no_vars() {
    let content = "value = \"no variables here\"";
    let expanded = ConfigLoader::expand_env_vars(content).unwrap();
    assert_eq!(expanded, content);
}

#[test]
fn test_expand_path_with_tilde() {
    let expanded = ConfigLoader::expand_path("~/logs");
    assert!(!expanded.starts_with('~'));
    assert!(expanded.ends_with("/logs"));
}

#[test]
fn test_expand_path_no_tilde() {
    assert_eq!(ConfigLoader::expand_path("/var/log"), "/var/log");
}
