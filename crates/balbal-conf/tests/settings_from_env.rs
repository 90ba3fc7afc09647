//! Loading settings from environment variables

use balbal_conf::{Env, EnvError, Environment, OutputFormat, Settings};
use rstest::rstest;

fn prefixed(vars: &[(&str, &str)]) -> Env {
	Env::from_vars(vars.iter().map(|(k, v)| (format!("BALBAL_{k}"), v.to_string())))
		.with_prefix("BALBAL_")
}

/// Test: An empty environment yields the defaults
#[rstest]
fn test_empty_environment_uses_defaults() {
	// Arrange
	let env = prefixed(&[]);

	// Act
	let settings = Settings::from_env(&env).unwrap();

	// Assert
	assert_eq!(settings, Settings::default());
}

/// Test: Reporting variables map onto the reporting section
#[rstest]
fn test_reporting_section_from_env() {
	let env = prefixed(&[
		("SMTP_HOST", "smtp.example.com"),
		("SMTP_PORT", "2525"),
		("SMTP_USER", "bot@example.com"),
		("SMTP_PASS", "secret"),
		("ERROR_REPORT_RECIPIENT", "oncall@example.com"),
		("ENVIRONMENT", "production"),
	]);

	let settings = Settings::from_env(&env).unwrap();

	let reporting = settings.reporting;
	assert_eq!(reporting.smtp_host, "smtp.example.com");
	assert_eq!(reporting.smtp_port, 2525);
	assert_eq!(reporting.sender(), Some("bot@example.com"));
	assert_eq!(reporting.recipient.as_deref(), Some("oncall@example.com"));
	assert_eq!(reporting.environment, Environment::Production);
}

/// Test: Bundle format and preview toggles are parsed
#[rstest]
fn test_bundle_format_and_tailwind_toggle() {
	let env = prefixed(&[("BUNDLE_FORMAT", "ESM"), ("PREVIEW_TAILWIND", "false")]);

	let settings = Settings::from_env(&env).unwrap();

	assert_eq!(settings.bundler.format, OutputFormat::Esm);
	assert_eq!(settings.preview.tailwind_url, None);
}

/// Test: Report paths accept a comma-separated list
#[rstest]
fn test_report_paths_list() {
	let env = prefixed(&[("REPORT_PATHS", "/errors, /api/errors")]);

	let settings = Settings::from_env(&env).unwrap();

	assert_eq!(settings.server.report_paths, vec!["/errors", "/api/errors"]);
}

/// Test: Generation settings are read and the API key stays out of Debug output
#[rstest]
fn test_generation_section_from_env() {
	let env = prefixed(&[
		("AI_API_KEY", "sk-test"),
		("AI_MODEL", "gpt-4o-mini"),
		("AI_TEMPERATURE", "0.2"),
		("AI_MAX_TOKENS", "1024"),
	]);

	let settings = Settings::from_env(&env).unwrap();

	let generation = settings.generation;
	assert_eq!(generation.api_key.as_deref(), Some("sk-test"));
	assert_eq!(generation.model, "gpt-4o-mini");
	assert_eq!(generation.temperature, 0.2);
	assert_eq!(generation.max_tokens, 1024);
	assert!(!format!("{:?}", generation).contains("sk-test"));
}

/// Test: Invalid values surface as parse errors with the prefixed key
#[rstest]
#[case("SMTP_PORT", "70000", "BALBAL_SMTP_PORT")]
#[case("SMTP_PORT", "abc", "BALBAL_SMTP_PORT")]
#[case("BUNDLE_FORMAT", "cjs", "BALBAL_BUNDLE_FORMAT")]
#[case("ENVIRONMENT", "staging", "BALBAL_ENVIRONMENT")]
#[case("PREVIEW_LOOP_LIMIT", "-1", "BALBAL_PREVIEW_LOOP_LIMIT")]
#[case("AI_TEMPERATURE", "warm", "BALBAL_AI_TEMPERATURE")]
#[case("AI_MAX_TOKENS", "5000000000", "BALBAL_AI_MAX_TOKENS")]
fn test_invalid_values_are_rejected(
	#[case] key: &str,
	#[case] value: &str,
	#[case] expected_key: &str,
) {
	let env = prefixed(&[(key, value)]);

	let err = Settings::from_env(&env).unwrap_err();

	match err {
		EnvError::ParseError { key, .. } => assert_eq!(key, expected_key),
		other => panic!("unexpected error: {other}"),
	}
}
