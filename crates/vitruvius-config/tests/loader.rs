//! Loader tests against real files and the process environment.

use std::io::Write;

use tempfile::{Builder, NamedTempFile};
use vitruvius_action::{ActionDefinition, ActionResult, DispatchContext};
use vitruvius_config::{ConfigError, ConfigLoader};
use vitruvius_core::View;
use vitruvius_params::{ConverterRegistry, TypeName};

const USERS_TOML: &str = r#"
[dispatch]
max_body_bytes = 2048

[telemetry.logging]
level = "warn"

[[actions]]
id = "users.update"

[actions.params.path]
fields = [{ name = "id", type = "int" }]

[actions.params.json]
required = false
fields = [
    { name = "name", type = "string" },
    { name = "tags", type = "array", items = { name = "tag", type = "string" }, default = [] },
]

[[actions.errors]]
name = "UserNotFound"
code = 404
payload = ["id"]
message = "user {id} not found"
"#;

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file_with_actions() {
    let file = config_file(".toml", USERS_TOML);

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.dispatch.max_body_bytes, 2048);
    assert_eq!(config.dispatch.generic_error_message, "Internal Server Error");
    assert_eq!(config.telemetry.logging.level, "warn");

    let action = config.action("users.update").unwrap();
    let json = action.params.json.as_ref().unwrap();
    assert!(!json.required);
    assert_eq!(json.fields[1].type_name, TypeName::Array);
    assert_eq!(action.errors[0].code, 404);
    assert_eq!(action.errors[0].message.as_deref(), Some("user {id} not found"));
}

#[test]
fn test_declared_action_builds_definition() {
    let file = config_file(".toml", USERS_TOML);
    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    let definition = ActionDefinition::builder("users.update")
        .declare(
            config.action("users.update").unwrap(),
            &ConverterRegistry::default(),
        )
        .body(|_ctx: &mut DispatchContext| -> ActionResult { Ok(Some(View::Empty)) })
        .build()
        .unwrap();

    assert_eq!(definition.errors().len(), 1);
    assert!(definition.errors().get("UserNotFound").is_some());
}

#[test]
fn test_json_file() {
    let file = config_file(
        ".json",
        r#"{"dispatch": {"propagate_request_id": false}, "telemetry": {"metrics": {"enabled": false}}}"#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert!(!config.dispatch.propagate_request_id);
    assert!(!config.telemetry.metrics.enabled);
}

#[test]
fn test_unsupported_extension() {
    let file = config_file(".yaml", "dispatch: {}");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_invalid_action_fails_load() {
    let file = config_file(
        ".toml",
        r#"
[[actions]]
id = "broken"

[[actions.errors]]
name = "Teapot"
code = 99
"#,
    );

    let err = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap_err();

    assert_eq!(err.action(), Some("broken"));
}

#[test]
fn test_later_file_overrides_earlier() {
    let base = config_file(".toml", "[dispatch]\nmax_body_bytes = 100\ngeneric_error_message = \"oops\"\n");
    let overlay = config_file(".json", r#"{"dispatch": {"max_body_bytes": 200}}"#);

    let config = ConfigLoader::new()
        .with_file(base.path())
        .unwrap()
        .with_file(overlay.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.dispatch.max_body_bytes, 200);
    assert_eq!(config.dispatch.generic_error_message, "oops");
}

#[test]
fn test_env_overrides_file() {
    let file = config_file(".toml", "[dispatch]\nmax_body_bytes = 100\n");
    std::env::set_var("VITRUVIUS_ENV_TEST__DISPATCH__MAX_BODY_BYTES", "300");
    std::env::set_var("VITRUVIUS_ENV_TEST__TELEMETRY__LOGGING__JSON_FORMAT", "false");

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("vitruvius_env_test")
        .load()
        .unwrap();

    assert_eq!(config.dispatch.max_body_bytes, 300);
    assert!(!config.telemetry.logging.json_format);
}

#[test]
fn test_dotenv_file_feeds_env_overrides() {
    let dotenv = config_file(
        ".env",
        "VITRUVIUS_DOTENV_TEST__DISPATCH__GENERIC_ERROR_MESSAGE=\"Something went wrong\"\n",
    );

    let config = ConfigLoader::new()
        .with_dotenv_file(dotenv.path())
        .unwrap()
        .with_env_prefix("VITRUVIUS_DOTENV_TEST")
        .load()
        .unwrap();

    assert_eq!(config.dispatch.generic_error_message, "Something went wrong");
}

#[test]
fn test_missing_dotenv_file_is_error() {
    let result = ConfigLoader::new().with_dotenv_file("/nonexistent/.env");
    assert!(matches!(result, Err(ConfigError::Dotenv(_))));
}
