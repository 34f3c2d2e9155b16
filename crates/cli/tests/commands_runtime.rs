use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use homefinder_cli::commands::{config, doctor, meta, parse, search, ContextOptions, SearchArgs};
use serde_json::Value;
use tempfile::TempDir;

fn demo_options() -> ContextOptions {
    ContextOptions {
        config_path: None,
        listings_path: Some(
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/listings.json"),
        ),
    }
}

fn missing_dataset_options() -> ContextOptions {
    ContextOptions {
        config_path: None,
        listings_path: Some(PathBuf::from("does/not/exist/listings.json")),
    }
}

#[test]
fn search_json_ranks_spanish_speaking_atlanta_listings() {
    with_env(&[], || {
        let args = SearchArgs {
            max_rent: Some(800),
            min_bedrooms: Some(2),
            city: Some("Atlanta".to_string()),
            language: Some("spanish".to_string()),
            json: true,
            ..SearchArgs::default()
        };

        let result = search::run(&demo_options(), args);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["count"], 3);
        let ids: Vec<u64> = payload["listings"]
            .as_array()
            .expect("listings array")
            .iter()
            .filter_map(|listing| listing["id"].as_u64())
            .collect();
        assert_eq!(ids, vec![1, 10, 15]);
    });
}

#[test]
fn search_text_suggests_broadening_when_nothing_matches() {
    with_env(&[], || {
        let args = SearchArgs { max_rent: Some(100), ..SearchArgs::default() };

        let result = search::run(&demo_options(), args);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("raise your budget above $100"), "{}", result.output);
    });
}

#[test]
fn parse_reports_extracted_filters() {
    with_env(&[], || {
        let result = parse::run(
            &demo_options(),
            "2 bedroom apartment under $800 in Atlanta with Spanish-speaking agent",
        );
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["constrained"], true);
        assert_eq!(payload["filters"]["max_rent"], 800);
        assert_eq!(payload["filters"]["min_bedrooms"], 2);
        assert_eq!(payload["filters"]["city"], "Atlanta");
        assert_eq!(payload["filters"]["language"], "Spanish");
    });
}

#[test]
fn meta_summarizes_demo_dataset() {
    with_env(&[], || {
        let result = meta::run(&demo_options());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["listing_count"], 15);
        assert_eq!(payload["min_rent"], 600);
        assert_eq!(payload["max_rent"], 1250);
        assert!(payload["cities"]
            .as_array()
            .is_some_and(|cities| cities.iter().any(|city| city == "Decatur")));
    });
}

#[test]
fn missing_dataset_returns_dataset_failure() {
    with_env(&[], || {
        let result = meta::run(&missing_dataset_options());
        assert_eq!(result.exit_code, 3, "expected dataset failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "meta");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "dataset_load");
    });
}

#[test]
fn invalid_env_returns_config_failure() {
    with_env(&[("HOMEFINDER_SEARCH_DEFAULT_TOP_N", "0")], || {
        let result = search::run(&demo_options(), SearchArgs::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "search");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_with_demo_dataset_and_no_contact_channels() {
    with_env(&[], || {
        let result = doctor::run(&demo_options(), true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"][1]["name"], "dataset_load");
        assert_eq!(payload["checks"][1]["status"], "pass");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_fails_when_dataset_is_missing() {
    with_env(&[], || {
        let result = doctor::run(&missing_dataset_options(), false);

        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] dataset_load"));
    });
}

#[test]
fn doctor_reports_configured_email_channel() {
    with_env(
        &[
            ("HOMEFINDER_CONTACT_EMAIL_API_KEY", "xkeysib-test-key-9876"),
            ("HOMEFINDER_CONTACT_EMAIL_SENDER", "noreply@homefinder.test"),
        ],
        || {
            let result = doctor::run(&demo_options(), true);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["checks"][2]["status"], "pass");
            assert_eq!(payload["checks"][2]["details"], "enabled: email via brevo");
        },
    );
}

#[test]
fn config_attributes_sources_and_redacts_secrets() {
    with_env(
        &[
            ("HOMEFINDER_SEARCH_DEFAULT_TOP_N", "7"),
            ("HOMEFINDER_CONTACT_EMAIL_API_KEY", "xkeysib-test-key-9876"),
            ("HOMEFINDER_CONTACT_EMAIL_SENDER", "noreply@homefinder.test"),
        ],
        || {
            let output = config::run(&demo_options());

            assert!(output.contains(
                "- search.default_top_n = 7 (source: env (HOMEFINDER_SEARCH_DEFAULT_TOP_N))"
            ));
            assert!(output.contains("(source: cli (--data))"));
            assert!(output.contains("- contact.email_api_key = ***9876"));
            assert!(!output.contains("xkeysib-test-key-9876"));
            assert!(output.contains("- server.port = 8080 (source: default)"));
        },
    );
}

#[test]
fn config_file_values_apply_and_are_attributed_to_the_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("homefinder.toml");
        fs::write(&path, "[search]\ndefault_top_n = 4\n\n[server]\nport = 9090\n")
            .expect("write config");
        let options = ContextOptions { config_path: Some(path.clone()), ..demo_options() };

        let output = config::run(&options);
        let file_source = format!("(source: file ({}))", path.display());
        assert!(
            output.contains(&format!("- search.default_top_n = 4 {file_source}")),
            "{output}"
        );
        assert!(output.contains(&format!("- server.port = 9090 {file_source}")), "{output}");
        assert!(output.contains("- contact.timeout_secs = "), "{output}");

        let result = search::run(&options, SearchArgs { json: true, ..SearchArgs::default() });
        assert_eq!(result.exit_code, 0);
        assert_eq!(parse_payload(&result.output)["count"], 4);
    });
}

#[test]
fn missing_explicit_config_file_is_a_config_failure() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let options = ContextOptions {
            config_path: Some(dir.path().join("absent.toml")),
            ..demo_options()
        };

        let result = meta::run(&options);
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "HOMEFINDER_DATA_LISTINGS_PATH",
        "HOMEFINDER_SEARCH_DEFAULT_TOP_N",
        "HOMEFINDER_SERVER_BIND_ADDRESS",
        "HOMEFINDER_SERVER_PORT",
        "HOMEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "HOMEFINDER_CONTACT_TIMEOUT_SECS",
        "HOMEFINDER_CONTACT_TWILIO_ACCOUNT_SID",
        "HOMEFINDER_CONTACT_TWILIO_AUTH_TOKEN",
        "HOMEFINDER_CONTACT_TWILIO_FROM_NUMBER",
        "HOMEFINDER_CONTACT_EMAIL_API_KEY",
        "HOMEFINDER_CONTACT_EMAIL_SENDER",
        "HOMEFINDER_CONTACT_EMAIL_SENDER_NAME",
        "HOMEFINDER_LOGGING_LEVEL",
        "HOMEFINDER_LOGGING_FORMAT",
        "HOMEFINDER_LOG_LEVEL",
        "HOMEFINDER_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
