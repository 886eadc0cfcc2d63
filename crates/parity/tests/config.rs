use convergence::InputError;
use core::time::Duration;
use parity::config::{ReferenceSource, RunConfig};
use std::path::PathBuf;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|arg| (*arg).to_owned()).collect()
}

fn no_env(_name: &str) -> Option<String> {
    None
}

#[test]
fn figma_run_with_defaults() {
    let config = RunConfig::from_sources(
        args(&["--component=hero", "--node-id=12:34", "--file-id=abc"]),
        no_env,
    )
    .unwrap();

    assert_eq!(config.component, "hero");
    assert_eq!(
        config.reference,
        ReferenceSource::Figma {
            file_id: "abc".to_owned(),
            node_id: "12:34".to_owned()
        }
    );
    assert_eq!(config.design_id(), "12:34");
    assert_eq!(config.storybook_url.as_str(), "http://localhost:6006/");
    assert_eq!(config.blocks_dir, PathBuf::from("blocks"));
    assert_eq!(config.output_dir, PathBuf::from(".validation-screenshots"));
    assert_eq!(config.timeout, None);
    assert_eq!(config.figma_token, None);
    assert_eq!(config.options.iteration_cap, 5);
}

#[test]
fn flags_override_environment() {
    let env = |name: &str| match name {
        "FIGMA_FILE_ID" => Some("from-env".to_owned()),
        "FIGMA_ACCESS_TOKEN" => Some("secret".to_owned()),
        "PARITY_MAX_ITERATIONS" => Some("3".to_owned()),
        "PARITY_OUTPUT_DIR" => Some("out".to_owned()),
        _ => None,
    };
    let config = RunConfig::from_sources(
        args(&[
            "--block=hero",
            "--node-id=1:2",
            "--file-id=from-flag",
            "--max-iterations=7",
            "--threshold=0.02",
            "--settle-ms=10",
            "--variant=mobile",
            "--timeout-secs=90",
        ]),
        env,
    )
    .unwrap();

    assert_eq!(
        config.reference,
        ReferenceSource::Figma {
            file_id: "from-flag".to_owned(),
            node_id: "1:2".to_owned()
        }
    );
    assert_eq!(config.figma_token.as_deref(), Some("secret"));
    assert_eq!(config.output_dir, PathBuf::from("out"));
    assert_eq!(config.options.iteration_cap, 7);
    assert_eq!(config.options.match_threshold, 0.02);
    assert_eq!(config.options.settle_duration, Duration::from_millis(10));
    assert_eq!(config.options.variant, "mobile");
    assert_eq!(config.timeout, Some(Duration::from_secs(90)));
}

#[test]
fn personal_token_wins_over_access_token() {
    let env = |name: &str| match name {
        "FIGMA_PERSONAL_ACCESS_TOKEN" => Some("personal".to_owned()),
        "FIGMA_ACCESS_TOKEN" => Some("shared".to_owned()),
        _ => None,
    };
    let config =
        RunConfig::from_sources(args(&["--component=hero", "--reference=ref.png"]), env).unwrap();
    assert_eq!(config.figma_token.as_deref(), Some("personal"));
}

#[test]
fn reference_file_takes_precedence_over_figma() {
    let config = RunConfig::from_sources(
        args(&["--component=hero", "--reference=designs/hero.png", "--node-id=1:2"]),
        no_env,
    )
    .unwrap();

    assert_eq!(
        config.reference,
        ReferenceSource::File(PathBuf::from("designs/hero.png"))
    );
    assert_eq!(config.design_id(), "designs/hero.png");
}

#[test]
fn unknown_flags_are_rejected() {
    let err = RunConfig::from_sources(args(&["--component=hero", "--colour=red"]), no_env)
        .unwrap_err();
    assert_eq!(err, InputError::UnknownOption("--colour=red".to_owned()));

    let err = RunConfig::from_sources(args(&["--component=hero", "--demo"]), no_env).unwrap_err();
    assert_eq!(err, InputError::UnknownOption("--demo".to_owned()));
}

#[test]
fn missing_component_or_design_is_reported() {
    let err = RunConfig::from_sources(args(&["--node-id=1:2", "--file-id=abc"]), no_env)
        .unwrap_err();
    assert_eq!(err, InputError::MissingOption("component".to_owned()));

    let err = RunConfig::from_sources(args(&["--component=hero"]), no_env).unwrap_err();
    assert_eq!(err, InputError::MissingOption("node-id".to_owned()));

    let err =
        RunConfig::from_sources(args(&["--component=hero", "--node-id=1:2"]), no_env).unwrap_err();
    assert_eq!(err, InputError::MissingOption("file-id".to_owned()));
}

#[test]
fn malformed_values_are_rejected() {
    let err = RunConfig::from_sources(
        args(&["--component=hero", "--reference=a.png", "--timeout-secs=soon"]),
        no_env,
    )
    .unwrap_err();
    assert_eq!(
        err,
        InputError::InvalidOption {
            name: "timeout-secs".to_owned(),
            value: "soon".to_owned()
        }
    );

    let err = RunConfig::from_sources(
        args(&["--component=hero", "--reference=a.png", "--storybook-url=not a url"]),
        no_env,
    )
    .unwrap_err();
    assert!(matches!(err, InputError::InvalidOption { .. }));

    let err = RunConfig::from_sources(
        args(&["--component=hero", "--reference=a.png", "--threshold=tiny"]),
        no_env,
    )
    .unwrap_err();
    assert!(matches!(err, InputError::InvalidOption { .. }));
}
