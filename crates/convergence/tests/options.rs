use convergence::{ComponentId, ConvergenceOptions, DesignId, InputError, IntrinsicSize, Viewport};
use core::time::Duration;

#[test]
fn defaults_follow_the_documented_values() {
    let options = ConvergenceOptions::default();
    assert_eq!(options.match_threshold, 0.001);
    assert_eq!(options.iteration_cap, 5);
    assert_eq!(options.settle_duration, Duration::from_millis(3000));
    assert_eq!(options.channel_tolerance, 25);
    assert_eq!(options.variant, "default");
    assert_eq!(options.validate(), Ok(()));
}

#[test]
fn lookup_overrides_defaults_and_ignores_blanks() {
    let options = ConvergenceOptions::from_lookup(|name| match name {
        "PARITY_MATCH_THRESHOLD" => Some("0.01".to_owned()),
        "PARITY_SETTLE_MS" => Some("250".to_owned()),
        "PARITY_VARIANT" => Some("  ".to_owned()),
        _ => None,
    })
    .unwrap();

    assert_eq!(options.match_threshold, 0.01);
    assert_eq!(options.settle_duration, Duration::from_millis(250));
    assert_eq!(options.iteration_cap, 5);
    assert_eq!(options.variant, "default");
}

#[test]
fn unparseable_values_name_the_option() {
    let err = ConvergenceOptions::from_lookup(|name| {
        (name == "PARITY_MAX_ITERATIONS").then(|| "lots".to_owned())
    })
    .unwrap_err();

    assert_eq!(
        err,
        InputError::InvalidOption {
            name: "max-iterations".to_owned(),
            value: "lots".to_owned()
        }
    );
}

#[test]
fn set_reports_unknown_names() {
    let mut options = ConvergenceOptions::default();
    assert_eq!(options.set("variant", "mobile"), Ok(true));
    assert_eq!(options.set("colour", "blue"), Ok(false));
    assert_eq!(options.variant, "mobile");
}

#[test]
fn validation_rejects_out_of_range_values() {
    let mut options = ConvergenceOptions::default();
    options.match_threshold = 0.0;
    assert_eq!(options.validate(), Err(InputError::ThresholdOutOfRange(0.0)));

    options.match_threshold = 1.5;
    assert_eq!(options.validate(), Err(InputError::ThresholdOutOfRange(1.5)));

    options.match_threshold = 1.0;
    options.iteration_cap = 0;
    assert_eq!(options.validate(), Err(InputError::ZeroIterationCap));

    options.iteration_cap = 1;
    options.variant.clear();
    assert_eq!(options.validate(), Err(InputError::EmptyVariant));
}

#[test]
fn component_ids_must_be_class_names() {
    assert_eq!(ComponentId::parse(" hero-banner ").unwrap().as_str(), "hero-banner");
    assert!(ComponentId::parse("_private").is_ok());
    assert!(ComponentId::parse("").is_err());
    assert!(ComponentId::parse("2col").is_err());
    assert!(ComponentId::parse("card .evil").is_err());
    assert!(ComponentId::parse("card{").is_err());
}

#[test]
fn design_ids_are_trimmed() {
    assert_eq!(DesignId::parse(" 12:34 ").unwrap().as_str(), "12:34");
    assert_eq!(DesignId::parse("\t"), Err(InputError::EmptyDesignId));
}

#[test]
fn intrinsic_size_rounds_up_and_pads_height() {
    let size = IntrinsicSize {
        width: 1159.2,
        height: 480.0,
    };
    assert_eq!(
        size.to_viewport(),
        Viewport {
            width: 1160,
            height: 580
        }
    );
}
