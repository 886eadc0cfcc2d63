use style_patch::{Correction, PatchAdvisor, PatchError, PatchTier, root_selector};

fn names(corrections: &[Correction]) -> Vec<&str> {
    corrections
        .iter()
        .map(|correction| correction.property_name.as_str())
        .collect()
}

#[test]
fn tiers_are_disjoint_and_inclusive_at_upper_bounds() {
    assert_eq!(PatchTier::for_ratio(1.0), PatchTier::Structural);
    assert_eq!(PatchTier::for_ratio(0.51), PatchTier::Structural);
    assert_eq!(PatchTier::for_ratio(0.50), PatchTier::SpacingAlignment);
    assert_eq!(PatchTier::for_ratio(0.21), PatchTier::SpacingAlignment);
    assert_eq!(PatchTier::for_ratio(0.20), PatchTier::BoxModel);
    assert_eq!(PatchTier::for_ratio(0.06), PatchTier::BoxModel);
    assert_eq!(PatchTier::for_ratio(0.05), PatchTier::ManualReview);
    assert_eq!(PatchTier::for_ratio(0.0), PatchTier::ManualReview);
}

#[test]
fn large_difference_yields_only_structural_corrections() {
    let corrections = PatchAdvisor.propose(0.6);
    assert_eq!(names(&corrections), ["width", "max-width"]);
    assert_eq!(corrections[0].property_value, "100%");
    assert_eq!(corrections[1].property_value, "1200px");
}

#[test]
fn middle_tiers_yield_their_single_correction() {
    assert_eq!(names(&PatchAdvisor.propose(0.3)), ["margin"]);
    assert_eq!(names(&PatchAdvisor.propose(0.1)), ["box-sizing"]);
}

#[test]
fn small_difference_yields_nothing() {
    assert!(PatchAdvisor.propose(0.03).is_empty());
}

#[test]
fn advisor_does_not_adapt_between_calls() {
    let first = PatchAdvisor.propose(0.7);
    let second = PatchAdvisor.propose(0.7);
    assert_eq!(first, second);
}

#[test]
fn apply_merges_into_root_block_only() {
    let css = ".carousel { color: red; }\n.carousel-slide { width: 50%; }\n";
    let corrections = PatchAdvisor.propose(0.6);

    let patch = PatchAdvisor.apply(&corrections, &root_selector("carousel"), css);

    assert_eq!(patch.applied.len(), 2);
    assert!(patch.skipped.is_empty());
    assert_eq!(
        patch.stylesheet_text,
        ".carousel { color: red; width: 100%; max-width: 1200px; }\n.carousel-slide { width: 50%; }\n"
    );
}

#[test]
fn apply_without_root_block_is_a_no_op() {
    let css = ".other { color: red; }\n";
    let corrections = PatchAdvisor.propose(0.6);

    let patch = PatchAdvisor.apply(&corrections, ".carousel", css);

    assert!(patch.is_empty());
    assert_eq!(patch.skipped.len(), 2);
    assert_eq!(patch.stylesheet_text, css);
}

#[test]
fn patch_reports_why_nothing_was_applied() {
    assert_eq!(
        PatchAdvisor.patch(0.8, ".carousel", ".other {}"),
        Err(PatchError::RootBlockMissing {
            selector: ".carousel".to_owned()
        })
    );
    assert!(matches!(
        PatchAdvisor.patch(0.01, ".carousel", ".carousel {}"),
        Err(PatchError::NoCorrections { .. })
    ));
    let patch = PatchAdvisor.patch(0.3, ".carousel", ".carousel {}").unwrap();
    assert_eq!(patch.stylesheet_text, ".carousel { margin: 0 auto; }");
}
