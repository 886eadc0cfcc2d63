use style_patch::{PropertyChange, Stylesheet};

#[test]
fn parses_rules_and_declarations_in_order() {
    let sheet = Stylesheet::parse(".a { color: red; margin: 0 auto !important }\n.b { width: 10px }");

    assert_eq!(sheet.rules().len(), 2);
    let rule = sheet.rule(".a").unwrap();
    let names: Vec<&str> = rule.declarations().iter().map(|decl| decl.name.as_str()).collect();
    assert_eq!(names, ["color", "margin"]);
    assert_eq!(rule.property("margin"), Some("0 auto"));
    assert!(rule.declarations()[1].important);
    assert_eq!(sheet.rule(".b").unwrap().property("width"), Some("10px"));
}

#[test]
fn unedited_sheet_round_trips_byte_for_byte() {
    let css = "/* header */\n@media (max-width: 600px) {\n  .x { color: blue; }\n}\n\n.x {\n  color: red;\n}\n";
    assert_eq!(Stylesheet::parse(css).to_css(), css);
}

#[test]
fn appended_property_keeps_existing_declaration_in_place() {
    let mut sheet = Stylesheet::parse(".x { color: red; }");

    let change = sheet.rule_mut(".x").unwrap().set_property("width", "100%");

    assert_eq!(change, PropertyChange::Inserted);
    assert_eq!(sheet.to_css(), ".x { color: red; width: 100%; }");
    let reparsed = Stylesheet::parse(&sheet.to_css());
    let rule = reparsed.rule(".x").unwrap();
    assert_eq!(rule.declarations()[0].name, "color");
    assert_eq!(rule.declarations()[0].value, "red");
    assert_eq!(rule.declarations()[1].name, "width");
}

#[test]
fn replaced_property_keeps_position_and_important_flag() {
    let css = ".x {\n  width: 50% !important;\n  color: red;\n}\n";
    let mut sheet = Stylesheet::parse(css);

    let change = sheet.rule_mut(".x").unwrap().set_property("width", "100%");

    assert_eq!(
        change,
        PropertyChange::Replaced {
            previous: "50%".to_owned()
        }
    );
    assert_eq!(sheet.to_css(), ".x {\n  width: 100% !important;\n  color: red;\n}\n");
}

#[test]
fn multiline_block_gets_indented_insertion() {
    let css = ".carousel {\n    position: relative;\n}\n\n.carousel-item {\n    flex: 0 0 100%;\n}\n";
    let mut sheet = Stylesheet::parse(css);

    sheet.rule_mut(".carousel").unwrap().set_property("margin", "0 auto");

    assert_eq!(
        sheet.to_css(),
        ".carousel {\n    position: relative;\n    margin: 0 auto;\n}\n\n.carousel-item {\n    flex: 0 0 100%;\n}\n"
    );
}

#[test]
fn missing_trailing_semicolon_is_repaired_before_appending() {
    let mut sheet = Stylesheet::parse(".x { color: red }");
    sheet.rule_mut(".x").unwrap().set_property("box-sizing", "border-box");
    assert_eq!(sheet.to_css(), ".x { color: red; box-sizing: border-box; }");
}

#[test]
fn empty_block_accepts_declarations() {
    let mut sheet = Stylesheet::parse(".x {}");
    sheet.rule_mut(".x").unwrap().set_property("width", "100%");
    assert_eq!(sheet.to_css(), ".x { width: 100%; }");
}

#[test]
fn selector_match_is_exact_not_suffix() {
    let sheet = Stylesheet::parse(".wrapper .x { color: red; }\n.x.block { color: blue; }");
    assert!(sheet.rule(".x").is_none());
    assert!(sheet.rule(".wrapper   .x").is_some());
}

#[test]
fn only_the_first_matching_block_is_edited() {
    let mut sheet = Stylesheet::parse(".x { color: red; }\n.x { color: blue; }");
    sheet.rule_mut(".x").unwrap().set_property("color", "green");
    assert_eq!(sheet.to_css(), ".x { color: green; }\n.x { color: blue; }");
}

#[test]
fn important_flag_is_case_insensitive_and_may_be_spaced() {
    let mut sheet = Stylesheet::parse(".x { width: 50% !IMPORTANT; margin: 0 ! Important; }");
    let rule = sheet.rule_mut(".x").unwrap();
    assert_eq!(rule.property("width"), Some("50%"));
    assert_eq!(rule.property("margin"), Some("0"));
    assert!(rule.declarations().iter().all(|decl| decl.important));

    rule.set_property("width", "100%");
    rule.set_property("margin", "0 auto");

    assert_eq!(
        sheet.to_css(),
        ".x { width: 100% !IMPORTANT; margin: 0 auto ! Important; }"
    );
}

#[test]
fn trailing_comment_does_not_get_a_separator() {
    let mut sheet = Stylesheet::parse(".x { color: red; /* note */ }");
    sheet.rule_mut(".x").unwrap().set_property("width", "100%");
    assert_eq!(sheet.to_css(), ".x { color: red; /* note */ width: 100%; }");
}

#[test]
fn unterminated_declaration_before_comment_is_repaired() {
    let mut sheet = Stylesheet::parse(".x { color: red /* note */ }");
    sheet.rule_mut(".x").unwrap().set_property("width", "100%");
    assert_eq!(sheet.to_css(), ".x { color: red /* note */; width: 100%; }");
}

#[test]
fn crlf_blocks_keep_their_line_endings() {
    let mut sheet = Stylesheet::parse(".x {\r\n  color: red;\r\n}\r\n");
    sheet.rule_mut(".x").unwrap().set_property("width", "100%");
    assert_eq!(sheet.to_css(), ".x {\r\n  color: red;\r\n  width: 100%;\r\n}\r\n");
}
