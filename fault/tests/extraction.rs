//! Integration tests for fault-pattern extraction
//!
//! These tests run the extractor against the fault-pattern fixtures.

use cctm_core::{inputs, CaseKind, FaultNodeType};
use cctm_fault::parse_fault_tree;
use pretty_assertions::assert_eq;
use std::fs;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("../fixtures/{}", name)).unwrap()
}

#[test]
fn test_fixture_extraction() {
    let result = parse_fault_tree(&fixture("fault_patterns.xml")).unwrap();

    // 3 range + 4 mapping + 1 safety
    assert_eq!(result.test_cases.len(), 8);
    let ids: Vec<_> = result.test_cases.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids[0], "TC-001");
    assert_eq!(ids[7], "TC-008");

    let tops = result
        .nodes
        .iter()
        .filter(|n| n.kind == FaultNodeType::Top)
        .count();
    assert_eq!(tops, 3);
    assert!(result.nodes.iter().any(|n| n.kind == FaultNodeType::Property));
}

#[test]
fn test_invalid_range_cases() {
    let result = parse_fault_tree(&fixture("fault_patterns.xml")).unwrap();
    let cases = &result.test_cases;

    assert_eq!(cases[0].inputs, inputs! { "GFR" => -25i64 });
    assert_eq!(cases[0].triggers, vec!["GFR", "range-gfr", "range-top"]);
    // the second GFR event gets a fresh id
    assert_eq!(cases[1].inputs, inputs! { "GFR" => 301i64 });
    assert_ne!(cases[1].triggers[0], "GFR");
    assert_eq!(cases[2].inputs, inputs! { "Age" => 121i64 });
    assert_eq!(cases[2].triggers.len(), 2);
}

#[test]
fn test_mapping_binds_to_named_stage() {
    let result = parse_fault_tree(&fixture("fault_patterns.xml")).unwrap();
    let by_desc = |prefix: &str| {
        result
            .test_cases
            .iter()
            .find(|t| t.description.starts_with(prefix))
            .unwrap()
    };

    let risk = by_desc("GFR >= 90");
    assert_eq!(risk.description, "GFR >= 90 -> Incorrect RISK stage");
    assert_eq!(risk.triggers, vec!["be-risk", "stage-risk", "map-top"]);
    assert_eq!(risk.inputs, inputs! { "GFR" => 90i64 });

    let mild = by_desc("GFR = 75");
    assert_eq!(mild.triggers[1], "stage-mild");

    // mapped stage "Failure" has no intermediate event, so the structural parent is used
    let fail = by_desc("GFR < 10");
    assert_eq!(fail.triggers[1], "stage-other");

    let free = by_desc("Lab result missing");
    assert_eq!(free.inputs, inputs! { "Lab result missing" => true });
    assert_eq!(free.triggers[1], "stage-other");
}

#[test]
fn test_safety_property_uses_parent() {
    let result = parse_fault_tree(&fixture("fault_patterns.xml")).unwrap();
    let last = result.test_cases.last().unwrap();
    assert_eq!(last.description, "Report withheld: Lab service timeout");
    assert_eq!(last.triggers, vec!["be-timeout", "safe-int", "safe-top"]);
    assert_eq!(last.to_test_case().kind, CaseKind::Fault);
}

#[test]
fn test_scenarios_follow_tree_paths() {
    let result = parse_fault_tree(&fixture("fault_patterns.xml")).unwrap();
    assert!(result.scenarios.contains(&vec![
        "Unsafe report".to_string(),
        "Report withheld".to_string(),
        "Lab service timeout".to_string(),
    ]));
    // leaf intermediates without events are scenarios too
    assert!(result.scenarios.contains(&vec![
        "Incorrect CKD stage reported".to_string(),
        "Incorrect RISK stage".to_string(),
    ]));
}

#[test]
fn test_bare_fault_tree_root() {
    let xml = r#"<faultTree><topEvent label="Crash"><basicEvent label="Speed &gt; 200"/></topEvent></faultTree>"#;
    let result = parse_fault_tree(xml).unwrap();
    assert_eq!(result.test_cases.len(), 1);
    assert_eq!(result.test_cases[0].inputs, inputs! { "Speed" => 201i64 });
}

#[test]
fn test_duplicate_labels_collapse_nodes_but_not_edges() {
    let xml = r#"
        <patterns>
          <pattern type="safety-property"><topEvent id="t1" label="Same top"><basicEvent id="a" label="x"/></topEvent></pattern>
          <pattern type="safety-property"><topEvent id="t2" label="Same top"><basicEvent id="b" label="y"/></topEvent></pattern>
        </patterns>"#;
    let result = parse_fault_tree(xml).unwrap();
    assert_eq!(result.nodes.iter().filter(|n| n.label == "Same top").count(), 1);
    assert!(result.edges.iter().any(|e| e.from == "t2"));
    assert_eq!(result.test_cases.len(), 2);
}

#[test]
fn test_document_without_fault_tree_is_error() {
    let err = parse_fault_tree("<inventory/>").unwrap_err();
    assert!(err.message.contains("<inventory>"));
}

#[test]
fn test_extraction_serializes_camel_case() {
    let result = parse_fault_tree(&fixture("fault_patterns.xml")).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["testCases"].is_array());
    assert_eq!(json["nodes"][0]["type"], "top");
}
