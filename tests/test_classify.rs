mod common;
use common::*;

use labelscan::classify;
use labelscan::classify::{clean_line, prepare_lines};

#[test]
fn test_empty_input() {
    let fields = classify(&[], &TuningParameters::default());
    assert_eq!(fields, ClassifiedFields::default());
    assert_eq!(fields.roll, "");
    assert_eq!(fields.customer, "");
}

#[test]
fn test_zero_height_lines() {
    let fields = classify(&lines(&[("ROLL 123", 0), ("ACME", 0)]), &TuningParameters::default());
    assert_eq!(fields, ClassifiedFields::default());
}

#[test]
fn test_roll_prefix_and_customer_keyword() {
    let input = lines(&[("ROLL_12345", 100), ("CUSTOMER ACME", 100)]);
    let fields = classify(&input, &TuningParameters::default());
    assert_eq!(fields.roll, "12345");
    assert_eq!(fields.customer, "CUSTOMER_ACME");
}

#[test]
fn test_digit_and_letter_density() {
    let input = lines(&[("AA12", 100), ("98765", 100), ("LONGESTNAME", 100)]);
    let fields = classify(&input, &TuningParameters::default());
    assert_eq!(fields.roll, "98765");
    assert_eq!(fields.customer, "LONGESTNAME");
}

#[test]
fn test_short_line_is_excluded() {
    let input = lines(&[("LOT 4411", 100), ("TINYCUSTOMERPRINT", 30)]);
    let fields = classify(&input, &TuningParameters::default());
    assert_eq!(fields.roll, "4411");
    assert_eq!(fields.customer, "");
}

#[test]
fn test_height_threshold_boundary() {
    // 60% of 100 is exactly 60: kept; 59 is dropped
    let params = TuningParameters::default();
    let kept = prepare_lines(&lines(&[("A1", 100), ("KEEP", 60), ("DROP", 59)]), &params);
    let texts: Vec<&str> = kept.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["A1", "KEEP"]);
}

#[test]
fn test_disabled_height_filter_keeps_everything() {
    let params = TuningParameters {
        use_line_height: false,
        ..TuningParameters::default()
    };
    let input = lines(&[("LOT 4411", 100), ("TINYNAME", 5)]);
    let fields = classify(&input, &params);
    assert_eq!(fields.customer, "TINYNAME");
}

#[test]
fn test_tallest_keyword_line_wins() {
    let params = TuningParameters {
        use_line_height: false,
        ..TuningParameters::default()
    };
    let input = lines(&[
        ("R 555", 80),
        ("CLIENT SMALL", 70),
        ("cust BIGCO", 90),
        ("ANOTHERVERYLONGNAME", 95),
    ]);
    let fields = classify(&input, &params);
    assert_eq!(fields.roll, "555");
    assert_eq!(fields.customer, "cust_BIGCO");
}

#[test]
fn test_identical_lines_are_distinct_positions() {
    let input = lines(&[("ACME 42", 100), ("ACME 42", 100)]);
    let fields = classify(&input, &TuningParameters::default());
    assert_eq!(fields.roll, "42");
    assert_eq!(fields.customer, "ACME_42");
}

#[test]
fn test_no_digits_means_no_roll() {
    let input = lines(&[("CUSTOMER ACME", 100), ("WAREHOUSE", 100)]);
    let fields = classify(&input, &TuningParameters::default());
    assert_eq!(fields.roll, "");
    assert_eq!(fields.customer, "CUSTOMER_ACME");
}

#[test]
fn test_lines_empty_after_cleaning() {
    let input = lines(&[("(void)", 100), ("\"quoted\"", 100), ("@@@", 100)]);
    let fields = classify(&input, &TuningParameters::default());
    assert_eq!(fields, ClassifiedFields::default());
}

#[test]
fn test_cleaning_rules() {
    assert_eq!(clean_line("PO# 12/34-5 (old) [x] 'y' 50%"), "PO_12/34-5____50%");
    assert_eq!(clean_line("  padded  "), "padded");
    assert_eq!(clean_line("  A B  "), "A_B");
}

#[test]
fn test_cleaning_is_deterministic() {
    let params = TuningParameters::default();
    let input = lines(&[("ROLL: 0099-12 \"temp\"", 50), ("Cust (x) Foo/Bar", 48)]);
    let first = classify(&input, &params);
    let second = classify(&input, &params);
    assert_eq!(first, second);
    assert_eq!(first.roll, "0099-12");
}

#[test]
fn test_line_at_exact_threshold_is_customer() {
    let fields = classify(&lines(&[("7", 100), ("ACME", 60)]), &TuningParameters::default());
    assert_eq!(fields.roll, "7");
    assert_eq!(fields.customer, "ACME");
}

#[test]
fn test_threshold_follows_configured_percent() {
    let params = TuningParameters {
        line_height_percent: 0.35,
        ..TuningParameters::default()
    };
    let kept = prepare_lines(&lines(&[("A1", 200), ("AT", 70), ("UNDER", 69)]), &params);
    let texts: Vec<&str> = kept.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["A1", "AT"]);
}
