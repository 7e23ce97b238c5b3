//! Tests for marker parsing and offset translation.

use super::*;
use crate::assertions::Assertions;
use proptest::prelude::*;

fn ts(value: u32) -> TextSize {
    TextSize::from(value)
}

#[test]
fn test_caret_is_stripped_from_clean_text() {
    let file = MarkupFile::parse("a.txt", "val <caret>x = 1");

    assert_eq!(file.clean_text(), "val x = 1");
    let carets = file.carets();
    assert_eq!(carets.len(), 1);
    assert_eq!(carets[0].offset, ts(4));
    assert_eq!(carets[0].name, None);
}

#[test]
fn test_named_references_resolve_to_clean_offsets() {
    let file = MarkupFile::parse("a.txt", "<ref f>foo<ref f>() ");

    assert_eq!(file.clean_text(), "foo() ");
    assert_eq!(file.wanted_reference_positions(Some("f")), vec![ts(0), ts(3)]);
    assert!(file.wanted_reference_positions(None).is_empty());
    assert!(file.wanted_reference_positions(Some("g")).is_empty());
}

#[test]
fn test_all_marker_kinds_are_recognized() {
    let file = MarkupFile::parse("a.txt", "<caret a>1<ref a>2<usage a>3<parse-error>4");

    let kinds: Vec<MarkerKind> = file.points().iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![MarkerKind::Caret, MarkerKind::Ref, MarkerKind::Usage, MarkerKind::ParseError]
    );
    assert_eq!(file.clean_text(), "1234");
    assert_eq!(file.wanted_usage_positions(Some("a")), vec![ts(2)]);
    assert_eq!(file.parse_error_positions(), vec![ts(3)]);
    assert!(file.expects_parse_errors());
}

#[test]
fn test_malformed_markers_are_literal_text() {
    for text in ["<Caret>", "<caret-x>", "<caret a b>", "<caret", "<refx>", "<caret a-b>", "<>"] {
        let file = MarkupFile::parse("a.txt", text);
        assert!(file.points().is_empty(), "{} should not be a marker", text);
        assert_eq!(file.clean_text(), text);
    }
}

#[test]
fn test_empty_name_collapses_to_unnamed() {
    let file = MarkupFile::parse("a.txt", "x<caret >y");

    assert_eq!(file.clean_text(), "xy");
    assert_eq!(file.points()[0].name, None);
    assert_eq!(file.points()[0].len, ts(8));
}

#[test]
fn test_annotate_keeps_original_marker_spelling() {
    let file = MarkupFile::parse("a.txt", "x<caret >y<ref a>z");

    assert_eq!(file.annotate(), "x<caret >y<ref a>z");
}

#[test]
fn test_marker_after_stray_angle_bracket() {
    let file = MarkupFile::parse("a.txt", "a <<caret>b");

    assert_eq!(file.clean_text(), "a <b");
    assert_eq!(file.carets()[0].offset, ts(3));
}

#[test]
fn test_offset_inside_marker_collapses_to_marker_start() {
    let file = MarkupFile::parse("a.txt", "ab<caret>cd");

    assert_eq!(file.to_clean_offset(ts(2)), ts(2));
    assert_eq!(file.to_clean_offset(ts(5)), ts(2));
    assert_eq!(file.to_clean_offset(ts(9)), ts(2));
    assert_eq!(file.to_clean_offset(ts(10)), ts(3));
}

#[test]
fn test_annotated_offset_skips_markers_at_boundary() {
    let file = MarkupFile::parse("a.txt", "ab<caret><ref>cd");

    assert_eq!(file.to_annotated_offset(ts(1)), ts(1));
    assert_eq!(file.to_annotated_offset(ts(2)), ts(14));
    assert_eq!(file.to_annotated_offset(ts(3)), ts(15));
}

#[test]
fn test_line_col_uses_annotated_text() {
    let file = MarkupFile::parse("a.txt", "a\nb<caret>c");

    let caret = file.carets()[0];
    assert_eq!(caret.offset, ts(3));
    assert_eq!(file.line_col(caret.offset), LineCol::new(2, 9));
    assert_eq!(file.line_col(ts(0)), LineCol::new(1, 1));
    assert_eq!(file.line_col(ts(1)), LineCol::new(1, 2));
    assert_eq!(file.line_col(ts(2)), LineCol::new(2, 1));
}

#[test]
fn test_line_col_counts_characters() {
    let file = MarkupFile::parse("a.txt", "é<caret>x");

    assert_eq!(file.carets()[0].offset, ts(2));
    assert_eq!(file.line_col(ts(2)).to_string(), "1:9");
}

#[test]
fn test_line_col_at_end_of_text() {
    let file = MarkupFile::parse("a.txt", "ab\n");
    assert_eq!(file.line_col(ts(3)), LineCol::new(2, 1));
}

#[test]
fn test_backed_file_takes_name_from_path() {
    let file = MarkupFile::backed("src/main.txt", "x<caret>");
    assert_eq!(file.name(), "main.txt");
    assert_eq!(file.path(), Some(std::path::Path::new("src/main.txt")));
    assert!(MarkupFile::parse("a.txt", "").path().is_none());
}

#[test]
fn test_parse_errors_match_markers() {
    let file = MarkupFile::parse("a.txt", "x<parse-error>?y");
    let mut assertions = Assertions::new(true);

    file.check_parse_errors(
        &[ParseErrorInfo {
            offset: ts(1),
            description: "unexpected ?".to_string(),
        }],
        &mut assertions,
    )
    .unwrap();
    assert!(assertions.failures().is_empty());
}

#[test]
fn test_missing_parse_error_is_reported() {
    let file = MarkupFile::parse("a.txt", "x<parse-error>?y");
    let mut assertions = Assertions::new(true);

    file.check_parse_errors(&[], &mut assertions).unwrap();
    assert_eq!(
        assertions.failures()[0].message,
        "file a.txt: parsing succeeded unexpectedly at [1:15]"
    );
}

#[test]
fn test_unexpected_parse_error_is_reported() {
    let file = MarkupFile::parse("a.txt", "xy");
    let mut assertions = Assertions::new(true);

    let found = [ParseErrorInfo {
        offset: ts(0),
        description: "bad".to_string(),
    }];
    file.check_parse_errors(&found, &mut assertions).unwrap();
    assert_eq!(
        assertions.failures()[0].message,
        "file a.txt: parsing failed unexpectedly with errors [\"bad\" at 1:1]"
    );
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    /// Marker-like text the grammar rejects. Always ends in `>` so it never
    /// completes a marker with what follows.
    Malformed(&'static str),
    Marker(MarkerKind, Option<String>),
    /// `<kind >`, the unnamed marker with a trailing space.
    Spaced(MarkerKind),
}

fn segment() -> impl Strategy<Value = Segment> {
    let marker_kind = || prop::sample::select(MarkerKind::ALL.to_vec());
    prop_oneof![
        "[a-z =\\n.>é]{0,8}".prop_map(Segment::Text),
        prop::sample::select(vec!["<Caret>", "<caret-x>", "<caret a b>", "<>", "<<>", "<refx>"])
            .prop_map(Segment::Malformed),
        (marker_kind(), prop::option::of("[A-Za-z_0-9]{1,4}"))
            .prop_map(|(kind, name)| Segment::Marker(kind, name)),
        marker_kind().prop_map(Segment::Spaced),
    ]
}

fn render(segments: &[Segment]) -> (String, String) {
    let mut annotated = String::new();
    let mut clean = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => {
                annotated.push_str(text);
                clean.push_str(text);
            }
            Segment::Malformed(text) => {
                annotated.push_str(text);
                clean.push_str(text);
            }
            Segment::Marker(kind, Some(name)) => annotated.push_str(&format!("<{} {}>", kind, name)),
            Segment::Marker(kind, None) => annotated.push_str(&format!("<{}>", kind)),
            Segment::Spaced(kind) => annotated.push_str(&format!("<{} >", kind)),
        }
    }
    (annotated, clean)
}

proptest! {
    #[test]
    fn prop_strip_then_reinsert_round_trips(segments in prop::collection::vec(segment(), 0..12)) {
        let (annotated, clean) = render(&segments);
        let file = MarkupFile::parse("p.txt", annotated.clone());

        prop_assert_eq!(file.clean_text(), clean.as_str());
        prop_assert_eq!(file.annotate(), annotated);
    }

    #[test]
    fn prop_clean_offsets_survive_a_round_trip(segments in prop::collection::vec(segment(), 0..12)) {
        let (annotated, _) = render(&segments);
        let file = MarkupFile::parse("p.txt", annotated);

        for clean in 0..=file.clean_text().len() {
            let clean = TextSize::try_from(clean).unwrap();
            prop_assert_eq!(file.to_clean_offset(file.to_annotated_offset(clean)), clean);
        }
    }

    #[test]
    fn prop_annotated_offsets_outside_markers_survive_a_round_trip(
        segments in prop::collection::vec(segment(), 0..12)
    ) {
        let (annotated, _) = render(&segments);
        let file = MarkupFile::parse("p.txt", annotated.clone());

        for offset in 0..=annotated.len() {
            let offset = TextSize::try_from(offset).unwrap();
            if file.points().iter().any(|p| p.range().contains(offset)) {
                continue;
            }
            prop_assert_eq!(file.to_annotated_offset(file.to_clean_offset(offset)), offset);
        }
    }
}
