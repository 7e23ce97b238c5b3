use super::parser::parse_markers;
use super::{bracketed, LineCol, MarkerKind, MarkupPoint};
use crate::assertions::Assertions;
use crate::error::CaseError;
use compact_str::CompactString;
use ropey::Rope;
use std::path::{Path, PathBuf};
use text_size::TextSize;

/// A parse error the host reported at a clean offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorInfo {
    pub offset: TextSize,
    pub description: String,
}

/// A caret marker, positioned in clean coordinates of its file.
#[derive(Debug, Clone, Copy)]
pub struct FoundCaret<'a> {
    pub file: &'a MarkupFile,
    pub offset: TextSize,
    pub name: Option<&'a str>,
}

impl FoundCaret<'_> {
    pub fn line_col(&self) -> LineCol {
        self.file.line_col(self.offset)
    }
}

/// One loaded fixture file: annotated text, clean text and the markers between them.
#[derive(Debug, Clone)]
pub struct MarkupFile {
    name: CompactString,
    path: Option<PathBuf>,
    annotated: String,
    clean: String,
    points: Vec<MarkupPoint>,
    lines: Rope,
}

impl MarkupFile {
    /// Parse a file that has no backing file in the project, e.g. an `after/` fixture.
    pub fn parse(name: impl Into<CompactString>, annotated: impl Into<String>) -> Self {
        Self::build(name.into(), None, annotated.into())
    }

    /// Parse a file whose clean text lives at `path` in the project store.
    pub fn backed(path: impl Into<PathBuf>, annotated: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::build(CompactString::from(name), Some(path), annotated.into())
    }

    fn build(name: CompactString, path: Option<PathBuf>, annotated: String) -> Self {
        let points = parse_markers(&annotated);
        let clean = strip(&annotated, &points);
        let lines = Rope::from_str(&annotated);
        Self {
            name,
            path,
            annotated,
            clean,
            points,
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative path of the backing file, `None` for unbacked files.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn annotated_text(&self) -> &str {
        &self.annotated
    }

    pub fn clean_text(&self) -> &str {
        &self.clean
    }

    pub fn points(&self) -> &[MarkupPoint] {
        &self.points
    }

    /// Translate an annotated offset to the clean text.
    ///
    /// Offsets inside a marker span collapse to the marker's clean position.
    pub fn to_clean_offset(&self, annotated: TextSize) -> TextSize {
        let offset = annotated.min(TextSize::of(self.annotated.as_str()));
        let mut removed = TextSize::from(0);
        for point in &self.points {
            if point.position > offset {
                break;
            }
            if offset < point.end() {
                return point.position - removed;
            }
            removed += point.len;
        }
        offset - removed
    }

    /// Translate a clean offset to the annotated text.
    ///
    /// Markers sitting exactly at `clean` are skipped, so the result points at
    /// the character following them.
    pub fn to_annotated_offset(&self, clean: TextSize) -> TextSize {
        let mut result = clean.min(TextSize::of(self.clean.as_str()));
        for point in &self.points {
            if point.position > result {
                break;
            }
            result += point.len;
        }
        result
    }

    /// 1-based position of a clean offset as seen in the annotated fixture.
    pub fn line_col(&self, clean: TextSize) -> LineCol {
        let byte = usize::from(self.to_annotated_offset(clean)).min(self.lines.len_bytes());
        let line = self.lines.byte_to_line(byte);
        let column = self.lines.byte_to_char(byte) - self.lines.line_to_char(line);
        LineCol::new(line + 1, column + 1)
    }

    /// Clean offsets of every marker of `kind` whose name is exactly `name`.
    pub fn markers_of_kind(&self, kind: MarkerKind, name: Option<&str>) -> Vec<TextSize> {
        self.points
            .iter()
            .filter(|point| point.kind == kind && point.name.as_deref() == name)
            .map(|point| self.to_clean_offset(point.position))
            .collect()
    }

    pub fn carets(&self) -> Vec<FoundCaret<'_>> {
        self.points
            .iter()
            .filter(|point| point.kind == MarkerKind::Caret)
            .map(|point| FoundCaret {
                file: self,
                offset: self.to_clean_offset(point.position),
                name: point.name.as_deref(),
            })
            .collect()
    }

    pub fn wanted_reference_positions(&self, caret_name: Option<&str>) -> Vec<TextSize> {
        self.markers_of_kind(MarkerKind::Ref, caret_name)
    }

    pub fn wanted_usage_positions(&self, caret_name: Option<&str>) -> Vec<TextSize> {
        self.markers_of_kind(MarkerKind::Usage, caret_name)
    }

    /// Parse error markers regardless of their name.
    pub fn parse_error_positions(&self) -> Vec<TextSize> {
        self.points
            .iter()
            .filter(|point| point.kind == MarkerKind::ParseError)
            .map(|point| self.to_clean_offset(point.position))
            .collect()
    }

    pub fn expects_parse_errors(&self) -> bool {
        self.points.iter().any(|p| p.kind == MarkerKind::ParseError)
    }

    /// Require the host's parse errors to start exactly at the `<parse-error>` markers.
    pub fn check_parse_errors(
        &self,
        found: &[ParseErrorInfo],
        assertions: &mut Assertions,
    ) -> Result<(), CaseError> {
        let expected = self.parse_error_positions();

        let unexpected: Vec<String> = found
            .iter()
            .filter(|error| !expected.contains(&error.offset))
            .map(|error| format!("\"{}\" at {}", error.description, self.line_col(error.offset)))
            .collect();
        if !unexpected.is_empty() {
            assertions.fail(format!(
                "file {}: parsing failed unexpectedly with errors {}",
                self.name,
                bracketed(unexpected)
            ))?;
        }

        let not_found: Vec<LineCol> = expected
            .iter()
            .filter(|offset| !found.iter().any(|error| error.offset == **offset))
            .map(|offset| self.line_col(*offset))
            .collect();
        if !not_found.is_empty() {
            assertions.fail(format!(
                "file {}: parsing succeeded unexpectedly at {}",
                self.name,
                bracketed(not_found)
            ))?;
        }

        Ok(())
    }

    /// Re-insert every marker, as originally spelled, into the clean text.
    pub fn annotate(&self) -> String {
        let mut out = String::with_capacity(self.annotated.len());
        let mut cursor = 0;
        for point in &self.points {
            let at = usize::from(self.to_clean_offset(point.position));
            out.push_str(&self.clean[cursor..at]);
            out.push_str(&self.annotated[point.range()]);
            cursor = at;
        }
        out.push_str(&self.clean[cursor..]);
        out
    }
}

fn strip(annotated: &str, points: &[MarkupPoint]) -> String {
    let mut clean = String::with_capacity(annotated.len());
    let mut start = 0;
    for point in points {
        clean.push_str(&annotated[start..usize::from(point.position)]);
        start = usize::from(point.end());
    }
    clean.push_str(&annotated[start..]);
    clean
}
