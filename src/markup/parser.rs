use super::{MarkerKind, MarkupPoint};
use compact_str::CompactString;
use text_size::TextSize;

/// Scan `annotated` for markers of the form `<kind[ name]>`.
///
/// Anything that does not match the grammar exactly is literal text. A marker
/// written with a space but no name (`<caret >`) is the unnamed slot.
pub fn parse_markers(annotated: &str) -> Vec<MarkupPoint> {
    let bytes = annotated.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] != b'<' {
            index += 1;
            continue;
        }
        match match_marker(annotated, index) {
            Some(point) => {
                index += usize::from(point.len);
                points.push(point);
            }
            None => index += 1,
        }
    }

    points
}

fn match_marker(annotated: &str, start: usize) -> Option<MarkupPoint> {
    let bytes = annotated.as_bytes();
    let rest = &annotated[start + 1..];

    for kind in MarkerKind::ALL {
        let keyword = kind.keyword();
        if !rest.starts_with(keyword) {
            continue;
        }
        let after_keyword = start + 1 + keyword.len();
        let (name, end) = match bytes.get(after_keyword) {
            Some(b'>') => (None, after_keyword + 1),
            Some(b' ') => {
                let name_start = after_keyword + 1;
                let name_len = bytes[name_start..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                    .count();
                let name_end = name_start + name_len;
                if bytes.get(name_end) != Some(&b'>') {
                    return None;
                }
                let name = (name_len > 0).then(|| CompactString::from(&annotated[name_start..name_end]));
                (name, name_end + 1)
            }
            _ => continue,
        };
        return Some(MarkupPoint {
            position: offset(start),
            len: offset(end - start),
            kind,
            name,
        });
    }

    None
}

fn offset(value: usize) -> TextSize {
    TextSize::try_from(value).unwrap_or_else(|_| TextSize::from(u32::MAX))
}
