//! Markdown heading extraction on top of `pulldown-cmark`.

use pulldown_cmark::{Event, Parser, Tag};

/// One heading with its raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    /// Source text without `#` markers, so link references keep their brackets.
    pub text: String,
    /// 1-based line of the heading.
    pub line: usize,
}

/// Returns every heading of a Markdown document in order.
pub fn headings(text: &str) -> Vec<Heading> {
    Parser::new(text)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Heading { level, .. }) => Some(Heading {
                level: level as usize,
                text: heading_source_text(&text[range.clone()]),
                line: line_of_offset(text, range.start),
            }),
            _ => None,
        })
        .collect()
}

fn heading_source_text(raw: &str) -> String {
    let first_line = raw.lines().next().unwrap_or_default().trim();
    if !first_line.starts_with('#') {
        // Setext heading; the underline is on the following line.
        return first_line.to_string();
    }
    let without_open = first_line.trim_start_matches('#').trim();
    let without_close = without_open.trim_end_matches('#');
    if without_close.len() != without_open.len() && !without_close.ends_with(' ') {
        // A trailing `#` glued to text is content, not a closing sequence.
        return without_open.to_string();
    }
    without_close.trim().to_string()
}

fn line_of_offset(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::{headings, Heading};

    #[test]
    fn extracts_atx_and_setext_headings() {
        let doc = "Changelog\n=========\n\nintro\n\n## [1.0.0] - 2024-01-02 ##\n\n### C#\n";
        assert_eq!(
            headings(doc),
            vec![
                Heading {
                    level: 1,
                    text: "Changelog".to_string(),
                    line: 1,
                },
                Heading {
                    level: 2,
                    text: "[1.0.0] - 2024-01-02".to_string(),
                    line: 6,
                },
                Heading {
                    level: 3,
                    text: "C#".to_string(),
                    line: 8,
                },
            ]
        );
    }

    #[test]
    fn keeps_brackets_of_link_reference_headings() {
        let doc = "# Changelog\n\n## [0.2.0]\n\n[0.2.0]: https://example.com/v0.2.0\n";
        let found = headings(doc);
        assert_eq!(found[1].text, "[0.2.0]");
    }
}
