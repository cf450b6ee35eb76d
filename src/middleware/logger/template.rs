//! Format string compiler.
//!
//! Splits `"${method} ${path}\n"` into literal runs and tag names once, at
//! middleware construction. Compilation never fails: a start delimiter with
//! no matching end delimiter is kept as literal text.

use std::mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Tag(String),
}

/// A compiled format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub(crate) fn new(source: &str, start: &str, end: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        if !start.is_empty() && !end.is_empty() {
            while let Some(open) = rest.find(start) {
                let after = &rest[open + start.len()..];
                let Some(close) = after.find(end) else { break };

                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    segments.push(Segment::Literal(mem::take(&mut literal)));
                }
                segments.push(Segment::Tag(after[..close].to_owned()));
                rest = &after[close + end.len()..];
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn has_tag(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Tag(tag) if tag == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Vec<Segment> {
        Template::new(source, "${", "}").segments().to_vec()
    }

    fn lit(s: &str) -> Segment { Segment::Literal(s.to_owned()) }
    fn tag(s: &str) -> Segment { Segment::Tag(s.to_owned()) }

    #[test]
    fn literal_only() {
        assert_eq!(compile("plain text, no tags\n"), [lit("plain text, no tags\n")]);
        assert!(compile("").is_empty());
    }

    #[test]
    fn tags_and_literals_keep_their_order() {
        assert_eq!(
            compile("${time} ${method} ${path}\n"),
            [tag("time"), lit(" "), tag("method"), lit(" "), tag("path"), lit("\n")],
        );
    }

    #[test]
    fn adjacent_tags() {
        assert_eq!(compile("${a}${b}"), [tag("a"), tag("b")]);
    }

    #[test]
    fn parameterized_tag_keeps_full_name() {
        assert_eq!(compile("[${header:X-Request-Id}]"), [lit("["), tag("header:X-Request-Id"), lit("]")]);
    }

    #[test]
    fn unterminated_tag_is_literal() {
        assert_eq!(compile("${method} ${path"), [tag("method"), lit(" ${path")]);
        assert_eq!(compile("cost: ${"), [lit("cost: ${")]);
    }

    #[test]
    fn lone_delimiters_are_literal() {
        assert_eq!(compile("a } b $ c {"), [lit("a } b $ c {")]);
    }

    #[test]
    fn empty_tag() {
        assert_eq!(compile("x${}y"), [lit("x"), tag(""), lit("y")]);
    }

    #[test]
    fn has_tag_matches_exact_names() {
        let template = Template::new("${timeout} ${method}", "${", "}");
        assert!(!template.has_tag("time"));
        assert!(template.has_tag("method"));
    }
}
