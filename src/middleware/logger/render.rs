//! Template execution.

use std::io::{self, Write};
use std::time::Duration;

use super::tag::{Exchange, Resolver, Tag};
use super::template::{Segment, Template};

enum Part {
    Literal(Box<[u8]>),
    Tag(Tag),
}

/// A template with every tag bound to its resolver.
pub(crate) struct Renderer {
    parts: Vec<Part>,
    resolver: Resolver,
}

impl Renderer {
    pub(crate) fn new(template: &Template, resolver: Resolver) -> Self {
        let parts = template
            .segments()
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => Part::Literal(text.as_bytes().into()),
                Segment::Tag(name) => Part::Tag(Tag::lookup(name)),
            })
            .collect();
        Self { parts, resolver }
    }

    #[cfg(test)]
    pub(crate) fn has_clock(&self) -> bool {
        self.resolver.has_clock()
    }

    /// Appends one log line for `ex` to `out`.
    ///
    /// `latency` is rendered with `Duration`'s `Debug` form: `870ns`,
    /// `15.2µs`, `3.004ms`, `1.5s`.
    pub(crate) fn render(&self, ex: &Exchange<'_>, latency: Duration, out: &mut Vec<u8>) -> io::Result<()> {
        for part in &self.parts {
            match part {
                Part::Literal(bytes) => out.extend_from_slice(bytes),
                Part::Tag(Tag::Latency) => write!(out, "{latency:?}")?,
                Part::Tag(tag) => self.resolver.resolve(tag, ex, out)?,
            }
        }
        Ok(())
    }
}
