//! Selector cascade resolution.
//!
//! A semantic target ("market container", "outcome price", ...) is located
//! by an ordered list of selector descriptors. Descriptors are tried in
//! order and the first one that matches anything wins; later descriptors
//! are only fallbacks for markup drift and are never evaluated once an
//! earlier one has matched. Results are never merged across descriptors.

use scraper::{ElementRef, Selector};
use std::fmt;
use tracing::debug;

use crate::error::ScrapeError;

/// One strategy for locating a target within a scope
#[derive(Debug, Clone)]
pub struct Descriptor {
    source: String,
    selector: Selector,
}

impl Descriptor {
    /// Compile a CSS selector descriptor
    pub fn parse(source: &str) -> Result<Self, ScrapeError> {
        let selector = Selector::parse(source).map_err(|e| ScrapeError::Selector {
            selector: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// Something a descriptor can be evaluated against
pub trait Scope {
    type Handle;

    fn query(&self, descriptor: &Descriptor) -> Vec<Self::Handle>;
}

impl<'a> Scope for ElementRef<'a> {
    type Handle = ElementRef<'a>;

    fn query(&self, descriptor: &Descriptor) -> Vec<ElementRef<'a>> {
        self.select(descriptor.selector()).collect()
    }
}

/// Evaluate descriptors in order, returning the winning index and its matches.
pub fn resolve_indexed<S: Scope>(scope: &S, descriptors: &[Descriptor]) -> Option<(usize, Vec<S::Handle>)> {
    for (index, descriptor) in descriptors.iter().enumerate() {
        let matches = scope.query(descriptor);
        if !matches.is_empty() {
            debug!(
                "Matched {} element(s) with selector #{}: {}",
                matches.len(),
                index,
                descriptor.source()
            );
            return Some((index, matches));
        }
    }
    None
}

/// Matches of the first descriptor that yields anything; empty if none do.
pub fn resolve<S: Scope>(scope: &S, descriptors: &[Descriptor]) -> Vec<S::Handle> {
    resolve_indexed(scope, descriptors)
        .map(|(_, matches)| matches)
        .unwrap_or_default()
}

/// Whitespace-collapsed text of an element
pub fn text_of(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Attribute value of an element, if present and non-empty
pub fn attribute_of(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Text of the first element matched by the cascade, if non-empty
pub fn resolve_text(scope: &ElementRef<'_>, descriptors: &[Descriptor]) -> Option<String> {
    resolve(scope, descriptors)
        .first()
        .map(text_of)
        .filter(|text| !text.is_empty())
}

/// Like [`resolve_text`], but an exhausted cascade is reported as `NotFound`
pub fn require_text(
    scope: &ElementRef<'_>,
    descriptors: &[Descriptor],
    target: impl fmt::Display,
) -> Result<String, ScrapeError> {
    resolve_text(scope, descriptors).ok_or_else(|| ScrapeError::NotFound {
        target: target.to_string(),
    })
}
