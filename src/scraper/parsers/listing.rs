//! Listing page parser.
//!
//! Finds candidate event or race links on a sport landing page. Grouped
//! containers (competitions, race meetings) are tried first so the group
//! name can travel with each link; when no group resolves, a flat cascade
//! of generic link selectors is used instead.

use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::scraper::cascade::{attribute_of, resolve, resolve_text, text_of};
use crate::scraper::selectors::{Selectors, Target};
use crate::scraper::{meeting_from_url, resolve_href};

/// A sub-page to visit
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRef {
    pub url: String,
    /// Competition or meeting name found on the listing, if any
    pub competition: Option<String>,
    /// Link text
    pub label: Option<String>,
}

impl CandidateRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            competition: None,
            label: None,
        }
    }
}

/// Which targets describe the groups and links of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingTargets {
    pub group: Target,
    pub group_name: Target,
    pub group_link: Target,
    pub fallback_link: Target,
    /// Derive the meeting name from the URL when a link has no group
    pub meeting_from_url: bool,
}

impl ListingTargets {
    pub const EVENTS: ListingTargets = ListingTargets {
        group: Target::ListingGroup,
        group_name: Target::ListingGroupName,
        group_link: Target::ListingGroupLink,
        fallback_link: Target::ListingLink,
        meeting_from_url: false,
    };

    pub const RACES: ListingTargets = ListingTargets {
        group: Target::MeetingGroup,
        group_name: Target::MeetingName,
        group_link: Target::MeetingRaceLink,
        fallback_link: Target::RaceLink,
        meeting_from_url: true,
    };
}

/// Parser for listing pages
pub struct ListingParser;

impl ListingParser {
    /// Extract candidate links in page order, without duplicates.
    pub fn parse(html: &str, selectors: Selectors<'_>, targets: ListingTargets, base_url: &Url) -> Vec<CandidateRef> {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut candidates: Vec<CandidateRef> = Vec::new();

        for group in resolve(&root, selectors.get(targets.group)) {
            let group_name = resolve_text(&group, selectors.get(targets.group_name));

            for link in resolve(&group, selectors.get(targets.group_link)) {
                let Some(url) = attribute_of(&link, "href").and_then(|href| resolve_href(base_url, &href)) else {
                    continue;
                };
                push_unique(
                    &mut candidates,
                    CandidateRef {
                        url,
                        competition: group_name.clone(),
                        label: Some(text_of(&link)).filter(|t| !t.is_empty()),
                    },
                );
            }
        }

        if !candidates.is_empty() {
            info!("Found {} candidate(s) in grouped listing", candidates.len());
            return candidates;
        }

        debug!("No grouped candidates, falling back to flat link selectors");
        for link in resolve(&root, selectors.get(targets.fallback_link)) {
            let Some(url) = attribute_of(&link, "href").and_then(|href| resolve_href(base_url, &href)) else {
                continue;
            };
            let competition = if targets.meeting_from_url {
                meeting_from_url(&url)
            } else {
                None
            };
            push_unique(
                &mut candidates,
                CandidateRef {
                    url,
                    competition,
                    label: Some(text_of(&link)).filter(|t| !t.is_empty()),
                },
            );
        }

        info!("Found {} candidate(s) in flat listing", candidates.len());
        candidates
    }
}

fn push_unique(candidates: &mut Vec<CandidateRef>, candidate: CandidateRef) {
    if !candidates.iter().any(|c| c.url == candidate.url) {
        candidates.push(candidate);
    }
}
