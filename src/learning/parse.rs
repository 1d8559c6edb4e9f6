//! Oracle response parsing
//!
//! Reasoning oracles return anything from clean JSON to loosely formatted
//! prose. Parsing is an explicit ordered chain of strategies, each a named
//! function returning `Option` — no exception-driven control flow: direct
//! JSON object first, then a fenced code block, then bullet/numbered-line
//! scraping.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// At most this many refinement suggestions are kept, whichever strategy won
pub const MAX_REFINEMENTS: usize = 5;

/// Typed result of a successful parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRefinement {
    pub refinements: Vec<String>,
    pub rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefinementPayload {
    refinements: Vec<String>,
    #[serde(default)]
    rationale: Option<String>,
}

impl From<RefinementPayload> for ParsedRefinement {
    fn from(payload: RefinementPayload) -> Self {
        let mut refinements: Vec<String> = payload
            .refinements
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        refinements.truncate(MAX_REFINEMENTS);
        Self {
            refinements,
            rationale: payload.rationale,
        }
    }
}

/// Run the strategy chain over a raw oracle response
pub fn parse_oracle_response(raw: &str) -> Option<ParsedRefinement> {
    const STRATEGIES: &[fn(&str) -> Option<ParsedRefinement>] =
        &[parse_json_object, parse_fenced_json, parse_bullet_lines];
    STRATEGIES.iter().find_map(|strategy| strategy(raw))
}

/// Strategy 1: the whole response is a JSON object
fn parse_json_object(raw: &str) -> Option<ParsedRefinement> {
    serde_json::from_str::<RefinementPayload>(raw.trim())
        .ok()
        .map(ParsedRefinement::from)
}

/// Strategy 2: a JSON object inside a markdown code fence
fn parse_fenced_json(raw: &str) -> Option<ParsedRefinement> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence regex is valid")
    });

    let captured = fence.captures(raw)?.get(1)?.as_str();
    serde_json::from_str::<RefinementPayload>(captured)
        .ok()
        .map(ParsedRefinement::from)
}

/// Strategy 3: lines starting with a bullet or number marker
fn parse_bullet_lines(raw: &str) -> Option<ParsedRefinement> {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    let bullet = BULLET
        .get_or_init(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$").expect("bullet regex is valid"));

    let refinements: Vec<String> = raw
        .lines()
        .filter_map(|line| bullet.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|r| !r.is_empty())
        .take(MAX_REFINEMENTS)
        .collect();

    if refinements.is_empty() {
        None
    } else {
        Some(ParsedRefinement {
            refinements,
            rationale: None,
        })
    }
}
