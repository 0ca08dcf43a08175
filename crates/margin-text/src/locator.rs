//! Excerpt page locator
//!
//! Scores an excerpt against every page of a [`DocumentIndex`] by counting
//! how many of the excerpt's match tokens occur (as substrings) in each
//! page's normalized text.
//!
//! # Selection rule
//!
//! Pages are visited in index order and the running best is replaced only
//! on a strictly greater score. The best starts at zero, so a page that
//! matches nothing is never chosen and ties keep the earlier page.

use crate::document::DocumentIndex;
use crate::normalize::{normalize, sanitize_anchor, tokenize};
use serde::{Deserialize, Serialize};

/// How excerpt text is prepared before tokenizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    /// Plain [`normalize`]
    #[default]
    Plain,
    /// [`sanitize_anchor`], which drops running headers and footers first
    Sanitized,
}

/// A page together with its match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageScore {
    /// 1-based page number
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    /// Number of excerpt tokens found on the page
    pub score: usize,
}

/// Page locator
///
/// Stateless apart from its [`AnchorMode`]; safe to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageLocator {
    mode: AnchorMode,
}

impl PageLocator {
    /// Locator using plain normalization
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locator with explicit anchor mode
    #[inline]
    #[must_use]
    pub fn with_mode(mode: AnchorMode) -> Self {
        Self { mode }
    }

    /// Anchor mode in use
    #[inline]
    #[must_use]
    pub fn mode(&self) -> AnchorMode {
        self.mode
    }

    /// Best-matching page for `excerpt`, or `None`
    ///
    /// `None` when the index is empty, the excerpt is empty, the excerpt
    /// yields no tokens, or no page scores above zero.
    #[must_use]
    pub fn locate(&self, excerpt: &str, index: &DocumentIndex) -> Option<u32> {
        let prepared = self.prepare(excerpt);
        let tokens = tokenize(&prepared);
        if index.is_empty() || tokens.is_empty() {
            return None;
        }

        let mut best_score = 0usize;
        let mut best_page = None;
        for page in index.pages() {
            let score = score_page(&tokens, &normalize(&page.raw_text));
            if score > best_score {
                best_score = score;
                best_page = Some(page.page_number);
            }
        }

        tracing::trace!(
            tokens = tokens.len(),
            score = best_score,
            page = ?best_page,
            "located excerpt"
        );
        best_page
    }

    /// Every page scoring above zero, best first
    ///
    /// Ordered by score descending, then by index order, so the head of the
    /// list always agrees with [`PageLocator::locate`].
    #[must_use]
    pub fn rank(&self, excerpt: &str, index: &DocumentIndex) -> Vec<PageScore> {
        let prepared = self.prepare(excerpt);
        let tokens = tokenize(&prepared);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<PageScore> = index
            .pages()
            .iter()
            .map(|page| PageScore {
                page_number: page.page_number,
                score: score_page(&tokens, &normalize(&page.raw_text)),
            })
            .filter(|scored| scored.score > 0)
            .collect();
        // stable sort keeps index order among equal scores
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    fn prepare(&self, excerpt: &str) -> String {
        match self.mode {
            AnchorMode::Plain => normalize(excerpt),
            AnchorMode::Sanitized => sanitize_anchor(excerpt),
        }
    }
}

/// Locate `excerpt` with plain normalization
#[inline]
#[must_use]
pub fn locate(excerpt: &str, index: &DocumentIndex) -> Option<u32> {
    PageLocator::new().locate(excerpt, index)
}

fn score_page(tokens: &[&str], page_text: &str) -> usize {
    tokens.iter().filter(|token| page_text.contains(*token)).count()
}
