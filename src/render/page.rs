//! Fixed-size pages with running header and footer bands
//!
//! The manager never paginates on its own. Section code asks for
//! [`PageManager::remaining`] and calls [`PageManager::new_page`] itself, so
//! page breaks depend only on fixed section heights and input counts.

use super::surface::{Anchor, DrawOp, Image, Point, Size, Stroke, Surface, TextStyle};
use crate::error::{ReportError, Result};
use crate::layout::LayoutMetrics;
use crate::severity::Rgb;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub const HEADER_FILL: Rgb = Rgb(0, 51, 102);
const FOOTER_COLOR: Rgb = Rgb(90, 90, 90);
const RULE_STROKE: Stroke = Stroke { color: Rgb(200, 200, 200), width: 0.3 };

/// One page: a display list plus its vertical cursor.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    index: usize,
    title: Option<String>,
    cursor: f64,
    footer: Option<usize>,
    ops: Vec<DrawOp>,
}

impl Page {
    /// Zero-based position in the document
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Page number printed in the footer, once stamped
    pub fn footer_number(&self) -> Option<usize> {
        self.footer
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// All text drawn on the page, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for Page {
    fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

pub struct PageManager {
    metrics: LayoutMetrics,
    logo: Option<Arc<Image>>,
    pages: Vec<Page>,
}

impl PageManager {
    pub fn new(metrics: LayoutMetrics, logo: Option<Arc<Image>>) -> Self {
        Self { metrics, logo, pages: Vec::new() }
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a page with its header band drawn and the cursor at the top of
    /// the content region. Returns the new page's index.
    pub fn new_page(&mut self, header_title: Option<&str>) -> usize {
        let index = self.pages.len();
        let mut page = Page {
            index,
            title: header_title.map(str::to_string),
            cursor: self.metrics.content_top(),
            footer: None,
            ops: Vec::new(),
        };
        self.draw_header(&mut page);
        self.pages.push(page);
        debug!(page = index, title = ?header_title, "new page");
        index
    }

    fn draw_header(&self, page: &mut Page) {
        let m = &self.metrics;
        page.fill_rect(Point::new(0.0, 0.0), Size::new(m.page_width, m.header_height), HEADER_FILL);

        let mark_height = m.header_height * 0.6;
        let mark_top = (m.header_height - mark_height) / 2.0;
        match &self.logo {
            Some(logo) => page.image(
                Point::new(m.margin, mark_top),
                Size::new(mark_height * 2.5, mark_height),
                Arc::clone(logo),
            ),
            None => page.text(
                Point::new(m.margin, m.header_height / 2.0 + 2.0),
                &m.brand_name,
                TextStyle::new(m.heading_font_size + 3.0).color(Rgb::WHITE).bold(),
            ),
        }

        if let Some(title) = page.title.clone() {
            page.text(
                Point::new(m.page_width / 2.0, m.header_height / 2.0 + 1.5),
                &title,
                TextStyle::new(m.heading_font_size).color(Rgb::WHITE).anchor(Anchor::Middle).bold(),
            );
        }
    }

    /// Draw the footer band on page `page_index`. A page is stamped at most
    /// once; later calls return `Ok(false)` and draw nothing.
    pub fn stamp_footer(&mut self, page_index: usize, page_number: usize) -> Result<bool> {
        let m = self.metrics.clone();
        let page = self
            .pages
            .get_mut(page_index)
            .ok_or_else(|| ReportError::Layout(format!("no page at index {}", page_index)))?;
        if page.footer.is_some() {
            return Ok(false);
        }

        let rule_y = m.content_bottom();
        page.line(Point::new(m.margin, rule_y), Point::new(m.page_width - m.margin, rule_y), RULE_STROKE);

        let baseline = m.page_height - m.footer_offset;
        let style = TextStyle::new(m.body_font_size - 1.0).color(FOOTER_COLOR);
        page.text(Point::new(m.margin, baseline), &m.footer_link, style.clone());
        page.text(
            Point::new(m.page_width - m.margin, baseline),
            &format!("Page: {}", page_number),
            style.anchor(Anchor::End),
        );
        page.footer = Some(page_number);
        Ok(true)
    }

    pub fn is_stamped(&self, page_index: usize) -> bool {
        self.pages.get(page_index).map_or(false, |p| p.footer.is_some())
    }

    /// The page currently being filled
    pub fn current(&mut self) -> Result<&mut Page> {
        self.pages
            .last_mut()
            .ok_or_else(|| ReportError::Layout("no page has been started".to_string()))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.pages.len().checked_sub(1)
    }

    /// Cursor of the current page, or the content top before any page exists
    pub fn cursor(&self) -> f64 {
        self.pages.last().map_or(self.metrics.content_top(), |p| p.cursor)
    }

    /// Move the current page's cursor down by `dy`. Negative moves are ignored.
    pub fn advance(&mut self, dy: f64) -> Result<f64> {
        let page = self.current()?;
        page.cursor += dy.max(0.0);
        Ok(page.cursor)
    }

    /// Space left between the cursor and the footer band
    pub fn remaining(&self) -> f64 {
        (self.metrics.content_bottom() - self.cursor()).max(0.0)
    }

    /// Stamp every page still missing a footer with its 1-based number and
    /// hand the pages over.
    pub fn finish(mut self) -> Result<Vec<Page>> {
        for index in 0..self.pages.len() {
            if !self.is_stamped(index) {
                self.stamp_footer(index, index + 1)?;
            }
        }
        Ok(self.pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PageManager {
        PageManager::new(LayoutMetrics::default(), None)
    }

    // ==========================================================================
    // HEADER / FOOTER TESTS
    // ==========================================================================

    #[test]
    fn test_new_page_draws_header() {
        let mut pm = manager();
        let idx = pm.new_page(Some("Machine Report"));
        assert_eq!(idx, 0);
        let page = pm.current().unwrap();
        assert!(matches!(page.ops()[0], DrawOp::Rect { fill: Some(HEADER_FILL), .. }));
        let texts: Vec<&str> = page.texts().collect();
        assert_eq!(texts, vec!["AAMS", "Machine Report"]);
        assert_eq!(page.cursor(), 38.0);
    }

    #[test]
    fn test_header_uses_logo_when_present() {
        let logo = Arc::new(Image { mime: "image/png".to_string(), bytes: vec![1, 2, 3] });
        let mut pm = PageManager::new(LayoutMetrics::default(), Some(logo));
        pm.new_page(None);
        let page = pm.current().unwrap();
        assert!(page.ops().iter().any(|op| matches!(op, DrawOp::Image { .. })));
        assert_eq!(page.texts().count(), 0);
    }

    #[test]
    fn test_footer_stamped_once() {
        let mut pm = manager();
        pm.new_page(None);
        assert!(pm.stamp_footer(0, 1).unwrap());
        let before = pm.current().unwrap().ops().len();
        assert!(!pm.stamp_footer(0, 7).unwrap());
        let page = pm.current().unwrap();
        assert_eq!(page.ops().len(), before);
        assert_eq!(page.footer_number(), Some(1));
        assert!(page.texts().any(|t| t == "Page: 1"));
        assert!(page.texts().any(|t| t == "www.aams.io"));
    }

    #[test]
    fn test_footer_text_position() {
        let mut pm = manager();
        pm.new_page(None);
        pm.stamp_footer(0, 3).unwrap();
        let page = pm.current().unwrap();
        let at = page
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { at, text, style } if text == "Page: 3" => Some((*at, style.anchor)),
                _ => None,
            })
            .unwrap();
        assert_eq!(at.0, Point::new(196.0, 289.0));
        assert_eq!(at.1, Anchor::End);
    }

    #[test]
    fn test_stamp_missing_page_is_error() {
        let mut pm = manager();
        assert!(pm.stamp_footer(2, 3).is_err());
    }

    // ==========================================================================
    // CURSOR TESTS
    // ==========================================================================

    #[test]
    fn test_cursor_is_monotonic() {
        let mut pm = manager();
        pm.new_page(None);
        assert_eq!(pm.advance(10.0).unwrap(), 48.0);
        assert_eq!(pm.advance(-5.0).unwrap(), 48.0);
        assert_eq!(pm.remaining(), 283.0 - 48.0);
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut pm = manager();
        pm.new_page(None);
        pm.advance(1000.0).unwrap();
        assert_eq!(pm.remaining(), 0.0);
    }

    #[test]
    fn test_advance_without_page_is_error() {
        let mut pm = manager();
        assert!(pm.advance(1.0).is_err());
        assert!(pm.current().is_err());
    }

    #[test]
    fn test_finish_stamps_unstamped_pages() {
        let mut pm = manager();
        pm.new_page(None);
        pm.new_page(None);
        pm.new_page(None);
        pm.stamp_footer(1, 2).unwrap();
        let pages = pm.finish().unwrap();
        let numbers: Vec<Option<usize>> = pages.iter().map(|p| p.footer_number()).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
        for page in &pages {
            assert_eq!(page.texts().filter(|t| t.starts_with("Page: ")).count(), 1);
        }
    }
}
