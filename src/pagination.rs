//! Pagination – splits the flow-box column into pages.
//!
//! Handles:
//! - Page boundaries for the configured page size
//! - Page-break-before hints (chapter headings)
//! - Table row and code line splitting across pages
//! - Keep-together groups, moved whole to the next page when they fit and
//!   flowed member-by-member (never truncated) when they exceed a full page
//! - Footer chrome on every page after the first

use crate::fonts::FontLibrary;
use crate::layout::FlowBox;
use crate::layout_config::{LayoutBox, LayoutConfig, PageLayout, RuleStyle, TextContent, TextLine, TextRun};
use crate::style::StyleSheet;

/// Default page margins in points (2 cm).
pub const PAGE_MARGIN_PT: f32 = 56.7;

/// Convert flow boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[FlowBox],
    page_width: f32,
    page_height: f32,
    page_margin: f32,
    title: &str,
    styles: &StyleSheet,
    fonts: &FontLibrary,
) -> LayoutConfig {
    let mut pager = Paginator {
        config: LayoutConfig {
            title: title.to_string(),
            page_width_pt: page_width,
            page_height_pt: page_height,
            pages: Vec::new(),
        },
        current: PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        },
        // Document-space y at which the current page begins. All FlowBox
        // doc_y values are absolute document coordinates, so
        // `doc_y - page_start` gives the y-on-page for any box.
        page_start: 0.0,
        content_height: page_height - 2.0 * page_margin,
        margin: page_margin,
    };

    for fbox in boxes {
        pager.place(fbox);
    }

    let mut config = pager.finish();
    add_page_chrome(&mut config, page_margin, styles, fonts);
    config
}

struct Paginator {
    config: LayoutConfig,
    current: PageLayout,
    page_start: f32,
    content_height: f32,
    margin: f32,
}

impl Paginator {
    fn flush_page(&mut self) {
        let next_index = self.config.pages.len() + 1;
        self.config.pages.push(std::mem::replace(
            &mut self.current,
            PageLayout {
                page_index: next_index,
                boxes: Vec::new(),
            },
        ));
    }

    fn place(&mut self, fbox: &FlowBox) {
        if fbox.break_before && !self.current.boxes.is_empty() {
            self.flush_page();
            self.page_start = fbox.doc_y;
        }

        let bottom = fbox.doc_y - self.page_start + fbox.height;
        if bottom > self.content_height && !self.current.boxes.is_empty() {
            if fbox.splittable {
                self.split_rows(fbox);
                return;
            }
            self.flush_page();
            self.page_start = fbox.doc_y;
        }

        // Even alone on a fresh page the box may not fit.
        if !fbox.children.is_empty() && fbox.height > self.content_height {
            if fbox.splittable {
                self.split_rows(fbox);
                return;
            }
            log::warn!("Keep-together group exceeds one page; flowing members separately");
            for child in &fbox.children {
                self.place(child);
            }
            return;
        }

        self.emit(fbox);
    }

    /// A splittable container breaks at child boundaries: each row flows as
    /// its own box against the page limit.
    fn split_rows(&mut self, table: &FlowBox) {
        for row in &table.children {
            let bottom = row.doc_y - self.page_start + row.height;
            if bottom > self.content_height && !self.current.boxes.is_empty() {
                self.flush_page();
                self.page_start = row.doc_y;
            }
            self.emit(row);
        }
    }

    /// Copy a flow subtree onto the current page, rebasing document y to
    /// page-absolute coordinates.
    fn emit(&mut self, fbox: &FlowBox) {
        if let Some(content) = &fbox.content {
            let mut lb = content.clone();
            shift_box(&mut lb, self.margin - self.page_start);
            self.current.boxes.push(lb);
        }
        for child in &fbox.children {
            self.emit(child);
        }
    }

    fn finish(mut self) -> LayoutConfig {
        if !self.current.boxes.is_empty() {
            let page = std::mem::replace(
                &mut self.current,
                PageLayout {
                    page_index: 0,
                    boxes: Vec::new(),
                },
            );
            self.config.pages.push(page);
        }
        if self.config.pages.is_empty() {
            self.config.pages.push(PageLayout {
                page_index: 0,
                boxes: Vec::new(),
            });
        }
        self.config
    }
}

fn shift_box(lb: &mut LayoutBox, dy: f32) {
    lb.y += dy;
    for child in &mut lb.children {
        shift_box(child, dy);
    }
}

/// Footer decoration on every page but the first: a hairline rule and a
/// centered "title - Page N" line inside the bottom margin band.
fn add_page_chrome(
    config: &mut LayoutConfig,
    page_margin: f32,
    styles: &StyleSheet,
    fonts: &FontLibrary,
) {
    let style = &styles.footer;
    let content_width = config.page_width_pt - 2.0 * page_margin;
    let footer_y = config.page_height_pt - page_margin + 12.0;
    let title = config.title.clone();

    for page in config.pages.iter_mut().skip(1) {
        let mut rule = LayoutBox::new(page_margin, footer_y - 4.0, content_width, 0.5);
        rule.rule = Some(RuleStyle {
            thickness: 0.5,
            color: styles.rule_color.as_array(),
        });
        page.boxes.push(rule);

        let text = format!("{title} - Page {}", page.page_index + 1);
        let width = fonts.measure_width(&text, style.face, style.size);
        let mut footer = LayoutBox::new(page_margin, footer_y, content_width, style.leading);
        footer.text = Some(TextContent {
            lines: vec![TextLine {
                runs: vec![TextRun {
                    text,
                    face: style.face,
                    size: style.size,
                    color: style.color.as_array(),
                    underline: false,
                    width,
                }],
                x_offset: ((content_width - width) / 2.0).max(0.0),
                y_offset: 0.0,
            }],
            leading: style.leading,
            align: "center".to_string(),
            marker: None,
        });
        page.boxes.push(footer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::parse_markdown;
    use crate::diagrams::DiagramCatalog;
    use crate::layout::layout_elements;
    use crate::style::ColorScheme;

    fn paginate_markdown(src: &str) -> LayoutConfig {
        let doc = parse_markdown(src, &DiagramCatalog::empty());
        let styles = StyleSheet::new(ColorScheme::Color);
        let fonts = FontLibrary::new();
        let boxes = layout_elements(
            &doc,
            PAGE_MARGIN_PT,
            595.28 - 2.0 * PAGE_MARGIN_PT,
            &styles,
            &fonts,
        );
        paginate(
            &boxes,
            595.28,
            841.89,
            PAGE_MARGIN_PT,
            "test doc",
            &styles,
            &fonts,
        )
    }

    fn page_text(page: &PageLayout) -> String {
        let mut out = String::new();
        for b in &page.boxes {
            collect_text(b, &mut out);
        }
        out
    }

    fn collect_text(lb: &LayoutBox, out: &mut String) {
        if let Some(t) = &lb.text {
            for line in &t.lines {
                for run in &line.runs {
                    out.push_str(&run.text);
                    out.push(' ');
                }
            }
        }
        for child in &lb.children {
            collect_text(child, out);
        }
    }

    #[test]
    fn single_page() {
        let config = paginate_markdown("Short text\n");
        assert_eq!(config.pages.len(), 1);
    }

    #[test]
    fn multiple_pages() {
        let mut src = String::new();
        for i in 0..120 {
            src.push_str(&format!("Paragraph number {i} with a bit of text.\n\n"));
        }
        let config = paginate_markdown(&src);
        assert!(
            config.pages.len() > 1,
            "Expected multiple pages, got {}",
            config.pages.len()
        );
    }

    #[test]
    fn chapter_heading_starts_new_page() {
        let config = paginate_markdown("# One\n\nalpha\n\n# Two\n\nbeta\n");
        assert_eq!(config.pages.len(), 2);
        assert!(page_text(&config.pages[0]).contains("One"));
        assert!(page_text(&config.pages[1]).contains("Two"));
    }

    #[test]
    fn boxes_stay_within_page_bounds() {
        let mut src = String::new();
        for i in 0..150 {
            src.push_str(&format!("Row of body copy {i} that wraps a little bit more.\n\n"));
        }
        let config = paginate_markdown(&src);
        for page in &config.pages {
            for b in &page.boxes {
                assert!(b.y >= PAGE_MARGIN_PT - 0.01, "box above margin: y={}", b.y);
                assert!(
                    b.y + b.height <= config.page_height_pt + 0.01,
                    "box beyond page: y={} h={}",
                    b.y,
                    b.height
                );
            }
        }
    }

    #[test]
    fn footer_on_later_pages_only() {
        let config = paginate_markdown("# One\n\nalpha\n\n# Two\n\nbeta\n");
        assert!(!page_text(&config.pages[0]).contains("Page"));
        let second = page_text(&config.pages[1]);
        assert!(second.contains("test doc - Page 2"), "got: {second}");
    }

    #[test]
    fn keep_together_group_moves_whole() {
        // Fill pages so the grouped section cannot fit in the remainder of
        // the last one; it must move to a fresh page in one piece.
        let mut src = String::new();
        for i in 0..80 {
            src.push_str(&format!("Filler paragraph {i}.\n\n"));
        }
        src.push_str("### 9.1 Grouped Entity\n");
        for _ in 0..6 {
            src.push_str("Member line of the grouped section.\n");
        }
        let config = paginate_markdown(&src);
        assert!(config.pages.len() >= 2);
        let holding: Vec<usize> = config
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| page_text(p).contains("Grouped Entity"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(holding.len(), 1);
        let text = page_text(&config.pages[holding[0]]);
        assert_eq!(text.matches("Member line").count(), 6);
        assert!(!text.contains("Filler"), "group shared a page: {text}");
    }

    #[test]
    fn oversize_group_flows_instead_of_truncating() {
        let mut src = String::from("### 9.9 Giant Entity\n");
        for i in 0..90 {
            src.push_str(&format!("Giant member paragraph {i}.\n\n"));
        }
        let config = paginate_markdown(&src);
        assert!(config.pages.len() > 1);
        let all: String = config.pages.iter().map(page_text).collect();
        for i in 0..90 {
            assert!(
                all.contains(&format!("Giant member paragraph {i}")),
                "lost member {i}"
            );
        }
    }

    #[test]
    fn table_splits_at_row_boundaries() {
        let mut src = String::from("| Key | Value |\n|-----|-------|\n");
        for i in 0..80 {
            src.push_str(&format!("| k{i} | v{i} |\n"));
        }
        let config = paginate_markdown(&src);
        assert!(config.pages.len() > 1);
        let all: String = config.pages.iter().map(page_text).collect();
        assert!(all.contains("k0"));
        assert!(all.contains("k79"));
    }

    #[test]
    fn long_code_listing_splits_at_line_boundaries() {
        let mut src = String::from("```\n");
        for i in 0..80 {
            src.push_str(&format!("let value_{i} = {i};\n"));
        }
        src.push_str("```\n");
        let config = paginate_markdown(&src);
        assert!(config.pages.len() > 1);
        for page in &config.pages {
            for b in &page.boxes {
                assert!(
                    b.y + b.height <= config.page_height_pt + 0.01,
                    "box beyond page: y={} h={}",
                    b.y,
                    b.height
                );
            }
        }
        let all: String = config.pages.iter().map(page_text).collect();
        assert!(all.contains("let value_0"));
        assert!(all.contains("let value_79"));
    }

    #[test]
    fn empty_document_still_produces_a_page() {
        let config = paginate_markdown("");
        assert_eq!(config.pages.len(), 1);
        assert!(config.pages[0].boxes.is_empty());
    }
}
