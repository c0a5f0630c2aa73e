//! Page layout and the text renderer.

use super::{Block, DAY_HEADER, MEALS_HEADER, Page, TableLine, TableSlice};

/// Line budget of one rendered page, footer included.
pub const LINES_PER_PAGE: usize = 56;

/// Blank line plus `Page i of n`.
pub const FOOTER_LINES: usize = 2;

/// Placed between rendered pages.
pub const PAGE_SEPARATOR: &str = "\u{c}\n";

const TABLE_HEADER_LINES: usize = 2;

/// Lines a heading keeps with whatever follows it.
const KEEP_WITH_NEXT: usize = 3;

const MAX_RULE_WIDTH: usize = 60;

fn line_count(block: &Block) -> usize {
    match block {
        Block::Heading(_) => 2,
        Block::Field { .. } | Block::Spacer => 1,
        Block::Table(slice) => TABLE_HEADER_LINES + slice.lines.len(),
    }
}

struct Pager {
    pages: Vec<Page>,
    current: Page,
    used: usize,
    budget: usize,
}

impl Pager {
    fn break_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.used = 0;
    }

    /// Start a new page unless `lines` more fit on this one.
    fn reserve(&mut self, lines: usize) {
        if self.used > 0 && self.used + lines > self.budget {
            self.break_page();
        }
    }

    fn push(&mut self, block: Block) {
        self.used += line_count(&block);
        self.current.blocks.push(block);
    }

    fn push_table(&mut self, table: TableSlice) {
        let TableSlice { day_width, lines } = table;
        let mut remaining = lines.into_iter().peekable();
        loop {
            self.reserve(TABLE_HEADER_LINES + usize::from(remaining.peek().is_some()));
            let room = self
                .budget
                .saturating_sub(self.used + TABLE_HEADER_LINES)
                .max(1);
            let chunk: Vec<TableLine> = remaining.by_ref().take(room).collect();
            self.push(Block::Table(TableSlice {
                day_width,
                lines: chunk,
            }));
            if remaining.peek().is_none() {
                break;
            }
            self.break_page();
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.blocks.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        self.pages
    }
}

/// Lay `blocks` out on pages of [`LINES_PER_PAGE`] lines.
///
/// Tables that do not fit are split, and every slice carries the header.
/// Spacers are dropped at the top of a page.
pub(super) fn paginate(blocks: Vec<Block>) -> Vec<Page> {
    let mut pager = Pager {
        pages: Vec::new(),
        current: Page::default(),
        used: 0,
        budget: LINES_PER_PAGE - FOOTER_LINES,
    };

    for block in blocks {
        match block {
            Block::Table(table) => pager.push_table(table),
            Block::Spacer => {
                if pager.used > 0 && pager.used < pager.budget {
                    pager.push(Block::Spacer);
                }
            }
            Block::Heading(_) => {
                pager.reserve(line_count(&block) + KEEP_WITH_NEXT);
                pager.push(block);
            }
            Block::Field { .. } => {
                pager.reserve(line_count(&block));
                pager.push(block);
            }
        }
    }
    pager.finish()
}

fn table_row(day_width: usize, day: &str, meals: &str) -> String {
    format!("{day:<day_width$} | {meals}").trim_end().to_owned()
}

fn render_block(block: &Block, out: &mut Vec<String>) {
    match block {
        Block::Heading(text) => {
            out.push(text.clone());
            out.push("=".repeat(text.chars().count()));
        }
        Block::Field { label, value } => out.push(format!("{label}: {value}")),
        Block::Spacer => out.push(String::new()),
        Block::Table(slice) => {
            let meal_width = slice
                .lines
                .iter()
                .map(|l| l.meal.chars().count())
                .chain([MEALS_HEADER.len()])
                .max()
                .unwrap_or(MEALS_HEADER.len())
                .min(MAX_RULE_WIDTH);
            out.push(table_row(slice.day_width, DAY_HEADER, MEALS_HEADER));
            out.push(format!(
                "{}-+-{}",
                "-".repeat(slice.day_width),
                "-".repeat(meal_width)
            ));
            for line in &slice.lines {
                out.push(table_row(slice.day_width, &line.day, &line.meal));
            }
        }
    }
}

pub(super) fn render(pages: &[Page]) -> String {
    let total = pages.len();
    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let mut lines = Vec::new();
            for block in &page.blocks {
                render_block(block, &mut lines);
            }
            lines.push(String::new());
            lines.push(format!("Page {} of {total}", i + 1));
            let mut text = lines.join("\n");
            text.push('\n');
            text
        })
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Width of the day column if `line` is a table header.
fn header_day_width(line: &str) -> Option<usize> {
    let day = line.strip_suffix(&format!(" | {MEALS_HEADER}"))?;
    (day.trim_end() == DAY_HEADER).then(|| day.chars().count())
}

/// Day-column cells of every table in `rendered`, continuation cells
/// included as empty strings.
pub(super) fn table_day_cells(rendered: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut day_width: Option<usize> = None;
    let mut skip_rule = false;

    for line in rendered.lines() {
        match day_width {
            None => {
                day_width = header_day_width(line);
                skip_rule = day_width.is_some();
            }
            Some(_) if skip_rule => skip_rule = false,
            Some(_) if line.trim().is_empty() => day_width = None,
            Some(width) => {
                let day: String = line.chars().take(width).collect();
                cells.push(day.trim().to_owned());
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(n: usize) -> Block {
        Block::Field {
            label: format!("F{n}"),
            value: "v".to_owned(),
        }
    }

    #[test]
    fn short_document_is_one_page() {
        let pages = paginate(vec![Block::Heading("H".to_owned()), field(1), field(2)]);
        assert_eq!(pages.len(), 1);
        let text = render(&pages);
        assert_eq!(text, "H\n=\nF1: v\nF2: v\n\nPage 1 of 1\n");
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let pages = paginate(Vec::new());
        assert_eq!(pages.len(), 1);
        assert_eq!(render(&pages), "\nPage 1 of 1\n");
    }

    #[test]
    fn fields_overflow_to_next_page() {
        let blocks: Vec<Block> = (0..60).map(field).collect();
        let pages = paginate(blocks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), LINES_PER_PAGE - FOOTER_LINES);
        assert_eq!(pages[1].blocks.len(), 60 - (LINES_PER_PAGE - FOOTER_LINES));
    }

    #[test]
    fn spacer_is_dropped_at_page_top() {
        let mut blocks: Vec<Block> = (0..LINES_PER_PAGE - FOOTER_LINES).map(field).collect();
        blocks.push(Block::Spacer);
        blocks.push(field(99));
        let pages = paginate(blocks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].blocks, vec![field(99)]);
    }

    #[test]
    fn split_table_repeats_header() {
        let lines: Vec<TableLine> = (0..100)
            .map(|i| TableLine {
                day: if i % 10 == 0 { format!("Day {}", i / 10 + 1) } else { String::new() },
                meal: format!("meal {i}"),
            })
            .collect();
        let pages = paginate(vec![Block::Table(TableSlice {
            day_width: 6,
            lines,
        })]);
        assert_eq!(pages.len(), 2);
        let text = render(&pages);
        assert_eq!(text.matches("Day    | Meals").count(), 2);

        let cells = table_day_cells(&text);
        assert_eq!(cells.len(), 100);
        assert_eq!(cells.iter().filter(|c| !c.is_empty()).count(), 10);
    }

    #[test]
    fn cells_keep_pipes_in_labels() {
        let slice = TableSlice {
            day_width: 9,
            lines: vec![TableLine {
                day: "Mon | Tue".to_owned(),
                meal: "soup".to_owned(),
            }],
        };
        let text = render(&paginate(vec![Block::Table(slice)]));
        assert_eq!(table_day_cells(&text), vec!["Mon | Tue"]);
    }
}
