//! Packing rendered text blocks into pages that fit one chat message.
//!
//! Telegram caps a message at 4096 characters. Order review renders each order
//! as one block, trims overly long blocks, then packs blocks greedily into
//! pages bounded by both a block count and a character budget.

/// Default number of blocks per page.
pub const DEFAULT_PER_PAGE: usize = 12;
/// Default character budget per page, leaving room for a header.
pub const DEFAULT_PAGE_CHARS: usize = 3800;
/// Default character budget for a single block.
pub const DEFAULT_BLOCK_CHARS: usize = 1500;

use crate::markup::truncate_markup;

const BLOCK_SEPARATOR: &str = "\n\n";

/// Page limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub per_page: usize,
    pub max_chars: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_chars: DEFAULT_PAGE_CHARS,
        }
    }
}

/// One packed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Blocks joined by blank lines.
    pub text: String,
    /// Indices of the blocks on this page, ascending.
    pub indices: Vec<usize>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Pack blocks greedily into pages.
///
/// A page is closed when adding the next block would exceed either limit. A
/// single block longer than `max_chars` still gets a page of its own; callers
/// should cap blocks with [`cap_block`] first. Every block appears on exactly
/// one page, in input order.
#[must_use]
pub fn paginate<S: AsRef<str>>(blocks: &[S], limits: PageLimits) -> Vec<Page> {
    let per_page = limits.per_page.max(1);
    let sep_len = char_len(BLOCK_SEPARATOR);

    let mut pages = Vec::new();
    let mut current = Page {
        text: String::new(),
        indices: Vec::new(),
    };
    let mut current_len = 0;

    for (index, block) in blocks.iter().enumerate() {
        let block = block.as_ref();
        let block_len = char_len(block);
        let added = if current.indices.is_empty() {
            block_len
        } else {
            block_len + sep_len
        };

        let full = current.indices.len() >= per_page || current_len + added > limits.max_chars;
        if full && !current.indices.is_empty() {
            pages.push(std::mem::replace(
                &mut current,
                Page {
                    text: String::new(),
                    indices: Vec::new(),
                },
            ));
            current_len = 0;
        }

        if !current.indices.is_empty() {
            current.text.push_str(BLOCK_SEPARATOR);
            current_len += sep_len;
        }
        current.text.push_str(block);
        current_len += block_len;
        current.indices.push(index);
    }

    if !current.indices.is_empty() {
        pages.push(current);
    }
    pages
}

/// Clamp a requested page index into `[0, page_count - 1]`.
#[must_use]
pub const fn clamp_page(requested: usize, page_count: usize) -> usize {
    if page_count == 0 {
        0
    } else if requested >= page_count {
        page_count - 1
    } else {
        requested
    }
}

/// Cap a block at `max_chars`, cutting whole lines from the end of `body`
/// first so markup on the kept lines stays balanced.
///
/// `body` (the order item text) is trimmed line by line and an ellipsis line
/// marks the cut. `head` and `tail` are kept whole unless they alone exceed
/// the budget, in which case the joined block is cut with
/// [`truncate_markup`]. The result never exceeds `max_chars`.
#[must_use]
pub fn cap_block(head: &str, body: &str, tail: &str, max_chars: usize) -> String {
    let fixed = char_len(head) + char_len(tail) + 2;
    let full_body = char_len(body);
    if fixed + full_body <= max_chars {
        return format!("{head}\n{body}\n{tail}");
    }

    let budget = max_chars.saturating_sub(fixed + 2);
    let mut kept = String::new();
    let mut kept_len = 0;
    for line in body.lines() {
        let line_len = char_len(line) + 1;
        if kept_len + line_len > budget {
            break;
        }
        kept.push_str(line);
        kept.push('\n');
        kept_len += line_len;
    }
    kept.push('…');
    let block = format!("{head}\n{kept}\n{tail}");
    if char_len(&block) > max_chars {
        return truncate_markup(&block, max_chars);
    }
    block
}
