//! Escaping and length limits for Telegram's HTML parse mode.

/// Longest text Telegram accepts in one message.
pub const MESSAGE_MAX_CHARS: usize = 4096;

/// Entities are short; a longer `&...;` run is treated as plain text.
const MAX_ENTITY_CHARS: usize = 10;

const fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        _ => None,
    }
}

/// Escape user-supplied text so it renders literally inside HTML markup.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match entity(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Escape `s` and keep the escaped result within `max_chars` characters.
///
/// The cut falls between source characters, never inside an entity, and is
/// marked with an ellipsis.
#[must_use]
pub fn escape_html_capped(s: &str, max_chars: usize) -> String {
    let escaped = escape_html(s);
    if escaped.chars().count() <= max_chars {
        return escaped;
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars - 1;
    let mut out = String::new();
    let mut len = 0;
    for c in s.chars() {
        let piece_len = entity(c).map_or(1, str::len);
        if len + piece_len > budget {
            break;
        }
        match entity(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
        len += piece_len;
    }
    out.push('…');
    out
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = s.chars().take(keep).collect();
    out.push('…');
    out
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect()
}

/// Length of the next token in `rest`: a whole tag, a whole entity, or one
/// character.
fn token_len(rest: &str, first: char) -> usize {
    match first {
        '<' => rest.find('>').map_or(rest.len(), |end| end + 1),
        '&' => rest
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_CHARS)
            .map_or(first.len_utf8(), |end| end + 1),
        _ => first.len_utf8(),
    }
}

/// Truncate HTML-formatted text to at most `max_chars` characters.
///
/// Tags and entities are never split. Tags still open at the cut are closed
/// after the ellipsis, and the closing tags count towards `max_chars`.
#[must_use]
pub fn truncate_markup(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut out_len = 0;
    let mut open: Vec<String> = Vec::new();
    let mut closing_len: usize = 0;
    let mut rest = s;

    while let Some(first) = rest.chars().next() {
        let (token, tail) = rest.split_at(token_len(rest, first));
        let token_chars = token.chars().count();

        let is_tag = token.starts_with('<');
        let is_close = token.starts_with("</");
        let name = if is_tag { tag_name(token) } else { String::new() };
        let closing_after = if !is_tag {
            closing_len
        } else if is_close {
            closing_len.saturating_sub(name.len() + 3)
        } else {
            closing_len + name.len() + 3
        };

        if out_len + token_chars + closing_after + 1 > max_chars {
            break;
        }

        out.push_str(token);
        out_len += token_chars;
        if is_close {
            if open.last() == Some(&name) {
                open.pop();
            }
        } else if is_tag {
            open.push(name);
        }
        closing_len = closing_after;
        rest = tail;
    }

    out.push('…');
    for name in open.iter().rev() {
        out.push_str(&format!("</{name}>"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Lenina" & 5</b>"#),
            "&lt;b&gt;&quot;Lenina&quot; &amp; 5&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_escape_capped_counts_escaped_length() {
        assert_eq!(escape_html_capped("Fish & chips", 50), "Fish &amp; chips");

        let capped = escape_html_capped(&"&".repeat(1000), 100);
        assert!(capped.chars().count() <= 100);
        assert!(capped.starts_with("&amp;&amp;"));
        assert!(capped.ends_with("&amp;…"));

        assert_eq!(escape_html_capped("abc", 0), "");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("борщ", 4), "борщ");
        assert_eq!(truncate_chars("борщ", 3), "бо…");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_truncate_markup_closes_open_tags() {
        let text = "<b>Order</b> for Lenina &amp; Co, <i>ring twice please</i>";
        let cut = truncate_markup(text, 30);
        assert!(cut.chars().count() <= 30);
        assert!(cut.starts_with("<b>Order</b>"));
        assert!(cut.contains('…'));
        assert_eq!(cut.matches("<i>").count(), cut.matches("</i>").count());
        assert!(!cut.contains("&am…"));

        assert_eq!(truncate_markup(text, 500), text);
    }

    #[test]
    fn test_truncate_markup_never_exceeds_limit() {
        let text = format!("<b>{}</b>\n{}", "x".repeat(300), "&amp;".repeat(300));
        for max in [1, 5, 10, 64, 299, 1000] {
            assert!(truncate_markup(&text, max).chars().count() <= max, "max {max}");
        }
    }
}
