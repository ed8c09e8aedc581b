//! Tolerant string scanning over provider HTML.
//!
//! There is no DOM here: tags are located by scanning, and the content of an
//! element runs to its balanced closing tag of the same name.

/// Tags that never have a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// An opening tag, before its content has been located.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tag<'a> {
    pub(crate) name: &'a str,
    /// The opening tag, `<` to `>` inclusive.
    pub(crate) open: &'a str,
}

impl Tag<'_> {
    pub(crate) fn attr(&self, name: &str) -> Option<String> {
        attr(self.open, name)
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == class))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Element<'a> {
    pub(crate) name: &'a str,
    /// The opening tag, `<` to `>` inclusive.
    pub(crate) open: &'a str,
    /// Everything between the opening and the matching closing tag.
    pub(crate) inner: &'a str,
}

impl<'a> Element<'a> {
    pub(crate) fn attr(&self, name: &str) -> Option<String> {
        attr(self.open, name)
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        Tag {
            name: self.name,
            open: self.open,
        }
        .has_class(class)
    }

    /// The visible text, whitespace collapsed.
    pub(crate) fn text(&self) -> String {
        text(self.inner)
    }

    /// First descendant matching `pred`.
    pub(crate) fn find(&self, pred: impl Fn(&Tag<'_>) -> bool) -> Option<Element<'a>> {
        find(self.inner, pred)
    }

    /// First descendant element named `tag`.
    pub(crate) fn child(&self, tag: &str) -> Option<Element<'a>> {
        self.find(|e| e.name.eq_ignore_ascii_case(tag))
    }
}

fn tag_name(open: &str) -> &str {
    let body = &open[1..];
    let end = body
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(body.len());
    &body[..end]
}

/// Byte index where the content opened at `from` ends, i.e. the start of the
/// balanced closing tag. `lower` is the whole document, ASCII-lowercased.
fn find_close(lower: &str, name: &str, from: usize) -> Option<usize> {
    let name = name.to_ascii_lowercase();
    let open_pat = format!("<{name}");
    let close_pat = format!("</{name}");
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let next_close = lower[pos..].find(&close_pat)? + pos;
        let next_open = lower[pos..next_close].find(&open_pat).map(|i| i + pos);
        match next_open {
            Some(o)
                if lower[o + open_pat.len()..]
                    .starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/') =>
            {
                depth += 1;
                pos = o + open_pat.len();
            }
            Some(o) => {
                pos = o + open_pat.len();
            }
            None => {
                depth -= 1;
                if depth == 0 {
                    return Some(next_close);
                }
                pos = next_close + close_pat.len();
            }
        }
    }
}

/// Walks the opening tags of `html` in document order. Content is located only
/// for tags accepted by `pred`; scanning stops after `limit` matches.
fn scan<'a>(html: &'a str, pred: impl Fn(&Tag<'_>) -> bool, limit: usize) -> Vec<Element<'a>> {
    let mut out = Vec::new();
    if limit == 0 {
        return out;
    }
    let lower = html.to_ascii_lowercase();
    let mut pos = 0usize;

    while let Some(rel) = html[pos..].find('<') {
        let start = pos + rel;
        let is_tag = html[start + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !is_tag {
            pos = start + 1;
            continue;
        }
        let Some(end_rel) = html[start..].find('>') else {
            break;
        };
        let open_end = start + end_rel;
        let tag = Tag {
            name: tag_name(&html[start..=open_end]),
            open: &html[start..=open_end],
        };
        pos = open_end + 1;
        if !pred(&tag) {
            continue;
        }

        let self_closing = tag.open.ends_with("/>")
            || VOID_TAGS.iter().any(|v| v.eq_ignore_ascii_case(tag.name));
        let inner = if self_closing {
            ""
        } else {
            match find_close(&lower, tag.name, pos) {
                Some(close) => &html[pos..close],
                None => &html[pos..],
            }
        };
        out.push(Element {
            name: tag.name,
            open: tag.open,
            inner,
        });
        if out.len() >= limit {
            break;
        }
    }
    out
}

/// Every element matching `pred`, in document order (nested matches included).
pub(crate) fn find_all<'a>(html: &'a str, pred: impl Fn(&Tag<'_>) -> bool) -> Vec<Element<'a>> {
    scan(html, pred, usize::MAX)
}

/// First element matching `pred`.
pub(crate) fn find<'a>(html: &'a str, pred: impl Fn(&Tag<'_>) -> bool) -> Option<Element<'a>> {
    scan(html, pred, 1).into_iter().next()
}

/// The element with `id`.
pub(crate) fn by_id<'a>(html: &'a str, id: &str) -> Option<Element<'a>> {
    find(html, |e| e.attr("id").as_deref() == Some(id))
}

/// The first element carrying the class token `class`.
pub(crate) fn by_class<'a>(html: &'a str, class: &str) -> Option<Element<'a>> {
    find(html, |e| e.has_class(class))
}

/// Text of the first element with class `class`, `None` when absent.
pub(crate) fn text_by_class(html: &str, class: &str) -> Option<String> {
    by_class(html, class).map(|e| e.text())
}

/// Value of attribute `name` in an opening tag, entities decoded.
pub(crate) fn attr(open: &str, name: &str) -> Option<String> {
    let body = open
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    let mut rest = body[tag_name(open).len()..].trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = rest[key_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remainder) = match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    let close = inner.find(q).unwrap_or(inner.len());
                    (&inner[..close], inner.get(close + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            rest = remainder.trim_start();
            value
        } else {
            ""
        };

        if !key.is_empty() && key.eq_ignore_ascii_case(name) {
            return Some(decode_entities(value));
        }
    }
    None
}

/// Rows of the first `<table>` carrying `class`; each row is its `<td>` cells.
/// Header rows (only `<th>`) are skipped.
pub(crate) fn table_rows<'a>(html: &'a str, class: &str) -> Vec<Vec<Element<'a>>> {
    let Some(table) = find(html, |e| e.name.eq_ignore_ascii_case("table") && e.has_class(class))
    else {
        return Vec::new();
    };
    find_all(table.inner, |e| e.name.eq_ignore_ascii_case("tr"))
        .into_iter()
        .map(|tr| find_all(tr.inner, |e| e.name.eq_ignore_ascii_case("td")))
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Visible text of an HTML fragment: tags removed, entities decoded, whitespace collapsed.
pub(crate) fn text(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_entities(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
