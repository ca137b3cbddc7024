//! Hacker News listing extraction.
//!
//! Listing pages are server-rendered: each entry is a `<tr class="athing">`
//! row holding the title anchor, followed by a subtext row whose
//! `<span class="age" title="...">` carries the precise submission time.
//! The title attribute is `"<ISO-8601> <unix seconds>"` on current markup and
//! a bare ISO string on older markup; only the first token is kept.

use super::types::RawItem;
use super::Extractor;

#[derive(Debug, Clone, Copy, Default)]
pub struct HnExtractor;

impl Extractor for HnExtractor {
    fn extract(&self, html: &str) -> Vec<RawItem> {
        let lower = html.to_ascii_lowercase();
        let starts: Vec<usize> = lower
            .match_indices("class=\"athing")
            .map(|(i, _)| i)
            .collect();

        let mut items = Vec::with_capacity(starts.len());
        for (n, &start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(html.len());
            let (block, block_lower) = (&html[start..end], &lower[start..end]);

            let Some(title) = extract_title(block, block_lower) else {
                tracing::debug!(offset = start, "listing row without a title anchor, skipped");
                continue;
            };
            let (timestamp_raw, relative_age) = extract_age(block, block_lower);
            items.push(RawItem {
                title,
                timestamp_raw,
                relative_age,
            });
        }
        items
    }

    fn next_page(&self, html: &str) -> Option<String> {
        let lower = html.to_ascii_lowercase();
        let at = lower.find("class=\"morelink\"")?;
        let (open, close) = enclosing_tag(&lower, at)?;
        let href = attr(&html[open..close], &lower[open..close], "href")?;
        let href = decode_entities(href);
        (!href.is_empty()).then_some(href)
    }
}

fn extract_title(block: &str, lower: &str) -> Option<String> {
    let line = lower.find("class=\"titleline\"")?;
    let anchor = line + lower[line..].find("<a")?;
    let text = anchor_text(&block[anchor..], &lower[anchor..])?;
    let title = normalize_text(&text);
    (!title.is_empty()).then_some(title)
}

fn extract_age(block: &str, lower: &str) -> (Option<String>, String) {
    let Some(at) = lower.find("class=\"age\"") else {
        return (None, String::new());
    };
    let Some((open, close)) = enclosing_tag(lower, at) else {
        return (None, String::new());
    };
    let timestamp = attr(&block[open..close], &lower[open..close], "title")
        .and_then(|t| t.split_whitespace().next())
        .map(str::to_string);
    let relative_age = anchor_text(&block[close..], &lower[close..])
        .map(|t| normalize_text(&t))
        .unwrap_or_default();
    (timestamp, relative_age)
}

/// Byte range `[open, close)` of the tag that contains position `at`.
fn enclosing_tag(lower: &str, at: usize) -> Option<(usize, usize)> {
    let open = lower[..at].rfind('<')?;
    let close = at + lower[at..].find('>')? + 1;
    Some((open, close))
}

/// Value of a double-quoted attribute inside a single tag.
fn attr<'a>(tag: &'a str, tag_lower: &str, name: &str) -> Option<&'a str> {
    let needle = format!("{}=\"", name);
    let mut from = 0;
    while let Some(rel) = tag_lower[from..].find(&needle) {
        let pos = from + rel;
        let preceded_by_space = tag_lower[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let value_start = pos + needle.len();
        if preceded_by_space {
            let value_end = value_start + tag_lower[value_start..].find('"')?;
            return Some(&tag[value_start..value_end]);
        }
        from = value_start;
    }
    None
}

/// Inner text of the first `<a ...>...</a>` in `s`, tags stripped.
fn anchor_text(s: &str, lower: &str) -> Option<String> {
    let open = lower.find("<a")?;
    let body_start = open + lower[open..].find('>')? + 1;
    let body_end = body_start + lower[body_start..].find("</a>")?;
    Some(strip_tags(&s[body_start..body_end]))
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn normalize_text(s: &str) -> String {
    decode_entities(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
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
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_html() -> &'static str {
        r#"<html><body><table id="hnmain"><tr><td><table>
<tr class="athing submission" id="41890003">
  <td align="right" valign="top" class="title"><span class="rank">1.</span></td>
  <td class="title"><span class="titleline"><a href="https://example.com/a">Rust &amp; the   &#x27;borrow&#x27; checker</a><span class="sitebit comhead"> (<a href="from?site=example.com"><span class="sitestr">example.com</span></a>)</span></span></td>
</tr>
<tr><td colspan="2"></td><td class="subtext"><span class="subline">
  <span class="score" id="score_41890003">1 point</span> by <a href="user?id=alice" class="hnuser">alice</a>
  <span class="age" title="2024-10-17T12:00:09 1729166409"><a href="item?id=41890003">1 minute ago</a></span>
</span></td></tr>
<tr class="spacer" style="height:5px"></tr>
<tr class="athing submission" id="41890002">
  <td class="title"><span class="titleline"><a href="item?id=41890002">Ask HN: Older markup?</a></span></td>
</tr>
<tr><td colspan="2"></td><td class="subtext">
  <span class="age" title="2024-10-17T11:58:00"><a href="item?id=41890002">3 minutes ago</a></span>
</td></tr>
<tr class="athing submission" id="41890001">
  <td class="title"><span class="titleline"><a href="item?id=41890001">No age here</a></span></td>
</tr>
<tr><td colspan="2"></td><td class="subtext"><span class="subline">flagged</span></td></tr>
<tr class="morespace" style="height:10px"></tr>
<tr><td colspan="2"></td><td class="title"><a href="newest?next=41889970&amp;n=31" class="morelink" rel="next">More</a></td></tr>
</table></td></tr></table></body></html>"#
    }

    #[test]
    fn test_extract_titles_in_order() {
        let items = HnExtractor.extract(fixture_html());
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Rust & the 'borrow' checker", "Ask HN: Older markup?", "No age here"]
        );
    }

    #[test]
    fn test_extract_timestamp_first_token() {
        let items = HnExtractor.extract(fixture_html());
        assert_eq!(items[0].timestamp_raw.as_deref(), Some("2024-10-17T12:00:09"));
        assert_eq!(items[0].relative_age, "1 minute ago");
        assert_eq!(items[1].timestamp_raw.as_deref(), Some("2024-10-17T11:58:00"));
    }

    #[test]
    fn test_extract_missing_age_is_none() {
        let items = HnExtractor.extract(fixture_html());
        assert_eq!(items[2].timestamp_raw, None);
        assert_eq!(items[2].relative_age, "");
    }

    #[test]
    fn test_extract_empty_page() {
        let html = "<html><body><table></table></body></html>";
        assert!(HnExtractor.extract(html).is_empty());
        assert_eq!(HnExtractor.next_page(html), None);
    }

    #[test]
    fn test_next_page_href_decoded() {
        assert_eq!(
            HnExtractor.next_page(fixture_html()).as_deref(),
            Some("newest?next=41889970&n=31")
        );
    }

    #[test]
    fn test_attr_requires_word_boundary() {
        let tag = r#"<span data-title="wrong" title="right">"#;
        assert_eq!(attr(tag, &tag.to_ascii_lowercase(), "title"), Some("right"));
    }

    #[test]
    fn test_decode_entities_leaves_bare_ampersand() {
        assert_eq!(decode_entities("AT&T &lt;3 &#65;"), "AT&T <3 A");
    }
}
