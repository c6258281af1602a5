//! Cleans widget messages before they reach a prompt.
//!
//! Message content is trimmed, control characters are dropped and HTML
//! markup is removed. The bodies of `script` and `style` elements are
//! discarded entirely; text inside any other element is kept.

/// Elements whose content is never kept.
const DISCARDED_ELEMENTS: [&str; 4] = ["script", "style", "iframe", "noscript"];

/// Strips markup and surrounding whitespace from one message.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSanitizer;

impl MessageSanitizer {
    pub fn new() -> Self {
        Self
    }

    pub fn sanitize(&self, content: &str) -> String {
        let stripped = strip_markup(content.trim());
        stripped
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

fn strip_markup(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        output.push_str(&rest[..open]);
        let after = &rest[open..];

        let Some(close) = tag_end(after) else {
            // An unterminated '<' is plain text.
            output.push_str(after);
            return output;
        };

        let tag = &after[1..close];
        if !looks_like_tag(tag) {
            output.push('<');
            rest = &after[1..];
            continue;
        }

        rest = &after[close + 1..];

        let name = tag_name(tag);
        let self_closing = tag.trim_end().ends_with('/');
        if !tag.starts_with('/') && !self_closing && DISCARDED_ELEMENTS.contains(&name.as_str()) {
            let end_tag = format!("</{}", name);
            rest = match rest.to_ascii_lowercase().find(&end_tag) {
                Some(end) => match rest[end..].find('>') {
                    Some(gt) => &rest[end + gt + 1..],
                    None => "",
                },
                None => "",
            };
        }
    }

    output.push_str(rest);
    output
}

/// Byte offset of the `>` closing the tag that opens `after`.
///
/// Comments end at `-->`. Inside a tag, `>` within a quoted attribute value
/// does not close it; an unbalanced quote falls back to the first `>`.
fn tag_end(after: &str) -> Option<usize> {
    if after.starts_with("<!--") {
        return after.find("-->").map(|end| end + 2);
    }

    let mut quote = None;
    for (i, c) in after.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }

    after.find('>')
}

fn looks_like_tag(tag: &str) -> bool {
    let body = tag.strip_prefix('/').unwrap_or(tag);
    body.starts_with('!') || body.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(input: &str) -> String {
        MessageSanitizer::new().sanitize(input)
    }

    #[test]
    fn trims_plain_text() {
        assert_eq!(clean("  I want to go to Bali  "), "I want to go to Bali");
    }

    #[test]
    fn removes_tags_but_keeps_text() {
        assert_eq!(clean("<b>Hot</b> and <i>sunny</i>"), "Hot and sunny");
    }

    #[test]
    fn drops_script_bodies() {
        assert_eq!(
            clean("Hi<script>alert('x')</script> there"),
            "Hi there"
        );
        assert_eq!(clean("a<STYLE>p{}</STYLE>b"), "ab");
    }

    #[test]
    fn keeps_comparison_operators() {
        assert_eq!(clean("budget < 500 and > 100"), "budget < 500 and > 100");
        assert_eq!(clean("3 <4"), "3 <4");
    }

    #[test]
    fn removes_comments() {
        assert_eq!(clean("x<!-- hidden -->y"), "xy");
    }

    #[test]
    fn unterminated_script_discards_rest() {
        assert_eq!(clean("ok<script>never closed"), "ok");
    }

    #[test]
    fn self_closing_discarded_element_keeps_following_text() {
        assert_eq!(clean("<script/> I want Bali"), "I want Bali");
        assert_eq!(clean("a<style />b<iframe src='x'/>c"), "abc");
    }

    #[test]
    fn quoted_attribute_may_contain_angle_bracket() {
        assert_eq!(clean(r#"<a title="x>y">link</a> ok"#), "link ok");
        assert_eq!(clean("<img alt='a > b'>Beach"), "Beach");
    }

    #[test]
    fn unbalanced_quote_closes_at_first_bracket() {
        assert_eq!(clean(r#"<b class="x>bold</b>"#), "bold");
    }

    #[test]
    fn comment_may_contain_brackets_and_quotes() {
        assert_eq!(clean("x<!-- don't > show -->y"), "xy");
    }

    #[test]
    fn drops_control_characters() {
        assert_eq!(clean("line\u{0007}one\nline two"), "lineone\nline two");
    }
}
