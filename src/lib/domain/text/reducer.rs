//! Selective HTML to plain text reducer
//!
//! Markup is removed in ordered passes over a working copy of the input:
//!
//! 1. the `<` of every *keep* tag (`<name` or `</name`, matched literally) is
//!    protected, so no later pass starts a span there;
//! 2. comments are dropped, `<!--` through the nearest `-->`;
//! 3. for each *expand* name in turn, `<name` (any case) is dropped together with
//!    everything up to the next `name>`, normally the tail of its closing tag;
//! 4. any other `<` is dropped through the next `>`.
//!
//! Each pass is a single forward scan. Protected positions are tracked by offset
//! rather than by rewriting the text, so nothing in the input can be mistaken for
//! a placeholder.
//!
//! Tags are found by substring search, not by tokenizing, so `<b` also matches
//! `<br` and an expand block ends at the first `name>` whether or not it belongs to
//! a nested tag. Entities are left alone.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::errors::{MarkupKind, ReducerError};

/// Tags removed together with their content when deriving a text body
pub const DEFAULT_EXPAND_TAGS: [&str; 5] = ["script", "style", "noframes", "select", "option"];

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

lazy_static! {
    static ref DEFAULT_REDUCER: TagReducer =
        TagReducer::new::<&str, &str>(&[], &DEFAULT_EXPAND_TAGS).unwrap();
}

/// What to do with a comment or tag that is never closed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Unterminated {
    /// Drop everything from the opening `<` to the end of the input
    #[default]
    Truncate,

    /// Fail with [`ReducerError::Unterminated`]
    Fail,
}

#[derive(Clone, Debug)]
struct ExpandRule {
    name: String,
    open: Regex,
    close: Regex,
}

/// The text between passes
struct Working {
    text: String,
    /// `(offset in text, offset in input)` at the start of each run copied unchanged
    origins: Vec<(usize, usize)>,
    /// Sorted offsets of keep-tag `<` characters
    protected: Vec<usize>,
}

impl Working {
    fn new(input: &str, protected: Vec<usize>) -> Self {
        Self {
            text: input.to_string(),
            origins: vec![(0, 0)],
            protected,
        }
    }

    fn is_protected(&self, offset: usize) -> bool {
        self.protected.binary_search(&offset).is_ok()
    }

    /// Maps an offset in the working text back to the input
    fn origin(&self, offset: usize) -> usize {
        let run = self
            .origins
            .partition_point(|&(text, _)| text <= offset)
            .saturating_sub(1);

        match self.origins.get(run) {
            Some(&(text, input)) => input + offset - text,
            None => offset,
        }
    }

    /// Removes sorted, non-overlapping `spans`
    fn remove(&mut self, spans: &[Range<usize>]) {
        let Some(last) = spans.last() else {
            return;
        };

        let len = self.text.len();
        let mut text = String::with_capacity(len);
        let mut origins = Vec::with_capacity(self.origins.len() + spans.len());
        let mut protected = Vec::with_capacity(self.protected.len());
        let (mut run, mut mark) = (0, 0);

        let kept = spans
            .iter()
            .scan(0, |from, span| {
                let kept = *from..span.start;
                *from = span.end;
                Some(kept)
            })
            .chain(std::iter::once(last.end..len));

        for range in kept.filter(|range| !range.is_empty()) {
            let base = text.len();
            text.push_str(&self.text[range.clone()]);

            while run + 1 < self.origins.len() && self.origins[run + 1].0 <= range.start {
                run += 1;
            }

            let mut at = range.start;
            while at < range.end {
                let (run_text, run_input) = self.origins[run];
                origins.push((base + at - range.start, run_input + at - run_text));

                match self.origins.get(run + 1) {
                    Some(&(next, _)) if next < range.end => {
                        run += 1;
                        at = next;
                    }
                    _ => at = range.end,
                }
            }

            while mark < self.protected.len() && self.protected[mark] < range.end {
                if self.protected[mark] >= range.start {
                    protected.push(base + self.protected[mark] - range.start);
                }
                mark += 1;
            }
        }

        self.text = text;
        self.origins = origins;
        self.protected = protected;
    }
}

/// Converts HTML to plain text, keeping some tags and deleting others wholesale
#[derive(Clone, Debug)]
pub struct TagReducer {
    keep: Vec<String>,
    expand: Vec<ExpandRule>,
    unterminated: Unterminated,
}

impl TagReducer {
    /// Creates a reducer
    ///
    /// # Arguments
    /// * `keep` - Tag names whose `<name`/`</name` markers survive in the output.
    /// * `expand` - Tag names whose whole span, content included, is removed, one
    ///   name after the other in the order given.
    ///
    /// # Returns
    /// [`ReducerError::InvalidTagName`] for an empty name or one containing
    /// whitespace, `<`, `>` or `/`.
    pub fn new<K, E>(keep: &[K], expand: &[E]) -> Result<Self, ReducerError>
    where
        K: AsRef<str>,
        E: AsRef<str>,
    {
        let keep = keep
            .iter()
            .map(|name| validate(name.as_ref()).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        let expand = expand
            .iter()
            .map(|name| {
                let name = validate(name.as_ref())?;
                let escaped = regex::escape(name);

                Ok(ExpandRule {
                    name: name.to_string(),
                    open: Regex::new(&format!("(?i)<{escaped}"))?,
                    close: Regex::new(&format!("(?i){escaped}>"))?,
                })
            })
            .collect::<Result<Vec<_>, ReducerError>>()?;

        Ok(Self {
            keep,
            expand,
            unterminated: Unterminated::default(),
        })
    }

    /// Sets the policy for comments and tags that are never closed
    pub fn with_unterminated(mut self, policy: Unterminated) -> Self {
        self.unterminated = policy;
        self
    }

    /// Tag names kept in the output
    pub fn keep_tags(&self) -> &[String] {
        &self.keep
    }

    /// Tag names removed along with their content, in matching order
    pub fn expand_tags(&self) -> impl Iterator<Item = &str> {
        self.expand.iter().map(|rule| rule.name.as_str())
    }

    /// The policy for unterminated markup
    pub fn unterminated(&self) -> Unterminated {
        self.unterminated
    }

    /// Reduces `input` to plain text with surrounding whitespace trimmed
    ///
    /// With [`Unterminated::Fail`], the reported offset is a byte offset into `input`.
    pub fn reduce(&self, input: &str) -> Result<String, ReducerError> {
        let mut working = Working::new(input, self.protected(input));

        let spans = self.comments(&working)?;
        working.remove(&spans);

        for rule in &self.expand {
            let spans = self.blocks(&working, rule)?;
            working.remove(&spans);
        }

        let spans = self.tags(&working)?;
        working.remove(&spans);

        Ok(working.text.trim().to_string())
    }

    fn protected(&self, input: &str) -> Vec<usize> {
        input
            .match_indices('<')
            .map(|(offset, _)| offset)
            .filter(|&offset| {
                let tail = &input[offset + 1..];
                let closing = tail.strip_prefix('/');

                self.keep.iter().any(|name| {
                    tail.starts_with(name.as_str())
                        || closing.is_some_and(|c| c.starts_with(name.as_str()))
                })
            })
            .collect()
    }

    fn comments(&self, working: &Working) -> Result<Vec<Range<usize>>, ReducerError> {
        let text = working.text.as_str();
        let mut spans = Vec::new();
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find(COMMENT_OPEN) {
            let start = cursor + found;

            if working.is_protected(start) {
                cursor = start + 1;
                continue;
            }

            match text[start..].find(COMMENT_CLOSE) {
                Some(close) => {
                    cursor = start + close + COMMENT_CLOSE.len();
                    spans.push(start..cursor);
                }
                None => {
                    self.recover(MarkupKind::Comment, working.origin(start))?;
                    spans.push(start..text.len());
                    break;
                }
            }
        }

        Ok(spans)
    }

    fn blocks(
        &self,
        working: &Working,
        rule: &ExpandRule,
    ) -> Result<Vec<Range<usize>>, ReducerError> {
        let text = working.text.as_str();
        let mut spans = Vec::new();
        let mut cursor = 0;

        while let Some(open) = rule.open.find_at(text, cursor) {
            let start = open.start();

            if working.is_protected(start) {
                cursor = start + 1;
                continue;
            }

            match rule.close.find_at(text, open.end()) {
                Some(close) => {
                    cursor = close.end();
                    spans.push(start..cursor);
                }
                None => {
                    self.recover(MarkupKind::ExpandBlock, working.origin(start))?;
                    spans.push(start..text.len());
                    break;
                }
            }
        }

        Ok(spans)
    }

    fn tags(&self, working: &Working) -> Result<Vec<Range<usize>>, ReducerError> {
        let text = working.text.as_str();
        let mut spans = Vec::new();
        let mut cursor = 0;

        while let Some(found) = text[cursor..].find('<') {
            let start = cursor + found;

            if working.is_protected(start) {
                cursor = start + 1;
                continue;
            }

            match text[start..].find('>') {
                Some(close) => {
                    cursor = start + close + 1;
                    spans.push(start..cursor);
                }
                None => {
                    self.recover(MarkupKind::Tag, working.origin(start))?;
                    spans.push(start..text.len());
                    break;
                }
            }
        }

        Ok(spans)
    }

    fn recover(&self, kind: MarkupKind, offset: usize) -> Result<(), ReducerError> {
        match self.unterminated {
            Unterminated::Truncate => {
                warn!(%kind, offset, "unterminated markup, dropping the rest of the input");

                Ok(())
            }
            Unterminated::Fail => Err(ReducerError::Unterminated { kind, offset }),
        }
    }
}

impl Default for TagReducer {
    fn default() -> Self {
        DEFAULT_REDUCER.clone()
    }
}

/// Reduces `input` to plain text, keeping the `keep` tags and removing the `expand`
/// tags along with their content. Unterminated markup is truncated.
pub fn reduce<K, E>(input: &str, keep: &[K], expand: &[E]) -> Result<String, ReducerError>
where
    K: AsRef<str>,
    E: AsRef<str>,
{
    TagReducer::new(keep, expand)?.reduce(input)
}

fn validate(name: &str) -> Result<&str, ReducerError> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/'));

    if invalid {
        return Err(ReducerError::InvalidTagName {
            name: name.to_string(),
        });
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use testresult::TestResult;

    use super::*;

    const NONE: [&str; 0] = [];

    fn strip(input: &str) -> String {
        reduce(input, &NONE, &NONE).unwrap()
    }

    #[test]
    fn test_strips_all_tags() -> TestResult {
        let text = TagReducer::default().reduce("<p>Hello <b>World</b></p>")?;

        assert_eq!(text, "Hello World");

        Ok(())
    }

    #[test]
    fn test_removes_script_with_content() -> TestResult {
        let text = TagReducer::default()
            .reduce("<script>alert(1)</script><p>Safe <em>text</em></p>")?;

        assert_eq!(text, "Safe text");

        Ok(())
    }

    #[test]
    fn test_expand_match_ignores_case() -> TestResult {
        let text = TagReducer::default()
            .reduce("<SCRIPT type=\"text/javascript\">var a = 1;</Script>visible")?;

        assert_eq!(text, "visible");

        Ok(())
    }

    #[test]
    fn test_removes_every_expand_block() -> TestResult {
        let text = TagReducer::default().reduce("<style>p{}</style>A <style>q{}</style>B")?;

        assert_eq!(text, "A B");

        Ok(())
    }

    #[test]
    fn test_expand_block_ends_at_nearest_name() -> TestResult {
        let text = TagReducer::default().reduce("<option>a<option>b</option>c</option>d")?;

        assert_eq!(text, "bcd");

        Ok(())
    }

    #[test]
    fn test_keeps_tags() -> TestResult {
        let text = reduce("<p>Hello <b>bold</b></p>", &["b"], &NONE)?;

        assert_eq!(text, "Hello <b>bold</b>");

        Ok(())
    }

    #[test]
    fn test_keeps_tag_attributes() -> TestResult {
        let text = reduce("<div><a href=\"https://example.com\">link</a></div>", &["a"], &NONE)?;

        assert_eq!(text, "<a href=\"https://example.com\">link</a>");

        Ok(())
    }

    #[test]
    fn test_keep_matches_name_prefix() -> TestResult {
        let text = reduce("line<br>next", &["b"], &NONE)?;

        assert_eq!(text, "line<br>next");

        Ok(())
    }

    #[test]
    fn test_keep_is_case_sensitive() -> TestResult {
        let text = reduce("<B>x</B>", &["b"], &NONE)?;

        assert_eq!(text, "x");

        Ok(())
    }

    #[test]
    fn test_keep_wins_over_expand() -> TestResult {
        let text = reduce("<style>p{}</style>", &["style"], &DEFAULT_EXPAND_TAGS)?;

        assert_eq!(text, "<style>p{}</style>");

        Ok(())
    }

    #[test]
    fn test_removes_comments() -> TestResult {
        let text = strip("Before<!-- hidden <b>x</b> -->After");

        assert_eq!(text, "BeforeAfter");

        Ok(())
    }

    #[test]
    fn test_comment_inside_script() -> TestResult {
        let text = TagReducer::default().reduce("<script><!-- x --></script>y")?;

        assert_eq!(text, "y");

        Ok(())
    }

    #[test]
    fn test_script_inside_comment() -> TestResult {
        let text = TagReducer::default().reduce("<!-- <script> -->z")?;

        assert_eq!(text, "z");

        Ok(())
    }

    #[test]
    fn test_comment_holding_closing_script_tag() -> TestResult {
        let text = TagReducer::default().reduce("<script>a<!-- </script> -->b</script>c")?;

        assert_eq!(text, "c");

        Ok(())
    }

    #[test]
    fn test_stray_bracket_before_script() -> TestResult {
        let reducer = TagReducer::default();

        assert_eq!(reducer.reduce("1 < 2 <script>alert(1)</script>text")?, "1");
        assert_eq!(
            reducer.reduce("1 < 2 <script>alert(1)</script>text <b>x</b>")?,
            "1 x"
        );

        Ok(())
    }

    #[test]
    fn test_stray_bracket_before_comment() {
        assert_eq!(strip("a < b <!-- x > secret --> c"), "a");
        assert_eq!(strip("a < b <!-- x > secret --> c <i>d</i>"), "a d");
    }

    #[test]
    fn test_leaves_entities_and_stray_brackets() {
        assert_eq!(strip("Fish &amp; chips"), "Fish &amp; chips");
        assert_eq!(strip("a > b"), "a > b");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(strip("  <p> x </p>\n"), "x");
    }

    #[test]
    fn test_truncates_unterminated_markup() -> TestResult {
        let reducer = TagReducer::default();

        assert_eq!(reducer.reduce("Text<!-- never closed")?, "Text");
        assert_eq!(reducer.reduce("a <b")?, "a");
        assert_eq!(reducer.reduce("x<script>alert(1)")?, "x");

        Ok(())
    }

    #[test]
    fn test_unterminated_keep_tag_is_kept() -> TestResult {
        let text = reduce("x <b", &["b"], &NONE)?;

        assert_eq!(text, "x <b");

        Ok(())
    }

    #[test]
    fn test_fails_on_unterminated_comment() {
        let reducer = TagReducer::default().with_unterminated(Unterminated::Fail);

        let result = reducer.reduce("Text<!-- never closed");

        assert!(matches!(
            result,
            Err(ReducerError::Unterminated {
                kind: MarkupKind::Comment,
                offset: 4
            })
        ));
    }

    #[test]
    fn test_fails_on_unterminated_tag() {
        let reducer = TagReducer::default().with_unterminated(Unterminated::Fail);

        assert!(matches!(
            reducer.reduce("a <b"),
            Err(ReducerError::Unterminated {
                kind: MarkupKind::Tag,
                offset: 2
            })
        ));
        assert!(matches!(
            reducer.reduce("x<script>alert(1)"),
            Err(ReducerError::Unterminated {
                kind: MarkupKind::ExpandBlock,
                offset: 1
            })
        ));
    }

    #[test]
    fn test_unterminated_offset_points_into_input() {
        let reducer = TagReducer::default().with_unterminated(Unterminated::Fail);

        assert!(matches!(
            reducer.reduce("<!-- c --><style>x</style>a <b"),
            Err(ReducerError::Unterminated {
                kind: MarkupKind::Tag,
                offset: 28
            })
        ));
    }

    #[test]
    fn test_rejects_invalid_tag_names() {
        assert!(matches!(
            TagReducer::new(&[""], &NONE),
            Err(ReducerError::InvalidTagName { .. })
        ));
        assert!(matches!(
            TagReducer::new(&NONE, &["no script"]),
            Err(ReducerError::InvalidTagName { .. })
        ));
        assert!(matches!(
            TagReducer::new(&["/b"], &NONE),
            Err(ReducerError::InvalidTagName { .. })
        ));
    }

    #[test]
    fn test_default_lists() {
        let reducer = TagReducer::default();

        assert!(reducer.keep_tags().is_empty());
        assert_eq!(reducer.expand_tags().collect::<Vec<_>>(), DEFAULT_EXPAND_TAGS);
        assert_eq!(reducer.unterminated(), Unterminated::Truncate);
    }

    fn markup() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                "[a-z ]{0,8}",
                Just("<p>".to_string()),
                Just("</p>".to_string()),
                Just("<b class=\"x\">".to_string()),
                Just("<br/>".to_string()),
                Just("<!-- SECRET -->".to_string()),
            ],
            0..20,
        )
        .prop_map(|tokens| tokens.concat())
    }

    fn noisy_markup() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                "[a-h ]{0,8}",
                Just("<".to_string()),
                Just(">".to_string()),
                Just("<p>".to_string()),
                Just("<!-- SECRET -->".to_string()),
                Just("<script>HIDDEN</script>".to_string()),
            ],
            0..20,
        )
        .prop_map(|tokens| tokens.concat())
    }

    proptest! {
        #[test]
        fn prop_output_has_no_markup(html in markup()) {
            let text = strip(&html);

            prop_assert!(!text.contains('<'));
            prop_assert!(!text.contains('>'));
            prop_assert!(!text.contains("SECRET"));
        }

        #[test]
        fn prop_stray_brackets_never_leak_hidden_content(html in noisy_markup()) {
            let text = TagReducer::default().reduce(&html).unwrap();

            prop_assert!(!text.contains('<'));
            prop_assert!(!text.contains("SECRET"));
            prop_assert!(!text.contains("HIDDEN"));
        }

        #[test]
        fn prop_plain_text_is_a_fixed_point(text in "[a-zA-Z0-9 .,]{0,64}") {
            let once = strip(&text);

            prop_assert_eq!(&once, text.trim());
            prop_assert_eq!(strip(&once), once);
        }

        #[test]
        fn prop_expand_block_content_is_removed(
            hidden in "[a-z]{1,10}",
            visible in "[a-z ]{0,10}",
        ) {
            let html = format!("<script>{hidden}</script>{visible}");

            let text = TagReducer::default().reduce(&html).unwrap();

            prop_assert_eq!(text, visible.trim());
        }

        #[test]
        fn prop_keep_tags_survive(inner in "[a-z ]{0,10}") {
            let html = format!("<div><em>{inner}</em></div>");

            let text = reduce(&html, &["em"], &NONE).unwrap();

            prop_assert_eq!(text, format!("<em>{inner}</em>"));
        }
    }
}
