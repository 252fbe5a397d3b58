//! Strategies used when rendering the HTML body

#[cfg(test)]
use mockall::mock;

use css_inline::{CSSInliner, InlineError};

use super::message::Message;

/// Turns stylesheet rules into inline `style` attributes
pub trait CssInliner: Send + Sync + 'static {
    /// Inline `css` into `html`
    ///
    /// # Arguments
    /// * `html` - The HTML document or fragment.
    /// * `css` - The stylesheet to apply on top of any `<style>` blocks in `html`.
    fn inline(&self, html: &str, css: &str) -> Result<String, InlineError>;
}

#[cfg(test)]
mock! {
    pub CssInliner {}

    impl CssInliner for CssInliner {
        fn inline(&self, html: &str, css: &str) -> Result<String, InlineError>;
    }
}

/// [`CssInliner`] backed by the `css-inline` crate
///
/// Remote stylesheets referenced from the HTML are never fetched.
#[derive(Clone, Copy, Debug, Default)]
pub struct CssInline;

impl CssInliner for CssInline {
    fn inline(&self, html: &str, css: &str) -> Result<String, InlineError> {
        CSSInliner::options()
            .load_remote_stylesheets(false)
            .extra_css(Some(css.into()))
            .build()
            .inline(html)
    }
}

/// Supplies the HTML body before CSS is inlined into it
///
/// Lets a message compute its HTML from other state (a template, say) while still
/// going through the stylesheet step. Closures taking a `&Message` implement it.
pub trait HtmlSource: Send + Sync + 'static {
    /// The HTML to inline CSS into, `None` when there is no HTML body
    fn html_before_inlining(&self, message: &Message) -> Option<String>;
}

impl<F> HtmlSource for F
where
    F: Fn(&Message) -> Option<String> + Send + Sync + 'static,
{
    fn html_before_inlining(&self, message: &Message) -> Option<String> {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_css_inline_applies_extra_css() -> TestResult {
        let html = CssInline.inline(
            "<html><head></head><body><p>x</p></body></html>",
            "p { color: red }",
        )?;

        assert!(html.contains(r#"<p style="color"#));
        assert!(html.contains("red"));

        Ok(())
    }
}
