//! Message configuration

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::domain::{
    mail::{Message, MessageError, DEFAULT_ENCODING},
    text::{TagReducer, Unterminated, DEFAULT_EXPAND_TAGS},
};

/// Defaults applied to every composed message
#[derive(Clone, Debug, Args)]
pub struct MessageDefaults {
    /// The mail encoding
    #[clap(long, env = "MAIL_ENCODING", default_value = DEFAULT_ENCODING)]
    pub encoding: String,

    /// Do not derive a text body from the HTML body
    #[clap(long, env = "MAIL_NO_AUTO_TEXT")]
    pub no_auto_text: bool,

    /// Stylesheets to inline into the HTML body
    #[clap(long = "css-file", env = "MAIL_CSS_FILES", value_delimiter = ',')]
    pub css_files: Vec<PathBuf>,

    /// Tags kept in the derived text body
    #[clap(long = "keep-tag", env = "MAIL_KEEP_TAGS", value_delimiter = ',')]
    pub keep_tags: Vec<String>,

    /// Tags removed with their content from the derived text body
    #[clap(
        long = "expand-tag",
        env = "MAIL_EXPAND_TAGS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXPAND_TAGS.map(String::from)
    )]
    pub expand_tags: Vec<String>,

    /// Fail on unterminated comments and tags instead of dropping the rest of the body
    #[clap(long, env = "MAIL_STRICT_MARKUP")]
    pub strict_markup: bool,
}

impl Default for MessageDefaults {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            no_auto_text: false,
            css_files: Vec::new(),
            keep_tags: Vec::new(),
            expand_tags: DEFAULT_EXPAND_TAGS.map(String::from).to_vec(),
            strict_markup: false,
        }
    }
}

impl MessageDefaults {
    /// Builds the reducer used to derive text bodies
    pub fn text_reducer(&self) -> Result<TagReducer, MessageError> {
        let unterminated = if self.strict_markup {
            Unterminated::Fail
        } else {
            Unterminated::Truncate
        };

        let reducer = TagReducer::new(self.keep_tags.as_slice(), self.expand_tags.as_slice())?;

        Ok(reducer.with_unterminated(unterminated))
    }

    /// Applies the defaults to `message`, reading every stylesheet
    pub fn apply(&self, message: &mut Message) -> Result<(), MessageError> {
        message.set_encoding(self.encoding.clone())?;
        message.auto_create_body_text(!self.no_auto_text);
        message.set_text_reducer(self.text_reducer()?);

        for path in &self.css_files {
            message.add_css_file(path)?;
        }

        debug!(
            encoding = %self.encoding,
            stylesheets = self.css_files.len(),
            "applied message defaults"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use testresult::TestResult;

    use crate::domain::text::ReducerError;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        defaults: MessageDefaults,
    }

    #[test]
    fn test_default_matches_command_line_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["render"])?;
        let defaults = MessageDefaults::default();

        assert_eq!(cli.defaults.encoding, defaults.encoding);
        assert_eq!(cli.defaults.expand_tags, defaults.expand_tags);
        assert!(cli.defaults.keep_tags.is_empty());
        assert!(!cli.defaults.no_auto_text);
        assert!(!cli.defaults.strict_markup);

        Ok(())
    }

    #[test]
    fn test_parse_arguments() -> TestResult {
        let cli = Cli::try_parse_from([
            "render",
            "--encoding",
            "iso-8859-1",
            "--keep-tag",
            "b,i",
            "--expand-tag",
            "script",
            "--no-auto-text",
            "--strict-markup",
        ])?;

        assert_eq!(cli.defaults.encoding, "iso-8859-1");
        assert_eq!(cli.defaults.keep_tags, ["b", "i"]);
        assert_eq!(cli.defaults.expand_tags, ["script"]);
        assert!(cli.defaults.no_auto_text);
        assert!(cli.defaults.strict_markup);

        Ok(())
    }

    #[test]
    fn test_apply_defaults() -> TestResult {
        let dir = tempfile::tempdir()?;
        let first = dir.path().join("a.css");
        let second = dir.path().join("b.css");
        fs::write(&first, "p{color:red}")?;
        fs::write(&second, "b{color:blue}")?;

        let defaults = MessageDefaults {
            encoding: "iso-8859-1".to_string(),
            no_auto_text: true,
            css_files: vec![first, second],
            keep_tags: vec!["b".to_string()],
            strict_markup: true,
            ..Default::default()
        };

        let mut message = Message::new("Hi");
        defaults.apply(&mut message)?;

        assert_eq!(message.encoding(), "iso-8859-1");
        assert!(!message.auto_creates_body_text());
        assert_eq!(message.css(), "p{color:red}b{color:blue}");
        assert_eq!(message.text_reducer().keep_tags(), ["b"]);
        assert_eq!(message.text_reducer().unterminated(), Unterminated::Fail);

        Ok(())
    }

    #[test]
    fn test_apply_fails_on_missing_stylesheet() -> TestResult {
        let dir = tempfile::tempdir()?;

        let defaults = MessageDefaults {
            css_files: vec![dir.path().join("missing.css")],
            ..Default::default()
        };

        let result = defaults.apply(&mut Message::new("Hi"));

        assert!(matches!(result, Err(MessageError::CssFile { .. })));

        Ok(())
    }

    #[test]
    fn test_invalid_tag_name() {
        let defaults = MessageDefaults {
            keep_tags: vec![String::new()],
            ..Default::default()
        };

        assert!(matches!(
            defaults.text_reducer(),
            Err(MessageError::Markup(ReducerError::InvalidTagName { .. }))
        ));
    }
}
