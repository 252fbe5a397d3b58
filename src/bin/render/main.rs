#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Renders a message from files and prints its final bodies

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use mail_composer::{
    domain::mail::{MailAddress, MailAttachment, Message},
    infrastructure::config::MessageDefaults,
};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The mail title
    #[clap(long)]
    pub title: String,

    /// File holding the HTML body
    #[clap(long)]
    pub html: PathBuf,

    /// File holding the text body, derived from the HTML body when omitted
    #[clap(long)]
    pub text: Option<PathBuf>,

    /// The sender address
    #[clap(long, env = "MAIL_FROM")]
    pub from: Option<String>,

    /// The recipient addresses
    #[clap(long, value_delimiter = ',')]
    pub to: Vec<String>,

    /// Files to attach, sent as `application/octet-stream`
    #[clap(long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// The message defaults
    #[clap(flatten)]
    pub defaults: MessageDefaults,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

/// A missing `.env` is fine, an unreadable or malformed one is not
fn load_environment(loaded: dotenvy::Result<PathBuf>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => {
            eprintln!("Failed to load environment: {}", e);

            Err(e.into())
        }
    }
}

#[mutants::skip]
fn main() -> Result<()> {
    load_environment(dotenvy::dotenv())?;

    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();

    let mut message = Message::new(&args.title);
    message.set_body_html(read(&args.html)?);

    if let Some(path) = &args.text {
        message.set_body_text(read(path)?);
    }

    if let Some(from) = &args.from {
        message.set_from(MailAddress::from(from.as_str()));
    }

    for to in &args.to {
        message.add_to_recipient(MailAddress::from(to.as_str()));
    }

    for path in &args.attachments {
        message.add_attachment(MailAttachment::from_file(path, "application/octet-stream")?);
    }

    args.defaults.apply(&mut message)?;

    println!("Subject: {}", message.title());

    if let Some(from) = message.from() {
        println!("From: {from}");
    }

    for to in message.to_recipients() {
        println!("To: {to}");
    }

    for attachment in message.attachments() {
        println!(
            "Attachment: {} ({} bytes)",
            attachment.file_name(),
            attachment.content().len()
        );
    }

    println!("Encoding: {}", message.encoding());
    println!();
    println!("{}", message.body_text()?.unwrap_or_default());
    println!();
    println!("{}", message.body_html()?.unwrap_or_default());

    Ok(())
}
