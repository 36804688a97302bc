use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde::Deserialize;

use gbdoc::{Attachment, AttachmentKind, AssembleOptions, Request};

/// Assemble a GB/T 9704 official document (.docx) from a JSON request
#[derive(Parser, Debug)]
#[command(name = "gbdoc")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON request: title, issuing_department, issue_date, content
    request: PathBuf,

    /// Output .docx path (defaults to the request path with a .docx extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Attachment file (.docx, .csv, .xlsx, .txt, .md); repeat up to three times
    #[arg(short, long = "attach")]
    attach: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RequestFile {
    title: String,
    issuing_department: String,
    issue_date: String,
    #[serde(alias = "markdown_content")]
    content: String,
    #[serde(default)]
    receiving_department: Option<String>,
    #[serde(default)]
    attachments: Vec<AttachmentFile>,
}

/// Attachment given inline as markdown.
#[derive(Debug, Deserialize)]
struct AttachmentFile {
    #[serde(default)]
    order: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    name: String,
    #[serde(default)]
    markdown_content: String,
}

impl AttachmentFile {
    fn into_attachment(self) -> Attachment {
        let kind = match self.kind.to_lowercase().as_str() {
            "word" => AttachmentKind::Word,
            "csv" | "table" => AttachmentKind::Csv,
            "excel" => AttachmentKind::Excel,
            "markdown" => AttachmentKind::Markdown,
            "error" => AttachmentKind::Error,
            _ => AttachmentKind::Text,
        };
        let mut attachment = Attachment::new(kind, self.name.clone());
        attachment.title = gbdoc::ingest::clean_filename(&self.name);
        attachment.markdown_body = Some(self.markdown_content);
        attachment
    }
}

fn run(args: Args) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(&args.request)?;
    let file: RequestFile = serde_json::from_str(&json)?;

    let mut inline = file.attachments;
    inline.sort_by_key(|a| a.order.as_deref().and_then(|o| o.trim().parse::<u32>().ok()));
    let mut attachments: Vec<Attachment> =
        inline.into_iter().map(AttachmentFile::into_attachment).collect();
    for path in &args.attach {
        attachments.push(gbdoc::ingest::read_attachment(path)?);
    }

    let request = Request {
        title: file.title,
        issuing_department: file.issuing_department,
        issue_date: file.issue_date,
        body_markdown: file.content,
        receiving_department: file.receiving_department,
        attachments,
    };

    let bytes = gbdoc::assemble_with(&request, &AssembleOptions::default())?;
    let output = args
        .output
        .unwrap_or_else(|| args.request.with_extension("docx"));
    std::fs::write(&output, bytes)?;
    Ok(output)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(output) => println!("wrote {}", output.display()),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
