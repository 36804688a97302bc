//! Assemble GB/T 9704 official documents as `.docx` packages from a
//! markdown body, merging up to three attachments natively.

pub mod builder;
pub mod classify;
pub mod config;
pub mod docx;
mod error;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod package;
pub mod styles;
pub mod table;
pub mod title;

pub use builder::DocumentBuilder;
pub use config::{AssembleOptions, PageSetup};
pub use error::Error;
pub use merge::MergeOutcome;
pub use model::{Attachment, AttachmentKind, DocumentTree};

use std::time::Instant;

use package::DocumentMeta;
use styles::StyleRegistry;

/// Everything needed to produce one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    pub title: String,
    pub issuing_department: String,
    pub issue_date: String,
    pub body_markdown: String,
    pub receiving_department: Option<String>,
    /// In reference order; the first is 附件1.
    pub attachments: Vec<Attachment>,
}

/// Document tree together with how each attachment was merged.
#[derive(Clone, Debug, PartialEq)]
pub struct Assembled {
    pub tree: DocumentTree,
    pub outcomes: Vec<MergeOutcome>,
}

fn validate(request: &Request, options: &AssembleOptions) -> Result<(), Error> {
    let required = [
        ("title", &request.title),
        ("issuing_department", &request.issuing_department),
        ("issue_date", &request.issue_date),
        ("body_markdown", &request.body_markdown),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{field} must not be empty")));
        }
    }
    if request.attachments.len() > options.max_attachments {
        return Err(Error::Validation(format!(
            "{} attachments given, at most {} allowed",
            request.attachments.len(),
            options.max_attachments
        )));
    }
    Ok(())
}

/// Word attachments handed over without a recovered title get one from their
/// content. Unreadable bytes are left for the merge stage to report.
fn with_recovered_titles(attachments: &[Attachment]) -> Vec<Attachment> {
    attachments
        .iter()
        .map(|attachment| {
            let mut attachment = attachment.clone();
            if attachment.kind == AttachmentKind::Word && attachment.extracted_title.is_none() {
                if let Some(bytes) = attachment.raw_bytes.as_deref() {
                    match docx::SourceDocument::from_bytes(bytes) {
                        Ok(source) => {
                            attachment.extracted_title =
                                title::recovered_title(&source, &attachment.name);
                        }
                        Err(e) => log::debug!("{}: title not recovered: {e}", attachment.name),
                    }
                }
            }
            attachment
        })
        .collect()
}

/// Validate `request` and build its document tree without serialising it.
pub fn build_tree(request: &Request, options: &AssembleOptions) -> Result<Assembled, Error> {
    validate(request, options)?;

    let body = classify::clean_body(
        &request.body_markdown,
        &request.title,
        &request.issuing_department,
        &request.issue_date,
        request.receiving_department.as_deref(),
    );
    let blocks = classify::classify(&body);
    log::debug!("classified {} body blocks", blocks.len());

    let attachments = with_recovered_titles(&request.attachments);

    let mut builder = DocumentBuilder::new(options.clone());
    builder.add_title(request.title.trim())?;
    builder.add_body(&blocks)?;
    if !attachments.is_empty() {
        builder.add_references(&attachments)?;
    }
    builder.add_signature(
        request.issuing_department.trim(),
        request.issue_date.trim(),
    )?;

    let mut outcomes = Vec::with_capacity(attachments.len());
    for (i, attachment) in attachments.iter().enumerate() {
        let outcome = merge::merge_attachment(&mut builder, i + 1, attachment)?;
        log::info!("attachment {}: {} merged as {outcome:?}", i + 1, attachment.name);
        outcomes.push(outcome);
    }

    Ok(Assembled {
        tree: builder.finish()?,
        outcomes,
    })
}

/// Assemble `request` into `.docx` bytes with the standard page setup.
pub fn assemble(request: &Request) -> Result<Vec<u8>, Error> {
    assemble_with(request, &AssembleOptions::default())
}

pub fn assemble_with(request: &Request, options: &AssembleOptions) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let assembled = build_tree(request, options)?;
    let t_build = t0.elapsed();

    let meta = DocumentMeta {
        title: request.title.trim(),
        author: request.issuing_department.trim(),
    };
    let bytes = package::write_package(&assembled.tree, &StyleRegistry::standard(), &meta, options)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: build={:.1}ms, write={:.1}ms, total={:.1}ms ({} elements, {} attachments, output {} bytes)",
        t_build.as_secs_f64() * 1000.0,
        (t_total - t_build).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        assembled.tree.len(),
        assembled.outcomes.len(),
        bytes.len(),
    );

    Ok(bytes)
}
