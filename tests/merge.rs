mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use gbdoc::classify::classify;
use gbdoc::docx::SourceDocument;
use gbdoc::merge::{
    self, MergeOutcome, PLACEHOLDER, SplicedContent, direct_splice, is_heading_line,
    merge_attachment, merge_attachment_with, parse_markdown_table, rebuild_table,
};
use gbdoc::model::{
    Attachment, AttachmentKind, DocumentTree, Element, Paragraph, Table, TableCell, TableRow,
    VMerge,
};
use gbdoc::package;
use gbdoc::styles::{self, StyleRegistry};
use gbdoc::{AssembleOptions, DocumentBuilder, Error};

fn ready_builder() -> DocumentBuilder {
    let mut builder = DocumentBuilder::new(AssembleOptions::default());
    builder.add_title("关于报送材料的通知").unwrap();
    builder.add_body(&classify("正文。")).unwrap();
    builder.add_signature("市统计局", "2025年7月11日").unwrap();
    builder
}

fn word(name: &str, bytes: Vec<u8>) -> Attachment {
    let mut attachment = Attachment::new(AttachmentKind::Word, name);
    attachment.raw_bytes = Some(bytes);
    attachment
}

/// Header row merged across both columns, then a full row, then a short row.
fn merged_table_docx() -> Vec<u8> {
    let table = common::tbl(
        2,
        &[
            common::tr(&[common::tc("合计", 2)]),
            common::tr(&[common::tc("甲", 1), common::tc("乙", 1)]),
            common::tr(&[common::tc("丙", 1)]),
        ],
    );
    common::docx(&[common::p("统计表"), table].concat())
}

fn simple_table_docx() -> Vec<u8> {
    let table = common::tbl(
        2,
        &[
            common::tr(&[common::tc("名称", 1), common::tc("数量", 1)]),
            common::tr(&[common::tc("甲", 1), common::tc("3", 1)]),
        ],
    );
    common::docx(&[common::p("说明"), table].concat())
}

fn spans_in(document_xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(document_xml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name((common::W_NS, "gridSpan")))
        .filter_map(|n| n.attribute((common::W_NS, "val")).map(str::to_string))
        .collect()
}

fn section(builder: &DocumentBuilder, from: usize) -> &[Element] {
    &builder.tree().elements()[from..]
}

#[test]
fn simple_word_attachment_is_spliced_verbatim() {
    common::init_logging();
    let mut builder = ready_builder();
    let outcome = merge_attachment(&mut builder, 1, &word("a.docx", simple_table_docx())).unwrap();
    assert_eq!(outcome, MergeOutcome::Spliced);

    let raw: Vec<&str> = builder
        .tree()
        .elements()
        .iter()
        .filter_map(|e| match e {
            Element::Raw(r) => Some(r.local_name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(raw, vec!["p", "tbl"]);
}

#[test]
fn spliced_span_survives_serialisation() {
    let source = SourceDocument::from_bytes(&merged_table_docx()).unwrap();
    let mut builder = ready_builder();
    builder.begin_attachment(1).unwrap();
    let content = direct_splice(&source, builder.tree()).unwrap();
    builder.declare_namespaces(&content.namespaces, &content.ignorable).unwrap();
    builder.append(content.elements).unwrap();
    let tree = builder.finish().unwrap();

    let xml = package::document_xml(&tree, &StyleRegistry::standard(), &AssembleOptions::default())
        .unwrap();
    assert_eq!(spans_in(&xml), vec!["2"]);
}

#[test]
fn merged_tables_are_reconstructed_with_padding() {
    let mut builder = ready_builder();
    let start = builder.tree().len();
    let outcome = merge_attachment(&mut builder, 1, &word("b.docx", merged_table_docx())).unwrap();
    assert_eq!(outcome, MergeOutcome::Reconstructed);

    let table = section(&builder, start)
        .iter()
        .find_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
        .expect("reconstructed table");
    assert_eq!(table.col_widths.len(), 2);
    assert_eq!(table.rows[0].cells.len(), 1);
    assert_eq!(table.rows[0].cells[0].grid_span, 2);
    assert_eq!(table.rows[2].cells.len(), 2, "short row padded");
    assert!(table.rows.iter().all(|r| r.grid_width() == 2));
    assert!(table.rows[2].cells[1].text().is_empty());
}

static SPLICE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn failing_splice(_: &SourceDocument, _: &DocumentTree) -> Result<SplicedContent, Error> {
    SPLICE_CALLS.fetch_add(1, Ordering::SeqCst);
    Err(Error::Splice("injected failure".into()))
}

#[test]
fn failed_splice_falls_back_to_reconstruction() {
    let mut builder = ready_builder();
    let start = builder.tree().len();
    let before = SPLICE_CALLS.load(Ordering::SeqCst);
    let outcome = merge_attachment_with(
        &mut builder,
        1,
        &word("c.docx", simple_table_docx()),
        failing_splice,
    )
    .unwrap();
    assert_eq!(outcome, MergeOutcome::Reconstructed);
    assert!(SPLICE_CALLS.load(Ordering::SeqCst) > before);

    let added = section(&builder, start);
    assert!(added.iter().all(|e| !matches!(e, Element::Raw(_))));
    let table = added
        .iter()
        .find_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
        .expect("table rebuilt");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].cells[1].text(), "3");
    assert!(table.bordered);
}

#[test]
fn forced_fallback_keeps_two_column_cell() {
    let mut builder = ready_builder();
    merge_attachment_with(&mut builder, 1, &word("d.docx", merged_table_docx()), failing_splice)
        .unwrap();
    let tree = builder.finish().unwrap();
    let xml = package::document_xml(&tree, &StyleRegistry::standard(), &AssembleOptions::default())
        .unwrap();
    assert_eq!(spans_in(&xml), vec!["2"]);

    let table = tree.tables().next().unwrap();
    assert!(table.rows.iter().all(|r| r.grid_width() == table.col_widths.len()));
}

#[test]
fn relationship_references_force_reconstruction() {
    let body = format!(
        "<w:p><w:hyperlink r:id=\"rId9\"><w:r><w:t>链接文字</w:t></w:r></w:hyperlink></w:p>{}",
        common::p("第二段")
    );
    let source = SourceDocument::from_bytes(&common::docx(&body)).unwrap();
    assert!(matches!(
        direct_splice(&source, &DocumentTree::new()),
        Err(Error::Splice(_))
    ));

    let mut builder = ready_builder();
    let outcome = merge_attachment(&mut builder, 1, &word("e.docx", common::docx(&body))).unwrap();
    assert_eq!(outcome, MergeOutcome::Reconstructed);
    let texts = common::tree_texts(builder.tree());
    assert!(texts.iter().any(|t| t == "链接文字"));
}

#[test]
fn conflicting_namespace_prefix_refuses_splice() {
    let document = common::document_xml_with(r#" xmlns:w14="urn:example:other""#, &common::p("正文"));
    let bytes = common::package(&[("word/document.xml", &document)]);
    let source = SourceDocument::from_bytes(&bytes).unwrap();
    let err = direct_splice(&source, &DocumentTree::new()).unwrap_err();
    assert!(matches!(err, Error::Splice(_)));
    assert!(!err.is_fatal());
}

#[test]
fn extra_namespaces_are_declared_on_target() {
    let document = common::document_xml_with(
        r#" xmlns:w16cid="http://schemas.microsoft.com/office/word/2016/wordml/cid" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="w16cid""#,
        &common::p("正文"),
    );
    let bytes = common::package(&[("word/document.xml", &document)]);
    let mut builder = ready_builder();
    let outcome = merge_attachment(&mut builder, 1, &word("f.docx", bytes)).unwrap();
    assert_eq!(outcome, MergeOutcome::Spliced);
    assert!(builder.tree().namespaces().contains_key("w16cid"));
    assert!(builder.tree().ignorable().contains("w16cid"));

    let tree = builder.finish().unwrap();
    let xml = package::document_xml(&tree, &StyleRegistry::standard(), &AssembleOptions::default())
        .unwrap();
    assert!(roxmltree::Document::parse(&xml).is_ok());
    assert!(xml.contains("w16cid"));
}

#[test]
fn corrupt_word_bytes_become_placeholder() {
    let mut builder = ready_builder();
    let start = builder.tree().len();
    let outcome =
        merge_attachment(&mut builder, 1, &word("broken.docx", b"not a zip".to_vec())).unwrap();
    assert_eq!(outcome, MergeOutcome::PlaceholderError);

    let texts: Vec<String> = common::paragraphs(section(&builder, start))
        .iter()
        .map(|p| p.text())
        .collect();
    assert_eq!(texts[0], "附件1");
    assert!(texts.last().unwrap().starts_with(PLACEHOLDER));
}

#[test]
fn error_attachment_renders_title_and_placeholder() {
    let mut attachment = Attachment::new(AttachmentKind::Error, "坏文件.docx");
    attachment.title = "坏文件".into();
    attachment.markdown_body = Some(format!("{PLACEHOLDER}: 无法读取"));

    let mut builder = ready_builder();
    let start = builder.tree().len();
    let outcome = merge_attachment(&mut builder, 1, &attachment).unwrap();
    assert_eq!(outcome, MergeOutcome::PlaceholderError);

    let paras = common::paragraphs(section(&builder, start));
    let texts: Vec<String> = paras.iter().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["附件1", "", "坏文件", "", "处理附件时发生错误: 无法读取"]);
    assert_eq!(paras[2].style.as_deref(), Some(styles::ATTACHMENT_CONTENT_TITLE));
}

#[test]
fn csv_attachment_renders_native_table() {
    let mut attachment = Attachment::new(AttachmentKind::Csv, "名单.csv");
    attachment.title = "名单".into();
    attachment.markdown_body =
        Some("| 姓名 | 单位 |\n| --- | --- |\n| 张三 | 一中 |\n| 孤行 |\n| 李四 | 二中 |".into());

    let mut builder = ready_builder();
    let outcome = merge_attachment(&mut builder, 1, &attachment).unwrap();
    assert_eq!(outcome, MergeOutcome::Rendered);

    let table = builder.tree().tables().next().expect("table");
    assert!(table.bordered);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0].cells[0].text(), "姓名");
    assert!(table.rows[0].cells[0].paragraphs[0].runs[0].bold);
    assert!(!table.rows[1].cells[0].paragraphs[0].runs[0].bold);
    assert_eq!(table.rows[2].cells[1].text(), "二中");
}

#[test]
fn text_attachment_is_one_paragraph_per_line() {
    let mut attachment = Attachment::new(AttachmentKind::Markdown, "说明.md");
    attachment.markdown_body = Some("第一行\n\n  第二行  \n".into());

    let mut builder = ready_builder();
    let start = builder.tree().len();
    merge_attachment(&mut builder, 1, &attachment).unwrap();
    let texts: Vec<String> = common::paragraphs(section(&builder, start))
        .iter()
        .map(|p| p.text())
        .collect();
    assert_eq!(texts, vec!["附件1", "", "说明.md", "", "第一行", "第二行"]);
}

#[test]
fn word_text_without_bytes_marks_heading_lines() {
    let mut attachment = Attachment::new(AttachmentKind::Word, "材料.docx");
    attachment.extracted_title = Some("工作总结".into());
    attachment.markdown_body =
        Some("一、基本情况\n今年以来，各项工作稳步推进。\n\n| 项目 | 金额 |\n| --- | --- |\n| 甲 | 10 |".into());

    let mut builder = ready_builder();
    let start = builder.tree().len();
    let outcome = merge_attachment(&mut builder, 1, &attachment).unwrap();
    assert_eq!(outcome, MergeOutcome::Rendered);

    let added = section(&builder, start);
    let paras = common::paragraphs(added);
    let heading = paras.iter().find(|p| p.text() == "一、基本情况").unwrap();
    assert_eq!(heading.style.as_deref(), Some(styles::ATTACHMENT_BODY));
    let running = paras
        .iter()
        .find(|p| p.text() == "今年以来，各项工作稳步推进。")
        .unwrap();
    assert_eq!(running.style.as_deref(), Some(styles::BODY));
    assert!(added.iter().any(|e| matches!(e, Element::Table(_))));
}

#[test]
fn heading_line_heuristic() {
    assert!(is_heading_line("第三章 总则"));
    assert!(is_heading_line("（二）工作目标"));
    assert!(is_heading_line("3.实施步骤"));
    assert!(is_heading_line("附表说明"));
    assert!(!is_heading_line("今年以来，全市上下认真贯彻落实各项部署要求。"));
}

#[test]
fn markdown_table_skips_mismatched_rows() {
    let (header, rows) =
        parse_markdown_table("| a | b |\n|:---|---:|\n| 1 | 2 |\n| 3 |\n| | 4 |").unwrap();
    assert_eq!(header, vec!["a", "b"]);
    assert_eq!(rows, vec![vec!["1", "2"], vec!["", "4"]]);
    assert!(parse_markdown_table("no table here").is_none());
}

fn cell(text: &str) -> TableCell {
    TableCell::new(vec![Paragraph {
        runs: vec![gbdoc::model::Run::text(text)],
        ..Paragraph::default()
    }])
}

#[test]
fn orphan_vertical_continuation_is_dropped() {
    let mut orphan = cell("");
    orphan.v_merge = VMerge::Continue;
    let mut start = cell("起");
    start.v_merge = VMerge::Restart;
    let mut cont = cell("");
    cont.v_merge = VMerge::Continue;

    let table = Table {
        col_widths: vec![72.0, 72.0],
        rows: vec![
            TableRow::new(vec![orphan, start]),
            TableRow::new(vec![cell("a"), cont]),
        ],
        bordered: true,
    };
    let rebuilt = rebuild_table(&table, &StyleRegistry::standard(), 400.0).unwrap().unwrap();
    assert_eq!(rebuilt.rows[0].cells[0].v_merge, VMerge::None);
    assert_eq!(rebuilt.rows[1].cells[1].v_merge, VMerge::Continue);
    assert_eq!(rebuilt.col_widths, vec![72.0, 72.0]);
}

/// Two-column grid whose second row skips the first column.
fn grid_before_docx() -> Vec<u8> {
    let short_row = format!(
        "<w:tr><w:trPr><w:gridBefore w:val=\"1\"/></w:trPr>{}</w:tr>",
        common::tc("乙", 1)
    );
    let table = common::tbl(
        2,
        &[common::tr(&[common::tc("单位", 1), common::tc("人数", 1)]), short_row],
    );
    common::docx(&table)
}

#[test]
fn skipped_leading_columns_count_toward_row_width() {
    let source = SourceDocument::from_bytes(&grid_before_docx()).unwrap();
    let table = source.tables().next().unwrap();
    assert_eq!(table.rows[1].grid_before, 1);
    assert_eq!(table.rows[1].grid_width(), 2);
    assert!(!gbdoc::table::has_complex_tables(&source));

    let mut builder = ready_builder();
    let outcome = merge_attachment(&mut builder, 1, &word("g.docx", grid_before_docx())).unwrap();
    assert_eq!(outcome, MergeOutcome::Spliced);
}

#[test]
fn reconstruction_keeps_cells_under_their_columns() {
    let source = SourceDocument::from_bytes(&grid_before_docx()).unwrap();
    let elements = merge::reconstruct(&source, &StyleRegistry::standard(), 400.0).unwrap();
    let table = elements
        .iter()
        .find_map(|e| match e {
            Element::Table(t) => Some(t),
            _ => None,
        })
        .expect("table rebuilt");
    let second: Vec<String> = table.rows[1].cells.iter().map(TableCell::text).collect();
    assert_eq!(second, vec!["", "乙"]);
    assert_eq!(table.rows[1].grid_before, 0);
    assert_eq!(table.rows[1].grid_width(), 2);
}

#[test]
fn vertical_continuation_after_skipped_column_is_kept() {
    let mut start = cell("起");
    start.v_merge = VMerge::Restart;
    let mut cont = cell("");
    cont.v_merge = VMerge::Continue;
    let mut short_row = TableRow::new(vec![cont]);
    short_row.grid_before = 1;

    let table = Table {
        col_widths: vec![72.0, 72.0],
        rows: vec![TableRow::new(vec![cell("a"), start]), short_row],
        bordered: true,
    };
    let rebuilt = rebuild_table(&table, &StyleRegistry::standard(), 400.0).unwrap().unwrap();
    assert_eq!(rebuilt.rows[1].cells.len(), 2);
    assert!(rebuilt.rows[1].cells[0].text().is_empty());
    assert_eq!(rebuilt.rows[1].cells[1].v_merge, VMerge::Continue);
}

#[test]
fn missing_column_widths_are_filled() {
    let table = Table {
        col_widths: Vec::new(),
        rows: vec![TableRow::new(vec![cell("a"), cell("b")])],
        bordered: false,
    };
    let rebuilt = rebuild_table(&table, &StyleRegistry::standard(), 400.0).unwrap().unwrap();
    assert_eq!(rebuilt.col_widths, vec![200.0, 200.0]);
}

#[test]
fn oversized_table_fails_reconstruction() {
    let row = TableRow::new((0..64).map(|i| cell(&i.to_string())).collect());
    let table = Table { col_widths: Vec::new(), rows: vec![row], bordered: false };
    let err = rebuild_table(&table, &StyleRegistry::standard(), 400.0).unwrap_err();
    assert!(matches!(err, Error::Reconstruct(_)));
}

#[test]
fn empty_table_is_dropped() {
    let table = Table { col_widths: Vec::new(), rows: Vec::new(), bordered: false };
    assert!(rebuild_table(&table, &StyleRegistry::standard(), 400.0).unwrap().is_none());
}

#[test]
fn plain_text_keeps_only_paragraph_text() {
    let source = SourceDocument::from_bytes(&merged_table_docx()).unwrap();
    let elements = merge::plain_text(&source, &StyleRegistry::standard()).unwrap();
    let texts: Vec<String> = common::paragraphs(&elements).iter().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["统计表"]);
}
