mod common;

use gbdoc::builder::{BuilderState, chinese_numeral, header1_marker, header2_marker, wrap_title};
use gbdoc::classify::classify;
use gbdoc::model::{Alignment, Attachment, AttachmentKind, Element};
use gbdoc::styles;
use gbdoc::{AssembleOptions, DocumentBuilder, Error};

fn builder_with_body(body: &str) -> DocumentBuilder {
    let mut builder = DocumentBuilder::new(AssembleOptions::default());
    builder.add_title("关于开展专项检查的通知").unwrap();
    builder.add_body(&classify(body)).unwrap();
    builder
}

fn named(name: &str) -> Attachment {
    Attachment::new(AttachmentKind::Text, name)
}

#[test]
fn numerals_fall_back_to_arabic_after_twenty() {
    assert_eq!(chinese_numeral(1), "一");
    assert_eq!(chinese_numeral(20), "二十");
    assert_eq!(chinese_numeral(21), "21");
    assert_eq!(header1_marker(11), "十一、");
    assert_eq!(header2_marker(3), "（三）");
    assert_eq!(header2_marker(25), "（25）");
}

#[test]
fn level_one_heading_restarts_lower_levels() {
    let builder = builder_with_body(
        "一、总体要求\n（一）指导思想\n（二）基本原则\n1. 坚持统筹。\n二、主要任务\n（一）完善制度\n1. 建立台账。",
    );
    let texts = common::tree_texts(builder.tree());
    let body: Vec<&str> = texts.iter().skip(2).map(String::as_str).collect();
    assert_eq!(
        body,
        vec![
            "一、总体要求",
            "（一）指导思想",
            "（二）基本原则",
            "1.坚持统筹。",
            "二、主要任务",
            "（一）完善制度",
            "1.建立台账。",
        ]
    );
}

#[test]
fn level_two_heading_restarts_level_three() {
    let builder = builder_with_body("（一）甲\n1. 子项。\n2. 子项。\n（二）乙\n1. 子项。");
    let texts = common::tree_texts(builder.tree());
    assert_eq!(texts[2..], ["（一）甲", "1.子项。", "2.子项。", "（二）乙", "1.子项。"]);
}

#[test]
fn headings_use_their_styles() {
    let builder = builder_with_body("一、标题\n（一）小标题\n1. 条目。\n正文");
    let styles_used: Vec<Option<&str>> = builder
        .tree()
        .paragraphs()
        .skip(2)
        .map(|p| p.style.as_deref())
        .collect();
    assert_eq!(
        styles_used,
        vec![
            Some(styles::HEADING1),
            Some(styles::HEADING2),
            Some(styles::HEADING3),
            Some(styles::BODY),
        ]
    );
}

#[test]
fn short_title_is_not_wrapped() {
    assert_eq!(wrap_title("关于开展检查的通知", 20), vec!["关于开展检查的通知"]);
}

#[test]
fn long_title_splits_after_connective_near_midpoint() {
    let title = "全省教育系统安全生产工作的实施意见暨分工方案通知书";
    assert_eq!(title.chars().count(), 25);
    assert_eq!(title.chars().nth(12), Some('的'));
    assert_eq!(
        wrap_title(title, 20),
        vec!["全省教育系统安全生产工作的", "实施意见暨分工方案通知书"]
    );
}

#[test]
fn long_title_without_connective_splits_at_midpoint() {
    let title = "一二三四五六七八九十百千万亿甲乙丙丁戊己庚辛";
    let lines = wrap_title(title, 20);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].chars().count(), 11);
    assert_eq!(lines.concat(), title);
}

#[test]
fn long_title_splits_after_two_char_connective() {
    let title = "一二三四五六七八关于九十百千万亿甲乙丙丁戊己庚";
    assert_eq!(title.chars().count(), 23);
    assert_eq!(
        wrap_title(title, 20),
        vec!["一二三四五六七八关于", "九十百千万亿甲乙丙丁戊己庚"]
    );
}

#[test]
fn wrapped_title_is_one_paragraph_with_a_line_break() {
    let mut builder = DocumentBuilder::new(AssembleOptions::default());
    builder
        .add_title("全省教育系统安全生产工作的实施意见暨分工方案通知书")
        .unwrap();
    let titles: Vec<_> = builder.tree().paragraphs().collect();
    assert_eq!(titles.len(), 2);
    assert_eq!(
        titles[0].text(),
        "全省教育系统安全生产工作的\n实施意见暨分工方案通知书"
    );
    assert_eq!(titles[0].style.as_deref(), Some(styles::TITLE));
    assert!(titles[1].is_blank());
}

#[test]
fn single_reference_is_one_line() {
    let mut builder = builder_with_body("正文");
    builder.add_references(&[named("年度报告")]).unwrap();
    let texts = common::tree_texts(builder.tree());
    assert_eq!(texts.last().map(String::as_str), Some("附件：附件1、年度报告"));
}

#[test]
fn several_references_are_listed_with_deeper_indent() {
    let mut builder = builder_with_body("正文");
    let mut second = named("b.xlsx");
    second.title = "经费预算表".into();
    let mut third = named("c.docx");
    third.extracted_title = Some("关于经费使用的说明".into());
    third.title = "c".into();
    builder
        .add_references(&[named("人员名单"), second, third])
        .unwrap();

    let paras: Vec<_> = builder.tree().paragraphs().collect();
    let tail = &paras[paras.len() - 4..];
    let texts: Vec<String> = tail.iter().map(|p| p.text()).collect();
    assert_eq!(
        texts,
        vec![
            "附件：",
            "附件1、人员名单",
            "附件2、经费预算表",
            "附件3、关于经费使用的说明",
        ]
    );
    let options = AssembleOptions::default();
    assert_eq!(tail[0].indent_first_line, Some(options.reference_indent_pt));
    assert_eq!(tail[1].indent_first_line, Some(options.reference_item_indent_pt));
    assert!(tail[1].runs[0].bold);
    assert!(!tail[1].runs[1].bold);
}

#[test]
fn display_title_falls_back_to_ordinal() {
    let attachment = Attachment::new(AttachmentKind::Csv, "  ");
    assert_eq!(attachment.display_title(2), "附件2");
}

#[test]
fn signature_is_right_aligned_after_two_blank_lines() {
    let mut builder = builder_with_body("正文");
    builder.add_signature("市教育局", "2025年7月11日").unwrap();
    let paras: Vec<_> = builder.tree().paragraphs().collect();
    let tail = &paras[paras.len() - 4..];
    assert!(tail[0].is_blank() && tail[1].is_blank());
    assert_eq!(tail[2].text(), "市教育局");
    assert_eq!(tail[3].text(), "2025年7月11日");
    assert_eq!(tail[2].alignment, Some(Alignment::Right));
    assert_eq!(tail[3].alignment, Some(Alignment::Right));
}

#[test]
fn attachment_section_starts_with_page_break_and_label() {
    let mut builder = builder_with_body("正文");
    builder.add_signature("部门", "日期").unwrap();
    let before = builder.tree().len();
    builder.begin_attachment(1).unwrap();

    let added = &builder.tree().elements()[before..];
    assert_eq!(added.len(), 3);
    assert!(matches!(added[0], Element::PageBreak));
    let Element::Paragraph(label) = &added[1] else {
        panic!("expected label paragraph");
    };
    assert_eq!(label.text(), "附件1");
    assert_eq!(label.style.as_deref(), Some(styles::ATTACHMENT_TITLE));
    assert_eq!(builder.state(), BuilderState::AttachmentsAdded);
}

#[test]
fn body_before_title_is_rejected() {
    let mut builder = DocumentBuilder::new(AssembleOptions::default());
    let err = builder.add_body(&classify("正文")).unwrap_err();
    assert!(matches!(err, Error::BuilderState { .. }));
    assert!(err.is_fatal());
}

#[test]
fn title_twice_is_rejected() {
    let mut builder = DocumentBuilder::new(AssembleOptions::default());
    builder.add_title("标题").unwrap();
    assert!(matches!(
        builder.add_title("标题"),
        Err(Error::BuilderState { .. })
    ));
}

#[test]
fn attachment_before_signature_is_rejected() {
    let mut builder = builder_with_body("正文");
    assert!(matches!(
        builder.begin_attachment(1),
        Err(Error::BuilderState { .. })
    ));
}

#[test]
fn attachments_must_be_consecutive() {
    let mut builder = builder_with_body("正文");
    builder.add_signature("部门", "日期").unwrap();
    assert!(builder.begin_attachment(2).is_err());
    builder.begin_attachment(1).unwrap();
    assert!(builder.begin_attachment(3).is_err());
    builder.begin_attachment(2).unwrap();
    assert_eq!(builder.attachment_count(), 2);
}

#[test]
fn finish_consumes_tree_and_finalizes() {
    let mut builder = builder_with_body("正文");
    builder.add_signature("部门", "日期").unwrap();
    let tree = builder.finish().unwrap();
    assert!(!tree.is_empty());
    assert_eq!(builder.state(), BuilderState::Finalized);
    assert!(builder.finish().is_err());
    assert!(builder.append(Vec::new()).is_err());
}
