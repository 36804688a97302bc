//! Heuristic recovery of an attachment's real title from its first
//! paragraphs.
//!
//! The keyword lists and score thresholds below are tuned against real
//! government documents and are kept exactly as they are.

use std::sync::LazyLock;

use regex::Regex;

use crate::docx::SourceDocument;

/// Number of leading paragraphs inspected.
const SCAN_PARAGRAPHS: usize = 15;
/// Paragraphs after a title start that may continue it.
const MAX_CONTINUATIONS: usize = 4;
const MAX_CONTINUATION_CHARS: usize = 50;
const MIN_TITLE_CHARS: usize = 5;
const MAX_TITLE_CHARS: usize = 150;
const ACCEPT_SCORE: u32 = 3;

const TITLE_KEYWORDS: &[&str] = &[
    "统计表", "清单", "名单", "汇总表", "汇总清单", "统计", "汇总", "分布情况", "考核统计",
    "代表名单", "参会代表", "绩效考核", "年度统计", "通知", "函", "意见", "决定", "批复", "指示",
    "要求", "部署", "关于", "省教育厅", "市政府", "区政府", "教办", "政办", "办法", "规定", "制度",
    "方案", "细则", "标准", "规范", "程序", "管理办法", "实施办法", "工作方案", "实施方案", "试行",
    "合同", "协议", "服务合同", "技术服务", "采购合同", "编号", "报告", "情况", "工作", "实施",
    "管理", "企业", "公司", "评选", "评审", "总结", "计划", "安排", "部署", "要点", "措施", "建议",
    "意见", "全国文化企业", "30强", "成长性", "分布", "届",
];

const SPECIAL_KEYWORDS: &[&str] = &[
    "全国文化企业",
    "30强",
    "成长性",
    "分布情况",
    "名单",
    "第十六届",
    "全国成长性文化企业",
    "名单及分布情况",
];

const BAD_ENDINGS: &[char] = &['。', '！', '？', '：', '；', '，', '、'];

/// Openings that mark running text rather than a title.
const CONTENT_OPENINGS: &[&str] = &[
    "根据", "按照", "为了", "现将", "现印发", "请", "各单位", "各部门", "认真", "贯彻", "执行",
    "落实", "具体如下", "现就", "经研究", "决定", "同意", "批准",
];

/// The shorter opening list used when deciding whether a line continues a
/// title.
const CONTINUATION_BLOCKERS: &[&str] = &[
    "根据", "按照", "为了", "现将", "现印发", "请", "各单位", "各部门", "认真", "贯彻", "执行",
    "落实",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid title pattern"))
        .collect()
}

static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"第[一二三四五六七八九十\d]+届",
        r"关于.*的.*",
        r".*情况.*",
        r".*报告.*",
        r".*通知.*",
        r".*办法.*",
        r".*方案.*",
        r".*制度.*",
        r".*规定.*",
        r".*名单.*",
        r".*统计.*",
        r".*清单.*",
        r".*合同.*",
        r".*协议.*",
        r".*〔\d+〕\d+号",
        r".*（试行）",
        r".*（编号.*）",
        r#".*".*".*"#,
        r".*年度.*",
        r".*工作.*",
        r".*企业.*强.*",
    ])
});

static START_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^关于.*",
        r"^.*通知$",
        r"^.*办法$",
        r"^.*方案$",
        r"^.*规定$",
        r"^.*制度$",
        r"^.*报告$",
        r"^.*情况$",
        r"^.*统计.*",
        r"^.*名单.*",
        r"^.*清单.*",
        r"^第.*届.*",
        r"^.*30强.*",
        r"^.*全国文化企业.*",
    ])
});

static CONTINUATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^有关.*的.*",
        r"^.*的通知$",
        r"^.*的办法$",
        r"^.*的方案$",
        r"^.*的规定$",
        r"^.*事项.*",
        r"^.*工作.*",
        r"^.*名单.*",
        r"^.*情况.*",
        r"^.*及分布情况$",
        r"^.*30强.*",
        r"^.*全国成长性.*",
    ])
});

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| text.starts_with(p))
}

/// Title-likeness score. Length bounds are not applied here.
pub fn score(text: &str) -> u32 {
    let has_keyword = TITLE_KEYWORDS.iter().any(|k| text.contains(k));
    let has_pattern = TITLE_PATTERNS.iter().any(|re| re.is_match(text));

    let mut score = 0;
    if has_keyword {
        score += 2;
    }
    if has_pattern {
        score += 2;
    }
    if !text.ends_with(BAD_ENDINGS) {
        score += 1;
    }
    if !starts_with_any(text, CONTENT_OPENINGS) {
        score += 1;
    }
    if SPECIAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        score += 3;
    }
    if text.chars().count() > 30 && has_keyword && has_pattern {
        score += 2;
    }
    score
}

pub fn is_likely_title(text: &str) -> bool {
    let len = text.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
        return false;
    }
    score(text) >= ACCEPT_SCORE
}

pub fn is_title_start(text: &str) -> bool {
    START_PATTERNS.iter().any(|re| re.is_match(text))
}

pub fn is_title_continuation(text: &str) -> bool {
    CONTINUATION_PATTERNS.iter().any(|re| re.is_match(text))
        && text.chars().count() <= MAX_CONTINUATION_CHARS
        && !starts_with_any(text, CONTINUATION_BLOCKERS)
}

/// File name without its last extension.
pub fn filename_stem(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
}

/// Pick a title from paragraph texts, falling back to the file name stem.
///
/// Each title start among the first 15 paragraphs (blanks skipped) is joined with
/// up to four continuation lines; the first such combination that reads as
/// a title wins. Failing that, the first single paragraph that reads as a
/// title is used.
pub fn extract_title<S: AsRef<str>>(paragraphs: &[S], filename: &str) -> String {
    let candidates: Vec<&str> = paragraphs
        .iter()
        .take(SCAN_PARAGRAPHS)
        .map(|p| p.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect();

    for (i, start) in candidates.iter().enumerate() {
        if !is_title_start(start) {
            continue;
        }
        let mut combined = start.to_string();
        for next in candidates.iter().skip(i + 1).take(MAX_CONTINUATIONS) {
            if !is_title_continuation(next) {
                break;
            }
            combined.push_str(next);
        }
        if is_likely_title(&combined) {
            log::debug!("combined title from paragraph {i}: {combined}");
            return combined;
        }
    }

    if let Some(single) = candidates.iter().find(|t| is_likely_title(t)) {
        log::debug!("single-paragraph title: {single}");
        return single.to_string();
    }

    let stem = filename_stem(filename);
    log::debug!("no title found in content, using file name: {stem}");
    stem.to_string()
}

pub fn extract_from_docx(source: &SourceDocument, filename: &str) -> String {
    extract_title(&source.paragraph_texts(), filename)
}

/// Title found in the document's content, or `None` when extraction only
/// fell back to the file name.
pub fn recovered_title(source: &SourceDocument, filename: &str) -> Option<String> {
    let extracted = extract_from_docx(source, filename);
    (extracted != filename_stem(filename)).then_some(extracted)
}
