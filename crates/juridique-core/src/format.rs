//! Presentation passes over assistant replies.
//!
//! Everything here is pure: the stored message text is never touched, the
//! output is a list of typed blocks and spans that a front-end styles however
//! it likes.

use std::sync::OnceLock;

use regex::Regex;

const LINK_OPEN: char = '\u{E000}';
const LINK_CLOSE: char = '\u{E001}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Plain,
    /// Text that was wrapped in `**` in the reply
    Strong,
    /// A law, decree or article citation
    LegalReference,
    /// A hyperlink, kept exactly as it appeared
    Link { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub kind: SpanKind,
    pub text: String,
}

impl TextSpan {
    fn new(kind: SpanKind, text: &str) -> Self {
        Self { kind, text: text.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `1. Titre`
    Heading,
    /// `* item`, marker removed
    Bullet,
    Recommendation,
    Paragraph,
    Blank,
}

/// One line of a reply after formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub spans: Vec<TextSpan>,
}

impl Block {
    /// Concatenated span text
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

fn legal_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            \b
            (?:
                (?i:article|loi|décret)
                | الفصل | فصل
                | القانون | قانون
                | الأمر | أمر
                | المرسوم | مرسوم
            )
            \s+
            \d[\d-]*",
        )
        .expect("legal reference pattern is valid")
    })
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\[[^\]\n]*\]\([^)\s]+\)|(?i:<a\s[^>]*>.*?</a>)|https?://[^\s<>\[\]()]+",
        )
        .expect("link pattern is valid")
    })
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*["']([^"']*)["']"#).expect("href pattern is valid")
    })
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\u{E000}(\\d+)\u{E001}").expect("placeholder pattern is valid"))
}

fn strong_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("strong pattern is valid"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\.\s").expect("heading pattern is valid"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\*\s+").expect("bullet pattern is valid"))
}

fn recommendation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:recommandations?\s*:|nous vous recommandons|توصية|توصيات|ننصح)")
            .expect("recommendation pattern is valid")
    })
}

fn source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Document \d+\s*\(([^,]+),\s*score: [\d.]+\)").expect("source pattern is valid")
    })
}

/// Format a full assistant reply into blocks, one per line.
pub fn format_reply(content: &str) -> Vec<Block> {
    content.lines().map(format_line).collect()
}

/// Non-assistant messages: one plain paragraph per line, no highlighting.
pub fn plain_blocks(content: &str) -> Vec<Block> {
    content
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                Block { kind: BlockKind::Blank, spans: Vec::new() }
            } else {
                Block {
                    kind: BlockKind::Paragraph,
                    spans: vec![TextSpan::new(SpanKind::Plain, line)],
                }
            }
        })
        .collect()
}

fn format_line(line: &str) -> Block {
    if line.trim().is_empty() {
        return Block { kind: BlockKind::Blank, spans: Vec::new() };
    }

    if heading_re().is_match(line) {
        return Block { kind: BlockKind::Heading, spans: highlight_legal_references(line.trim_start()) };
    }

    if let Some(marker) = bullet_re().find(line) {
        return Block { kind: BlockKind::Bullet, spans: highlight_legal_references(&line[marker.end()..]) };
    }

    let kind = if recommendation_re().is_match(line) {
        BlockKind::Recommendation
    } else {
        BlockKind::Paragraph
    };
    Block { kind, spans: highlight_legal_references(line) }
}

/// Split text into spans with legal citations marked.
///
/// Hyperlinks are swapped out for placeholders before any pattern runs and
/// put back verbatim afterwards, so link markup is never rewritten.
pub fn highlight_legal_references(text: &str) -> Vec<TextSpan> {
    let (protected, links) = protect_links(text);

    let mut spans = Vec::new();
    let mut last = 0;
    for strong in strong_re().captures_iter(&protected) {
        let (Some(whole), Some(inner)) = (strong.get(0), strong.get(1)) else {
            continue;
        };
        push_highlighted(&mut spans, &protected[last..whole.start()], SpanKind::Plain);
        push_highlighted(&mut spans, inner.as_str(), SpanKind::Strong);
        last = whole.end();
    }
    push_highlighted(&mut spans, &protected[last..], SpanKind::Plain);

    restore_links(spans, &links)
}

fn push_highlighted(spans: &mut Vec<TextSpan>, text: &str, base: SpanKind) {
    let mut last = 0;
    for m in legal_reference_re().find_iter(text) {
        if m.start() > last {
            spans.push(TextSpan::new(base.clone(), &text[last..m.start()]));
        }
        spans.push(TextSpan::new(SpanKind::LegalReference, m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(TextSpan::new(base, &text[last..]));
    }
}

/// Replace each hyperlink with a numbered placeholder.
fn protect_links(text: &str) -> (String, Vec<String>) {
    let mut links = Vec::new();
    let protected = link_re().replace_all(text, |caps: &regex::Captures| {
        let index = links.len();
        links.push(caps[0].to_string());
        format!("{}{}{}", LINK_OPEN, index, LINK_CLOSE)
    });
    (protected.into_owned(), links)
}

fn restore_links(spans: Vec<TextSpan>, links: &[String]) -> Vec<TextSpan> {
    if links.is_empty() {
        return spans;
    }

    let mut restored = Vec::new();
    for span in spans {
        if matches!(span.kind, SpanKind::LegalReference) {
            restored.push(span);
            continue;
        }

        let mut last = 0;
        for caps in placeholder_re().captures_iter(&span.text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(link) = caps[1].parse::<usize>().ok().and_then(|i| links.get(i)) else {
                continue;
            };
            if whole.start() > last {
                restored.push(TextSpan::new(span.kind.clone(), &span.text[last..whole.start()]));
            }
            restored.push(TextSpan::new(SpanKind::Link { target: link_target(link) }, link));
            last = whole.end();
        }
        if last < span.text.len() {
            restored.push(TextSpan::new(span.kind.clone(), &span.text[last..]));
        }
    }
    restored
}

fn link_target(markup: &str) -> String {
    if markup.starts_with('[') {
        if let Some(open) = markup.rfind("](") {
            return markup[open + 2..markup.len() - 1].to_string();
        }
    }
    if markup.starts_with('<') {
        if let Some(caps) = href_re().captures(markup) {
            return caps[1].to_string();
        }
    }
    markup.to_string()
}

/// Labels of the `Document <n> (<label>, score: <x>)` citations in a reply.
pub fn extract_sources(text: &str) -> Vec<String> {
    source_re()
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}
