use once_cell::sync::Lazy;
use regex::Regex;

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

static HEADING: Lazy<Regex> = Lazy::new(|| compile_regex(r"^ {0,3}(#{1,6})(?:[ \t]+(.*))?$"));
static CLOSING_HASHES: Lazy<Regex> = Lazy::new(|| compile_regex(r"(?:^|[ \t]+)#+[ \t]*$"));
static FENCE: Lazy<Regex> = Lazy::new(|| compile_regex(r"^ {0,3}(`{3,}|~{3,})"));
static BLOCK_PREFIX: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^\s*(?:>\s*)*(?:[-*+][ \t]+|\d+[.)][ \t]+)?"));
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| compile_regex(r"``(.+?)``|`([^`]+)`"));
static LINK: Lazy<Regex> = Lazy::new(|| compile_regex(r"!?\[([^\]]*)\]\([^)]*\)"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| compile_regex(r"</?[A-Za-z][^>]*>"));
static STARS: Lazy<Regex> = Lazy::new(|| compile_regex(r"\*+"));
// Underscores not inside a word ("_em_" but not "snake_case")
static UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"(^|[^\p{L}\p{N}])_+|_+([^\p{L}\p{N}]|$)"));

/// Parse an ATX heading line (e.g. "## Setup") into (level, text)
/// Returns None for anything that is not a heading, including "#foo" and "#######"
pub fn parse_heading(line: &str) -> Option<(usize, String)> {
    let caps = HEADING.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2).map_or("", |m| m.as_str()).trim();
    // Drop an optional closing sequence ("## Setup ##")
    let text = CLOSING_HASHES.replace(text, "");
    Some((level, strip_inline(text.trim())))
}

/// Opening or closing code fence marker: (fence char, run length)
pub fn fence_marker(line: &str) -> Option<(char, usize)> {
    let run = FENCE.captures(line)?.get(1)?.as_str();
    Some((run.chars().next()?, run.len()))
}

/// Turn heading text into a URL-safe anchor ("Getting Started!" -> "getting-started")
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Strip block-level prefixes (quotes, list bullets) and inline markup from one line
pub fn strip_line(line: &str) -> String {
    let prefix = BLOCK_PREFIX.find(line).map_or(0, |m| m.end());
    strip_inline(&line[prefix..])
}

/// Remove emphasis and HTML tags, reduce links and images to their text
/// Inline code keeps its contents verbatim, only the backticks go
pub fn strip_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in CODE_SPAN.captures_iter(text) {
        let Some(span) = caps.get(0) else { continue };
        out.push_str(&strip_markup(&text[last..span.start()]));
        if let Some(code) = caps.get(1).or_else(|| caps.get(2)) {
            out.push_str(code.as_str());
        }
        last = span.end();
    }
    out.push_str(&strip_markup(&text[last..]));
    out
}

fn strip_markup(text: &str) -> String {
    let text = LINK.replace_all(text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    let text = STARS.replace_all(&text, "");
    UNDERSCORES.replace_all(&text, "${1}${2}").into_owned()
}

/// Tokenize text into terms for indexing (lowercase alphanumeric runs)
/// Words shorter than two characters are dropped; numbers are always kept
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .filter(|s| s.chars().nth(1).is_some() || s.chars().all(|c| c.is_numeric()))
        .map(str::to_lowercase)
        .collect()
}

/// Parse query into distinct terms, keeping first-seen order
pub fn parse_query(query: &str) -> Vec<String> {
    let mut terms = tokenize(query);
    let mut seen = std::collections::HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
    terms
}
