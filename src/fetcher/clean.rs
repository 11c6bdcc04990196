/// HTML-to-text cleaning and title extraction.
///
/// Payloads that look like markup get their title from document metadata and
/// their text stripped of tags. Anything else is kept verbatim and titled
/// after the last segment of its URL.
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::Page;

static NON_CONTENT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>",
    )
    .unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static ANY_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

/// Whether `raw` should be treated as HTML.
pub fn looks_like_markup(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.contains("<html") || lower.contains("<head") || lower.contains("<body")
}

/// Build a [`Page`] from a raw response body.
pub fn page_from_raw(url: &str, raw: &str) -> Page {
    if looks_like_markup(raw) {
        let (title, content) = clean(raw);
        Page {
            url: url.to_string(),
            title: title.unwrap_or_else(|| title_from_url(url)),
            content,
        }
    } else {
        Page {
            url: url.to_string(),
            title: title_from_url(url),
            content: raw.to_string(),
        }
    }
}

/// Extract `(title, text)` from an HTML document.
pub fn clean(raw_html: &str) -> (Option<String>, String) {
    (extract_title(raw_html), html_to_text(raw_html))
}

/// Title lookup order: `<title>`, Open Graph title, first `<h1>`.
pub fn extract_title(raw_html: &str) -> Option<String> {
    let doc = Html::parse_document(raw_html);

    let from_title = doc
        .select(&TITLE)
        .next()
        .map(|e| e.text().collect::<String>());
    let from_og = || {
        doc.select(&OG_TITLE)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(str::to_string)
    };
    let from_h1 = || {
        doc.select(&H1)
            .next()
            .map(|e| e.text().collect::<Vec<_>>().join(" "))
    };

    normalize_title(from_title)
        .or_else(|| normalize_title(from_og()))
        .or_else(|| normalize_title(from_h1()))
}

fn normalize_title(candidate: Option<String>) -> Option<String> {
    let text = candidate?;
    let collapsed = ANY_SPACE.replace_all(text.trim(), " ");
    (!collapsed.is_empty()).then(|| collapsed.into_owned())
}

/// Strip scripts, styles and tags, unescape entities, drop blank lines.
pub fn html_to_text(raw_html: &str) -> String {
    let stripped = NON_CONTENT_BLOCK.replace_all(raw_html, "");
    let stripped = TAG.replace_all(&stripped, " ");
    let unescaped = html_escape::decode_html_entities(&stripped);

    unescaped
        .lines()
        .map(|line| INLINE_SPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text after the last `/` of `url`, or `url` itself when that is empty.
///
/// Query strings are kept, and a trailing slash yields the whole URL.
pub fn title_from_url(url: &str) -> String {
    match url.rsplit('/').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_tag_wins() {
        let html = r#"<html><head><title>Foo</title>
            <meta property="og:title" content="Bar"></head>
            <body><h1>Baz</h1><p>Body text</p></body></html>"#;
        let page = page_from_raw("https://x/foo.html", html);
        assert_eq!(page.title, "Foo");
        assert!(page.content.contains("Body text"));
    }

    #[test]
    fn test_og_title_fallback() {
        let html = r#"<html><head><meta property="og:title" content="Open &amp; Graph"></head>
            <body><h1>Heading</h1></body></html>"#;
        assert_eq!(extract_title(html).as_deref(), Some("Open & Graph"));
    }

    #[test]
    fn test_h1_fallback_strips_nested_tags() {
        let html = "<html><body><h1>Getting <em>started</em></h1></body></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Getting started"));
    }

    #[test]
    fn test_empty_title_tag_is_skipped() {
        let html = "<html><head><title>  </title></head><body><h1>Real</h1></body></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Real"));
    }

    #[test]
    fn test_markup_without_title_uses_url() {
        let html = "<body><p>no headings here</p></body>";
        let page = page_from_raw("https://x/guide/setup.html", html);
        assert_eq!(page.title, "setup.html");
        assert_eq!(page.content, "no headings here");
    }

    #[test]
    fn test_plain_text_title_from_url() {
        let page = page_from_raw("https://x/raw.txt", "# Raw\n\nplain <b>not markup</b>");
        assert_eq!(page.title, "raw.txt");
        assert_eq!(page.content, "# Raw\n\nplain <b>not markup</b>");
    }

    #[test]
    fn test_markup_detection_is_case_insensitive() {
        assert!(looks_like_markup("<!DOCTYPE html><HTML></HTML>"));
        assert!(looks_like_markup("<Body>x</Body>"));
        assert!(!looks_like_markup("just <b>bold</b> text"));
    }

    #[test]
    fn test_html_to_text_drops_scripts_and_blank_lines() {
        let html = "<html><head><style>p { color: red; }</style>\n\
                    <script type=\"text/javascript\">var x = '<p>';</script></head>\n\
                    <body>\n\n<p>First   line</p>\n<noscript>enable js</noscript>\n\
                    <p>Fish &amp; chips &lt;3</p>\n</body></html>";
        let text = html_to_text(html);
        assert_eq!(text, "First line\nFish & chips <3");
    }

    #[test]
    fn test_title_from_url_variants() {
        assert_eq!(title_from_url("https://x/raw.txt"), "raw.txt");
        assert_eq!(title_from_url("https://x/docs/"), "https://x/docs/");
        assert_eq!(title_from_url("https://x/a.md?ref=1"), "a.md?ref=1");
        assert_eq!(title_from_url("https://example.com/"), "https://example.com/");
        assert_eq!(title_from_url("not a url/page"), "page");
    }
}
