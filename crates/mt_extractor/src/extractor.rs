use mt_core::{ExtractedArticle, ExtractionFailure};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, warn};

/// Elements whose text is never part of an article.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "header", "footer", "nav", "aside", "form", "figure",
    "figcaption", "iframe", "button", "input", "textarea", "select", "option", "img", "svg",
];

/// Class-based element signature: the element must carry every class in
/// `all` and, when `any` is non-empty, at least one class from `any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRule {
    pub all: Vec<String>,
    pub any: Vec<String>,
}

impl ClassRule {
    pub fn all_of(classes: &[&str]) -> Self {
        Self {
            all: classes.iter().map(|c| c.to_string()).collect(),
            any: Vec::new(),
        }
    }

    pub fn with_any_of(mut self, classes: &[&str]) -> Self {
        self.any = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn matches(&self, element: &scraper::node::Element) -> bool {
        let classes: Vec<&str> = element.classes().collect();
        self.all.iter().all(|c| classes.contains(&c.as_str()))
            && (self.any.is_empty() || self.any.iter().any(|c| classes.contains(&c.as_str())))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Text searched for (case-insensitively) in HTML comments to locate the
    /// start of the article body.
    pub anchor_marker: String,
    /// Styles identifying article paragraphs (`p` elements).
    pub paragraph_styles: Vec<ClassRule>,
    /// Styles identifying the headline (`h1` elements).
    pub headline_styles: Vec<ClassRule>,
    /// A `div` matching this rule ends the article region.
    pub stop_marker: Option<ClassRule>,
    /// Fallback paragraphs shorter than this are dropped as captions or bylines.
    pub min_paragraph_chars: usize,
    /// Assembled bodies shorter than this are rejected.
    pub min_article_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            anchor_marker: "article body".to_string(),
            paragraph_styles: vec![
                ClassRule::all_of(&["text-19px", "leading-loose", "text-faseyha"]),
                ClassRule::all_of(&["text-19px", "leading-loose", "max-w-3xl", "text-black-two"]),
            ],
            headline_styles: vec![
                ClassRule::all_of(&["text-waheed", "text-black-two"]),
                ClassRule::all_of(&["text-40px", "text-waheed"]),
            ],
            stop_marker: Some(ClassRule::all_of(&["hidden", "lg:block"]).with_any_of(&["ml-10", "m1-10"])),
            min_paragraph_chars: 40,
            min_article_chars: 50,
        }
    }
}

/// Isolates article text from a news page.
///
/// The body is found in layers: styled paragraphs after the body anchor
/// comment, then any sufficiently long paragraph in the same region. The
/// result only depends on the input document.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, raw_document: &str) -> Result<ExtractedArticle, ExtractionFailure> {
        let document = Html::parse_document(raw_document);
        if !document.errors.is_empty() {
            debug!("Document parsed with {} recoverable errors", document.errors.len());
        }

        let title = self.extract_title(&document);
        if title.is_none() {
            warn!("⚠️ Could not find a headline in the document");
        }

        let paragraphs = self.scoped_paragraphs(&document);

        let styled: Vec<String> = paragraphs
            .iter()
            .filter(|p| p.styled)
            .map(|p| p.text.clone())
            .collect();

        let selected = if !styled.is_empty() {
            debug!("Matched {} styled paragraphs", styled.len());
            styled
        } else {
            let fallback: Vec<String> = paragraphs
                .into_iter()
                .filter(|p| p.text.chars().count() >= self.config.min_paragraph_chars)
                .map(|p| p.text)
                .collect();
            debug!("No styled paragraphs, fallback kept {} paragraphs", fallback.len());
            fallback
        };

        if selected.is_empty() {
            return Err(ExtractionFailure::NoContentFound);
        }

        let body = selected.join("\n\n");
        let chars = body.chars().count();
        if chars < self.config.min_article_chars {
            return Err(ExtractionFailure::ContentTooShort {
                chars,
                min: self.config.min_article_chars,
            });
        }

        Ok(ExtractedArticle { title, body })
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        document
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| {
                el.value().name() == "h1"
                    && self.config.headline_styles.iter().any(|rule| rule.matches(el.value()))
            })
            .map(paragraph_text)
            .filter(|t| !t.is_empty())
    }

    /// Non-empty paragraphs of the article region in document order.
    ///
    /// The region starts after the anchor comment (or at the top of the
    /// document when there is none) and ends at the stop marker.
    fn scoped_paragraphs(&self, document: &Html) -> Vec<Paragraph> {
        let marker = self.config.anchor_marker.to_lowercase();
        let root = document.tree.root();

        let anchor = root
            .descendants()
            .find(|node| match node.value() {
                Node::Comment(comment) => comment.comment.to_lowercase().contains(&marker),
                _ => false,
            })
            .map(|node| node.id());
        if anchor.is_none() {
            debug!("No '{}' anchor, scanning the whole document", self.config.anchor_marker);
        }

        let mut in_scope = anchor.is_none();
        let mut paragraphs = Vec::new();

        for node in root.descendants() {
            if !in_scope {
                in_scope = Some(node.id()) == anchor;
                continue;
            }

            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let value = element.value();

            if value.name() == "div"
                && self.config.stop_marker.as_ref().map_or(false, |rule| rule.matches(value))
            {
                debug!("Reached stop marker, ending article region");
                break;
            }

            if value.name() != "p" || inside_boilerplate(element) {
                continue;
            }

            let text = paragraph_text(element);
            if text.is_empty() {
                continue;
            }
            paragraphs.push(Paragraph {
                styled: self.config.paragraph_styles.iter().any(|rule| rule.matches(value)),
                text,
            });
        }

        paragraphs
    }
}

struct Paragraph {
    text: String,
    styled: bool,
}

fn is_boilerplate(name: &str) -> bool {
    BOILERPLATE_TAGS.contains(&name)
}

fn inside_boilerplate(element: ElementRef) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map_or(false, |el| is_boilerplate(el.name()))
    })
}

/// Visible text of an element with markup removed: `<br>` becomes a line
/// break, whitespace runs collapse, blank lines are dropped.
fn paragraph_text(element: ElementRef) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(el) if is_boilerplate(el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_text(child, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: &str = "ރައީސުލްޖުމްހޫރިއްޔާ މިއަދު ވަނީ ސަރުކާރުގެ އާ ސިޔާސަތުތައް އިއުލާން ކުރައްވާފައި";
    const P2: &str = "މި ސިޔާސަތުތަކުގެ ސަބަބުން ރާއްޖޭގެ އިޤްތިޞާދަށް ބޮޑު ފައިދާއެއް ލިބޭނެ ކަމަށް ވަޒީރު ވިދާޅުވި";
    const P3: &str = "އެ ދުވަހު ބޭއްވި ޕްރެސް ކޮންފަރެންސްގައި ވަނީ ތަފްސީލުތައް ހާމަކުރައްވާފައި";

    fn styled(text: &str) -> String {
        format!(r#"<p class="text-19px leading-loose text-faseyha">{}</p>"#, text)
    }

    #[test]
    fn test_extracts_styled_paragraphs_after_anchor() {
        let html = format!(
            r#"<html><body>
                <h1 class="text-waheed text-black-two text-40px">ސުރުޚީ</h1>
                {}
                <div><!-- article body -->
                    {}
                    <p>ފޮޓޯ: މިހާރު</p>
                    {}
                    {}
                </div>
            </body></html>"#,
            styled("މި ޕެރެގްރާފް ހުރީ އެންކަރުގެ ކުރިން، އެހެންވީމާ މިއީ ލިޔުމުގެ ބައެއް ނޫން"),
            styled(P1),
            styled(P2),
            styled(P3),
        );

        let article = Extractor::default().extract(&html).unwrap();
        assert_eq!(article.body, format!("{}\n\n{}\n\n{}", P1, P2, P3));
        assert_eq!(article.title.as_deref(), Some("ސުރުޚީ"));
    }

    #[test]
    fn test_second_paragraph_style_matches() {
        let html = format!(
            r#"<!-- Article Body --><p class="max-w-3xl text-19px leading-loose text-black-two">{}</p>"#,
            P1
        );
        let article = Extractor::default().extract(&html).unwrap();
        assert_eq!(article.body, P1);
        assert_eq!(article.title, None);
    }

    #[test]
    fn test_falls_back_to_long_paragraphs_without_anchor() {
        let html = format!(
            r#"<html><body><div class="content">
                <p>{}</p>
                <p>ފޮޓޯ: މިހާރު</p>
                <p>{}</p>
            </div></body></html>"#,
            P1, P2
        );

        let article = Extractor::default().extract(&html).unwrap();
        assert_eq!(article.body, format!("{}\n\n{}", P1, P2));
    }

    #[test]
    fn test_fallback_stays_after_anchor() {
        let html = format!(
            "<p>{}</p><!-- article body --><p>{}</p>",
            P1, P2
        );
        let article = Extractor::default().extract(&html).unwrap();
        assert_eq!(article.body, P2);
    }

    #[test]
    fn test_no_content_found() {
        let extractor = Extractor::default();

        let html = "<html><body><p>ކުރު</p><p>ފޮޓޯ</p><div>ޕެރެގްރާފެއް ނޫން ލިޔުމެއް</div></body></html>";
        assert_eq!(extractor.extract(html), Err(ExtractionFailure::NoContentFound));

        assert_eq!(extractor.extract(""), Err(ExtractionFailure::NoContentFound));
    }

    #[test]
    fn test_content_too_short() {
        let html = format!("<!-- article body -->{}", styled("ކުރު ޚަބަރެއް"));
        let result = Extractor::default().extract(&html);
        assert!(matches!(result, Err(ExtractionFailure::ContentTooShort { min: 50, .. })));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let extractor = Extractor::new(ExtractorConfig {
            min_paragraph_chars: 5,
            min_article_chars: 5,
            ..ExtractorConfig::default()
        });
        let html = "<p>ކުރު ޚަބަރެއް</p>";
        assert_eq!(extractor.extract(html).unwrap().body, "ކުރު ޚަބަރެއް");
    }

    #[test]
    fn test_stops_at_sidebar_marker() {
        let html = format!(
            r#"<!-- article body -->{}<div class="hidden lg:block ml-10">{}</div>{}"#,
            styled(P1),
            styled(P2),
            styled(P3),
        );
        let article = Extractor::default().extract(&html).unwrap();
        assert_eq!(article.body, P1);
    }

    #[test]
    fn test_strips_markup_and_boilerplate() {
        let html = format!(
            r#"<!-- article body -->
            <nav>{}</nav>
            <p class="text-19px leading-loose text-faseyha">
                <b>ރައީސުލްޖުމްހޫރިއްޔާ</b>   މިއަދު <a href="/x">ވަނީ</a> ސަރުކާރުގެ<script>track()</script> އާ ސިޔާސަތުތައް<br>އިއުލާން ކުރައްވާފައި ކަމަށް ވަޒީރު ވިދާޅުވި
            </p>"#,
            styled(P3),
        );
        let article = Extractor::default().extract(&html).unwrap();
        assert_eq!(
            article.body,
            "ރައީސުލްޖުމްހޫރިއްޔާ މިއަދު ވަނީ ސަރުކާރުގެ އާ ސިޔާސަތުތައް\nއިއުލާން ކުރައްވާފައި ކަމަށް ވަޒީރު ވިދާޅުވި"
        );
        assert!(!article.body.contains('<'));
        assert!(!article.body.contains("track"));
    }

    #[test]
    fn test_malformed_html_degrades() {
        let extractor = Extractor::default();
        let html = r#"<html><body><p class="text-19px leading-loose text-faseyha">ކުރު<div></p></p><<<!-- article"#;
        assert!(extractor.extract(html).is_err());

        let html = format!("<div><p>{}<span><i>{}", P1, P2);
        assert!(extractor.extract(&html).is_ok());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = format!("<!-- article body -->{}{}", styled(P1), styled(P2));
        let extractor = Extractor::default();
        assert_eq!(extractor.extract(&html), extractor.extract(&html));
    }
}
