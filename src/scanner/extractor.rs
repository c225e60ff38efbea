//! Review document extraction.
//!
//! Parses a single review XML document into a [`ReviewRecord`]. The document
//! schema is matched by exact element, attribute and field names so that
//! existing review exports keep working unchanged:
//!
//! ```xml
//! <review submission="12" title="..." authors="..." id="34" pc_member="...">
//!   <field name="Overall evaluation"><text>...</text><score>2</score></field>
//!   <field name="Reviewer's confidence"><score>4</score></field>
//!   <field name="Confidential remarks for the program committee"><text>...</text></field>
//!   <reviewer><first_name/><last_name/><email/></reviewer>
//! </review>
//! ```

use crate::analysis::text_metrics::{normalize_optional, normalize_whitespace};
use crate::error::ReviewError;
use crate::models::{ReviewRecord, TextMetrics};
use quick_xml::encoding::detect_encoding;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{Decoder, NsReader, Reader};
use std::borrow::Cow;
use std::path::Path;

const ROOT_TAG: &str = "review";
const FIELD_TAG: &str = "field";
const REVIEWER_TAG: &str = "reviewer";

const OVERALL_FIELD: &str = "Overall evaluation";
const CONFIDENCE_FIELD: &str = "Reviewer's confidence";
const CONFIDENTIAL_FIELD: &str = "Confidential remarks for the program committee";

/// Minimal element tree; only what review lookups need.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// `namespace` is the URI the element name resolved to, if any; such
    /// names are kept in `{uri}local` form so they never match plain tags.
    fn open(start: &BytesStart<'_>, namespace: Option<&str>) -> Result<Self, String> {
        let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let name = match namespace {
            Some(uri) => format!("{{{}}}{}", uri, local),
            None => local,
        };

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("bad attribute on <{}>: {}", name, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }

            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&normalize_attribute(&raw))
                .map_err(|e| format!("bad attribute value on <{}>: {}", name, e))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            text: None,
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, value: &str) {
        if self.children.is_empty() {
            self.text.get_or_insert_with(String::new).push_str(value);
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text of the first child named `name`; empty when the child has none.
    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text().unwrap_or(""))
    }

    /// First `<field>` child whose trimmed `name` attribute matches exactly.
    fn field(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter(|c| c.name == FIELD_TAG)
            .find(|c| c.attr("name").unwrap_or("").trim() == name)
    }
}

/// Attach a finished element to its parent, or make it the document root.
fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Literal tabs and line breaks in an attribute value read as single spaces.
/// Character references such as `&#10;` are expanded afterwards and survive.
fn normalize_attribute(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\t', '\r', '\n']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", " ").replace(['\t', '\r', '\n'], " "))
}

/// Namespace URI an element name resolved to.
fn element_namespace(resolved: ResolveResult<'_>) -> Result<Option<String>, String> {
    match resolved {
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Bound(ns) if ns.as_ref().is_empty() => Ok(None),
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unknown(prefix) => Err(format!(
            "unbound prefix: {}",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

fn parse_tree(xml: &str) -> Result<Element, String> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let next = reader
            .read_resolved_event()
            .map(|(resolved, event)| (element_namespace(resolved), event));
        let (namespace, event) = match next {
            Ok(next) => next,
            Err(e) => return Err(format!("{} (at byte {})", e, reader.buffer_position())),
        };

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err("junk after document element".to_string());
                }
                stack.push(Element::open(&start, namespace?.as_deref())?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err("junk after document element".to_string());
                }
                let element = Element::open(&start, namespace?.as_deref())?;
                close(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without matching opening tag".to_string())?;
                close(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(&value),
                    None if value.trim().is_empty() => {}
                    None => return Err("text outside of the document element".to_string()),
                }
            }
            Event::CData(data) => match stack.last_mut() {
                Some(parent) => parent.push_text(&String::from_utf8_lossy(&data)),
                None => return Err("CDATA outside of the document element".to_string()),
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }

    root.ok_or_else(|| "no element found".to_string())
}

/// Parse a score permissively: missing, empty, non-numeric or non-finite
/// text yields `None`.
fn parse_score(node: Option<&Element>) -> Option<f64> {
    let text = normalize_whitespace(node?.text()?);
    if text.is_empty() {
        return None;
    }

    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn root_attr(root: &Element, name: &str) -> String {
    root.attr(name).unwrap_or("").trim().to_string()
}

/// Parse review XML already held in memory.
pub fn parse_review_str(xml: &str, file_name: &str) -> Result<ReviewRecord, ReviewError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let root = parse_tree(xml)
        .map_err(|reason| ReviewError::parse(file_name, format!("malformed XML: {}", reason)))?;

    if root.name != ROOT_TAG {
        return Err(ReviewError::parse(
            file_name,
            format!("unexpected root tag: {}", root.name),
        ));
    }

    let (overall_text, overall_score) = match root.field(OVERALL_FIELD) {
        Some(field) => (
            normalize_optional(field.child_text("text")),
            parse_score(field.child("score")),
        ),
        None => (String::new(), None),
    };

    let confidence_score = root
        .field(CONFIDENCE_FIELD)
        .and_then(|field| parse_score(field.child("score")));

    let confidential_text = root
        .field(CONFIDENTIAL_FIELD)
        .map(|field| normalize_optional(field.child_text("text")))
        .unwrap_or_default();

    let reviewer = root.child(REVIEWER_TAG);
    let reviewer_text = |name: &str| normalize_optional(reviewer.and_then(|r| r.child_text(name)));
    let subreviewer_name = normalize_whitespace(&format!(
        "{} {}",
        reviewer_text("first_name"),
        reviewer_text("last_name")
    ));
    let subreviewer_email = reviewer_text("email");

    let metrics = TextMetrics::from_text(&overall_text);

    Ok(ReviewRecord {
        submission: root_attr(&root, "submission"),
        title: root_attr(&root, "title"),
        authors: root_attr(&root, "authors"),
        file_name: file_name.to_string(),
        review_id: root_attr(&root, "id"),
        pc_member: root_attr(&root, "pc_member"),
        overall_text,
        overall_score,
        confidence_score,
        confidential_text,
        subreviewer_name,
        subreviewer_email,
        metrics,
    })
}

/// Decoder for a raw document: a byte order mark wins, then the
/// `encoding` of the XML declaration, then UTF-8.
fn document_decoder(bytes: &[u8]) -> Decoder {
    let mut reader = Reader::from_reader(bytes);
    loop {
        match reader.read_event() {
            Ok(Event::Text(_)) | Ok(Event::Comment(_)) => continue,
            _ => break,
        }
    }
    reader.decoder()
}

/// Decode a raw document into text.
fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>, String> {
    let bom_len = detect_encoding(bytes).map_or(0, |(_, len)| len);
    let decoder = document_decoder(bytes);

    decoder
        .decode(&bytes[bom_len..])
        .map_err(|e| format!("cannot decode as {}: {}", decoder.encoding().name(), e))
}

/// Read and parse one review document from disk.
///
/// An unreadable or undecodable file is reported as a parse failure of that
/// document so the folder loader can skip it.
pub fn parse_review_document(path: &Path) -> Result<ReviewRecord, ReviewError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path)
        .map_err(|e| ReviewError::parse(&file_name, format!("cannot read file: {}", e)))?;
    let xml = decode_document(&bytes).map_err(|reason| ReviewError::parse(&file_name, reason))?;

    parse_review_str(&xml, &file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REVIEW: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported review -->
<review submission=" 17 " title="Fast Joins" authors="A. One, B. Two" id="301" pc_member="Grace Hopper">
  <field name="Overall evaluation">
    <text>
      A solid paper.   The evaluation is thin!
    </text>
    <score> 2 </score>
  </field>
  <field name=" Reviewer's confidence ">
    <score>4</score>
  </field>
  <field name="Confidential remarks for the program committee">
    <text>Possible   overlap with &quot;Slow Joins&quot;.</text>
  </field>
  <reviewer>
    <first_name> Ada </first_name>
    <last_name>Lovelace</last_name>
    <email>ada@example.org</email>
  </reviewer>
</review>
"#;

    #[test]
    fn test_parse_full_review() {
        let review = parse_review_str(FULL_REVIEW, "r1.xml").unwrap();

        assert_eq!(review.submission, "17");
        assert_eq!(review.title, "Fast Joins");
        assert_eq!(review.authors, "A. One, B. Two");
        assert_eq!(review.review_id, "301");
        assert_eq!(review.pc_member, "Grace Hopper");
        assert_eq!(review.file_name, "r1.xml");
        assert_eq!(review.overall_text, "A solid paper. The evaluation is thin!");
        assert_eq!(review.overall_score, Some(2.0));
        assert_eq!(review.confidence_score, Some(4.0));
        assert_eq!(review.confidential_text, "Possible overlap with \"Slow Joins\".");
        assert_eq!(review.subreviewer_name, "Ada Lovelace");
        assert_eq!(review.subreviewer_email, "ada@example.org");
        assert_eq!(review.metrics.word_count, 7);
        assert_eq!(review.metrics.sentence_count, 2);
        assert_eq!(review.metrics.char_count, review.overall_text.chars().count());
        assert_eq!(review.metrics.unique_word_ratio, 1.0);
    }

    #[test]
    fn test_missing_fields_are_absent_not_errors() {
        let review = parse_review_str(r#"<review submission="5"/>"#, "empty.xml").unwrap();

        assert_eq!(review.submission, "5");
        assert!(review.title.is_empty());
        assert!(review.overall_text.is_empty());
        assert_eq!(review.overall_score, None);
        assert_eq!(review.confidence_score, None);
        assert!(review.confidential_text.is_empty());
        assert!(review.subreviewer_name.is_empty());
        assert!(review.subreviewer_email.is_empty());
        assert_eq!(review.metrics, TextMetrics::default());
    }

    #[test]
    fn test_malformed_scores_degrade_to_none() {
        for score in ["", "   ", "strong accept", "nan", "inf", "2/3"] {
            let xml = format!(
                r#"<review><field name="Overall evaluation"><text>ok</text><score>{}</score></field></review>"#,
                score
            );
            let review = parse_review_str(&xml, "s.xml").unwrap();
            assert_eq!(review.overall_score, None, "score text {:?}", score);
            assert_eq!(review.overall_text, "ok");
        }

        let xml = r#"<review><field name="Overall evaluation"><score>-1.5</score></field></review>"#;
        let review = parse_review_str(xml, "s.xml").unwrap();
        assert_eq!(review.overall_score, Some(-1.5));
    }

    #[test]
    fn test_first_matching_field_wins() {
        let xml = r#"<review>
            <field name="Reviewer's confidence"><score>2</score></field>
            <field name="Reviewer's confidence"><score>5</score></field>
        </review>"#;
        let review = parse_review_str(xml, "dup.xml").unwrap();
        assert_eq!(review.confidence_score, Some(2.0));
    }

    #[test]
    fn test_field_names_match_exactly() {
        let xml = r#"<review>
            <field name="overall evaluation"><score>3</score></field>
            <field name="Reviewers confidence"><score>3</score></field>
        </review>"#;
        let review = parse_review_str(xml, "case.xml").unwrap();
        assert_eq!(review.overall_score, None);
        assert_eq!(review.confidence_score, None);
    }

    #[test]
    fn test_nested_fields_are_ignored() {
        let xml = r#"<review>
            <section><field name="Overall evaluation"><score>3</score></field></section>
        </review>"#;
        let review = parse_review_str(xml, "nested.xml").unwrap();
        assert_eq!(review.overall_score, None);
    }

    #[test]
    fn test_cdata_text_is_read() {
        let xml = r#"<review><field name="Overall evaluation"><text><![CDATA[Use <b>bold</b> less.]]></text></field></review>"#;
        let review = parse_review_str(xml, "cdata.xml").unwrap();
        assert_eq!(review.overall_text, "Use <b>bold</b> less.");
    }

    #[test]
    fn test_reviewer_with_only_last_name() {
        let xml = r#"<review><reviewer><last_name>Turing</last_name></reviewer></review>"#;
        let review = parse_review_str(xml, "r.xml").unwrap();
        assert_eq!(review.subreviewer_name, "Turing");
        assert!(review.subreviewer_email.is_empty());
    }

    #[test]
    fn test_wrong_root_tag() {
        let err = parse_review_str("<paper/>", "paper.xml").unwrap_err();
        match err {
            ReviewError::Parse { file, reason } => {
                assert_eq!(file, "paper.xml");
                assert!(reason.contains("unexpected root tag: paper"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        let cases = [
            "",
            "not xml at all",
            "<review>",
            "<review><field></review>",
            "<review/><review/>",
            "<review/>trailing",
            "<review a=\"1\" a=\"2\"/>",
            "<review>&undefined;</review>",
        ];

        for xml in cases {
            let result = parse_review_str(xml, "bad.xml");
            assert!(
                matches!(result, Err(ReviewError::Parse { .. })),
                "expected parse error for {:?}",
                xml
            );
        }
    }

    #[test]
    fn test_error_message_names_file() {
        let err = parse_review_str("<review>", "broken.xml").unwrap_err();
        assert!(err.to_string().contains("broken.xml"));
    }

    #[test]
    fn test_parse_review_document_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("r1.xml");
        std::fs::write(&path, FULL_REVIEW).unwrap();

        let review = parse_review_document(&path).unwrap();
        assert_eq!(review.file_name, "r1.xml");
        assert_eq!(review.submission, "17");
    }

    #[test]
    fn test_attribute_line_breaks_read_as_spaces() {
        let xml = "<review submission=\"&#10;8\" title=\"Fast\r\nJoins\">\n\
            <field name=\"Reviewer's\tconfidence\"><score>3</score></field>\n\
            </review>";
        let review = parse_review_str(xml, "attrs.xml").unwrap();
        assert_eq!(review.title, "Fast Joins");
        assert_eq!(review.confidence_score, Some(3.0));
        // Character references survive and are then trimmed.
        assert_eq!(review.submission, "8");
    }

    #[test]
    fn test_namespaced_root_is_rejected() {
        let err = parse_review_str(r#"<review xmlns="urn:x" submission="1"/>"#, "ns.xml").unwrap_err();
        assert!(err.to_string().contains("unexpected root tag: {urn:x}review"));

        let err = parse_review_str(r#"<r:review xmlns:r="urn:x"/>"#, "ns.xml").unwrap_err();
        assert!(err.to_string().contains("unexpected root tag"));

        let err = parse_review_str("<x:review/>", "ns.xml").unwrap_err();
        assert!(err.to_string().contains("unbound prefix"));
    }

    #[test]
    fn test_namespaced_fields_do_not_match() {
        let xml = r#"<review xmlns:p="urn:p" submission="2">
            <field xmlns="urn:y" name="Overall evaluation"><score>3</score></field>
            <p:field name="Reviewer's confidence"><score>4</score></p:field>
        </review>"#;
        let review = parse_review_str(xml, "ns.xml").unwrap();
        assert_eq!(review.submission, "2");
        assert_eq!(review.overall_score, None);
        assert_eq!(review.confidence_score, None);
    }

    #[test]
    fn test_parse_review_document_honors_declared_encoding() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("latin1.xml");
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n".to_vec();
        bytes.extend_from_slice(b"<review submission=\"4\" title=\"Caf\xe9\">");
        bytes.extend_from_slice(b"<field name=\"Overall evaluation\"><text>Tr\xe8s bien.</text>");
        bytes.extend_from_slice(b"<score>1</score></field></review>");
        std::fs::write(&path, bytes).unwrap();

        let review = parse_review_document(&path).unwrap();
        assert_eq!(review.title, "Café");
        assert_eq!(review.overall_text, "Très bien.");
        assert_eq!(review.overall_score, Some(1.0));
    }

    #[test]
    fn test_parse_review_document_reads_utf16_with_bom() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("utf16.xml");
        let xml = r#"<?xml version="1.0" encoding="UTF-16"?><review submission="5" pc_member="Zoë"/>"#;
        let mut bytes = vec![0xff, 0xfe];
        bytes.extend(xml.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
        std::fs::write(&path, bytes).unwrap();

        let review = parse_review_document(&path).unwrap();
        assert_eq!(review.submission, "5");
        assert_eq!(review.pc_member, "Zoë");
    }

    #[test]
    fn test_parse_review_document_rejects_undecodable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("binary.xml");
        std::fs::write(&path, [b'<', b'r', 0xff, b'/', b'>']).unwrap();

        let err = parse_review_document(&path).unwrap_err();
        match err {
            ReviewError::Parse { file, reason } => {
                assert_eq!(file, "binary.xml");
                assert!(reason.starts_with("cannot decode as UTF-8"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
