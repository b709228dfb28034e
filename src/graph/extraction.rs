//! Link extraction from document metadata and inline tags (regex-based).
//!
//! Keywords match in any case (`LeadsTo@x`), like frontmatter keys. An unquoted
//! target is a run of word characters and hyphens, so ids with a folder part
//! (`Projects/Plan`) need the quoted form: `leadsto@"Projects/Plan"`.

use regex::Regex;
use std::sync::OnceLock;

use super::{DocumentId, NodeLinks, RelationKind};
use crate::store::{strip_frontmatter, MetaValue, Metadata};

/// Matches `leadsto@target`, `>@target`, `dependson@"quoted target"`, ...
fn inline_tag_regex() -> &'static Regex {
    static INLINE_TAG: OnceLock<Regex> = OnceLock::new();
    INLINE_TAG.get_or_init(|| {
        Regex::new(r#"((?i:leadsto|dependson|informedby)|[><!])@(?:"([^"\r\n]+)"|([\w-]+))"#)
            .expect("Invalid regex pattern")
    })
}

/// One inline tag occurrence in body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineTag {
    pub kind: RelationKind,
    pub target: DocumentId,
}

/// Find every inline tag in `text`.
///
/// Each call walks its own match iterator, so concurrent callers never share
/// scan state. Matches without a usable type or target are skipped.
pub fn scan_inline_tags(text: &str) -> Vec<InlineTag> {
    let mut tags = Vec::new();

    for cap in inline_tag_regex().captures_iter(text) {
        let prefix = match cap.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };

        let kind = match RelationKind::from_keyword(prefix) {
            Some(kind) => Some(kind),
            None => prefix.chars().next().and_then(RelationKind::from_shorthand),
        };
        let kind = match kind {
            Some(kind) => kind,
            None => continue,
        };

        let target = match cap.get(2).or_else(|| cap.get(3)) {
            Some(m) => m.as_str().trim(),
            None => continue,
        };
        if target.is_empty() {
            continue;
        }

        tags.push(InlineTag {
            kind,
            target: target.to_string(),
        });
    }

    tags
}

/// Normalize a metadata value into target strings: absent or null gives nothing,
/// a scalar gives itself, a list gives each element. Blank entries are dropped.
pub fn normalize_meta_value(value: Option<&MetaValue>) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(value) = value {
        collect_meta_strings(value, &mut out);
    }
    out
}

fn collect_meta_strings(value: &MetaValue, out: &mut Vec<String>) {
    match value {
        MetaValue::Null => {}
        MetaValue::Scalar(s) => {
            let s = s.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
        }
        MetaValue::List(items) => {
            for item in items {
                collect_meta_strings(item, out);
            }
        }
    }
}

/// Extract a document's typed links.
///
/// `body` is None when the document text could not be read; the result then
/// holds metadata-derived targets only. Frontmatter targets come first, inline
/// tags after, duplicates collapse.
pub fn extract_links(metadata: &Metadata, body: Option<&str>) -> NodeLinks {
    let mut links = NodeLinks::new();

    for kind in RelationKind::ALL {
        links.union(kind, normalize_meta_value(metadata.get(kind.keyword())));
    }

    if let Some(body) = body {
        for tag in scan_inline_tags(strip_frontmatter(body)) {
            links.insert(tag.kind, tag.target);
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(links: &NodeLinks, kind: RelationKind) -> Vec<String> {
        links.targets(kind).to_vec()
    }

    #[test]
    fn test_scan_keyword_and_shorthand() {
        let tags = scan_inline_tags("see leadsto@next and <@base, also !@context-note.");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].kind, RelationKind::LeadsTo);
        assert_eq!(tags[0].target, "next");
        assert_eq!(tags[1].kind, RelationKind::DependsOn);
        assert_eq!(tags[1].target, "base");
        assert_eq!(tags[2].kind, RelationKind::InformedBy);
        assert_eq!(tags[2].target, "context-note");
    }

    #[test]
    fn test_scan_quoted_target_with_spaces() {
        let tags = scan_inline_tags(r#"leadsto@"my note""#);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].kind, RelationKind::LeadsTo);
        assert_eq!(tags[0].target, "my note");
    }

    #[test]
    fn test_scan_discards_partial_tags() {
        let tags = scan_inline_tags(r#"leadsto@ and >@"" and email@example and dependson"#);
        assert!(tags.is_empty(), "unexpected tags: {:?}", tags);
    }

    #[test]
    fn test_scan_keywords_ignore_case() {
        let tags = scan_inline_tags("LeadsTo@next, DEPENDSON@base");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].kind, RelationKind::LeadsTo);
        assert_eq!(tags[0].target, "next");
        assert_eq!(tags[1].kind, RelationKind::DependsOn);
    }

    #[test]
    fn test_scan_folder_ids_need_quotes() {
        let tags = scan_inline_tags(r#"leadsto@"Projects/Plan" and leadsto@Projects/Plan"#);
        let targets: Vec<_> = tags.iter().map(|t| t.target.as_str()).collect();
        // the unquoted form stops at the slash
        assert_eq!(targets, vec!["Projects/Plan", "Projects"]);
    }

    #[test]
    fn test_normalize_meta_value() {
        assert!(normalize_meta_value(None).is_empty());
        assert!(normalize_meta_value(Some(&MetaValue::Null)).is_empty());
        assert_eq!(normalize_meta_value(Some(&MetaValue::scalar(" b "))), vec!["b"]);
        let list = MetaValue::List(vec![
            MetaValue::scalar("a"),
            MetaValue::scalar(""),
            MetaValue::Null,
            MetaValue::scalar("  "),
            MetaValue::scalar("c"),
        ]);
        assert_eq!(normalize_meta_value(Some(&list)), vec!["a", "c"]);
    }

    #[test]
    fn test_extract_dedupes_across_syntaxes() {
        let links = extract_links(&Metadata::new(), Some("foo <@bar\nfoo dependson@bar"));
        assert_eq!(targets(&links, RelationKind::DependsOn), vec!["bar"]);
    }

    #[test]
    fn test_extract_unions_metadata_and_body() {
        let body = "---\nleadsto: [b, c]\n---\nthen >@c and >@d";
        let metadata = Metadata::from_document(body);
        let links = extract_links(&metadata, Some(body));
        assert_eq!(targets(&links, RelationKind::LeadsTo), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_extract_ignores_tags_inside_frontmatter() {
        let body = "---\ntitle: \">@hidden\"\n---\nbody";
        let links = extract_links(&Metadata::new(), Some(body));
        assert!(links.is_empty());
    }

    #[test]
    fn test_extract_metadata_only_when_body_missing() {
        let mut metadata = Metadata::new();
        metadata.insert("informedby", MetaValue::list(["src", "src", ""]));
        let links = extract_links(&metadata, None);
        assert_eq!(targets(&links, RelationKind::InformedBy), vec!["src"]);
        assert!(links.leads_to.is_empty());
    }
}
