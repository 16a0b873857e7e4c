use super::utils::normalize_text;
use crate::dates::parse_datetime;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

/// Walks every JSON-LD block in the document, including `@graph` arrays and
/// top-level arrays, and returns the first value `pick` accepts.
fn find_in_jsonld<T>(document: &Html, pick: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let script_selector = Selector::parse("script[type='application/ld+json']").ok()?;

    document.select(&script_selector).find_map(|script| {
        let json = serde_json::from_str::<Value>(script.text().collect::<String>().trim()).ok()?;
        let mut stack = vec![&json];
        while let Some(node) = stack.pop() {
            match node {
                Value::Array(items) => stack.extend(items.iter().rev()),
                Value::Object(obj) => {
                    if let Some(found) = pick(node) {
                        return Some(found);
                    }
                    if let Some(graph) = obj.get("@graph") {
                        stack.push(graph);
                    }
                }
                _ => {}
            }
        }
        None
    })
}

/// `datePublished`, falling back to `dateCreated`.
pub fn extract_published(document: &Html) -> Option<DateTime<Utc>> {
    find_in_jsonld(document, |node| {
        ["datePublished", "dateCreated"]
            .iter()
            .filter_map(|key| node.get(*key).and_then(Value::as_str))
            .find_map(parse_datetime)
    })
}

pub fn extract_description(document: &Html) -> Option<String> {
    find_in_jsonld(document, |node| {
        node.get("description")
            .and_then(Value::as_str)
            .map(normalize_text)
            .filter(|text| !text.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_published_from_graph() {
        let html = r#"
            <script type="application/ld+json">not json</script>
            <script type="application/ld+json">
              {"@context": "https://schema.org", "@graph": [
                {"@type": "WebSite", "name": "Site"},
                {"@type": "ScholarlyArticle", "datePublished": "2024-05-21T10:00:00Z",
                 "description": "Features &amp; <i>circuits</i>"}
              ]}
            </script>"#;
        let document = Html::parse_document(html);

        assert_eq!(
            extract_published(&document).map(|d| d.to_rfc3339()),
            Some("2024-05-21T10:00:00+00:00".to_string())
        );
        assert_eq!(extract_description(&document), Some("Features & circuits".to_string()));
    }

    #[test]
    fn test_extract_from_top_level_array() {
        let html = r#"<script type="application/ld+json">
            [{"@type": "Person"}, {"@type": "Article", "dateCreated": "May 2023"}]
        </script>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            extract_published(&document).map(|d| d.to_rfc3339()),
            Some("2023-05-01T00:00:00+00:00".to_string())
        );
        assert_eq!(extract_description(&document), None);
    }

    #[test]
    fn test_no_jsonld() {
        let document = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert_eq!(extract_published(&document), None);
    }
}
