//! Prompt template for field extraction.
//!
//! The template is kept here, away from the transport code, so a wording
//! change never touches request building and tests can assert on the exact
//! text. Callers can override it through
//! [`crate::config::ExtractionConfig::prompt_template`].
//!
//! The extracted document text is substituted verbatim. No truncation or
//! chunking is applied: a very large document is forwarded as-is and the
//! completion service decides whether it fits its context window.

/// Placeholder replaced by the extracted document text.
pub const DOCUMENT_PLACEHOLDER: &str = "{document}";

/// Default instruction asking for three purchase-order fields as bare JSON.
pub const FIELD_QUERY_TEMPLATE: &str = r#"Want to extract fields: "PO Number", "Total Amount" and "Delivery Address".
Return result in JSON format without any explanation.
The PO content is as follows:
{document}
"#;

/// Fill `template` with the document text.
///
/// Only the first placeholder is replaced, so document text that itself
/// contains `{document}` is never re-expanded.
pub fn render_prompt(template: &str, document_text: &str) -> String {
    template.replacen(DOCUMENT_PLACEHOLDER, document_text, 1)
}

/// Fill the default template with the document text.
pub fn build_prompt(document_text: &str) -> String {
    render_prompt(FIELD_QUERY_TEMPLATE, document_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_document_text() {
        let prompt = build_prompt("ABC");
        let expected = "Want to extract fields: \"PO Number\", \"Total Amount\" and \"Delivery Address\".\n\
Return result in JSON format without any explanation.\n\
The PO content is as follows:\n\
ABC\n";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn names_all_three_fields() {
        for field in ["PO Number", "Total Amount", "Delivery Address"] {
            assert!(FIELD_QUERY_TEMPLATE.contains(field), "missing {field}");
        }
    }

    #[test]
    fn placeholder_inside_document_is_left_alone() {
        let prompt = render_prompt("<{document}>", "x {document} y");
        assert_eq!(prompt, "<x {document} y>");
    }

    #[test]
    fn empty_document_keeps_instructions() {
        let prompt = build_prompt("");
        assert!(prompt.starts_with("Want to extract fields"));
        assert!(prompt.ends_with("as follows:\n\n"));
    }
}
