//! Markdown rendering of the assembled contract.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Preamble wording when no effective date is known.
pub const UNDATED_EFFECTIVE_DATE: &str = "the date of the last signature below";

const RULE: &str = "---";

/// A party named in the preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    /// Defined term, e.g. "Company"
    pub label: String,
}

/// A numbered clause section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub number: usize,
    pub title: String,
    pub text: String,
}

/// An exhibit ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExhibit {
    pub title: Option<String>,
    pub body: String,
}

/// Everything printed before the disclaimer.
#[derive(Debug, Clone)]
pub struct DocumentParts<'a> {
    pub title: &'a str,
    pub effective_date: &'a str,
    pub primary: &'a Party,
    pub counterparty: &'a Party,
    pub sections: &'a [Section],
    pub exhibits: &'a [RenderedExhibit],
}

/// Long US date, e.g. "January 15, 2025".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Render header, preamble, numbered sections and exhibits.
///
/// The output is the text the output-phase compliance rules scan.
pub fn render_body(parts: &DocumentParts<'_>) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# {}\n\n{}\n\n", parts.title, RULE));

    doc.push_str(&format!(
        "This {} (the \"Agreement\") is made and entered into as of {} (the \"Effective Date\"), by and between:\n\n",
        parts.title, parts.effective_date
    ));
    doc.push_str(&format!(
        "**{}** (\"{}\")\n\nand\n\n**{}** (\"{}\")\n\n{}\n\n",
        parts.primary.name,
        parts.primary.label,
        parts.counterparty.name,
        parts.counterparty.label,
        RULE
    ));

    for section in parts.sections {
        doc.push_str(&format!(
            "## {}. {}\n\n{}\n\n",
            section.number,
            section.title,
            section.text.trim()
        ));
    }

    for exhibit in parts.exhibits {
        doc.push_str(RULE);
        doc.push_str("\n\n");
        if let Some(title) = &exhibit.title {
            doc.push_str(&format!("## {}\n\n", title));
        }
        doc.push_str(exhibit.body.trim());
        doc.push_str("\n\n");
    }

    doc
}

/// Append the disclaimer section. The disclaimer is printed verbatim.
pub fn append_disclaimer(body: &str, disclaimer: &str) -> String {
    let mut doc = String::with_capacity(body.len() + disclaimer.len() + 8);
    doc.push_str(body);
    doc.push_str(RULE);
    doc.push_str("\n\n");
    doc.push_str(disclaimer.trim());
    doc.trim().to_string()
}

/// SHA-256 of the document text, hex encoded.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties() -> (Party, Party) {
        (
            Party {
                name: "Acme Inc.".to_string(),
                label: "Company".to_string(),
            },
            Party {
                name: "Jane Doe".to_string(),
                label: "Employee".to_string(),
            },
        )
    }

    #[test]
    fn test_render_layout() {
        let (primary, counterparty) = parties();
        let sections = vec![
            Section {
                number: 1,
                title: "Position".to_string(),
                text: "Engineer.".to_string(),
            },
            Section {
                number: 2,
                title: "Term".to_string(),
                text: "At will.\n".to_string(),
            },
        ];
        let exhibits = vec![RenderedExhibit {
            title: None,
            body: "# Exhibit A\n\nNotice.\n".to_string(),
        }];
        let date = format_date(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());

        let body = render_body(&DocumentParts {
            title: "Employment Agreement",
            effective_date: &date,
            primary: &primary,
            counterparty: &counterparty,
            sections: &sections,
            exhibits: &exhibits,
        });
        let doc = append_disclaimer(&body, "\nNot legal advice.\n");

        assert!(doc.starts_with("# Employment Agreement\n\n---\n\nThis Employment Agreement"));
        assert!(doc.contains("as of January 5, 2025 (the \"Effective Date\")"));
        assert!(doc.contains("**Acme Inc.** (\"Company\")\n\nand\n\n**Jane Doe** (\"Employee\")"));
        assert!(doc.contains("## 1. Position\n\nEngineer.\n\n## 2. Term\n\nAt will.\n\n---\n\n# Exhibit A"));
        assert!(doc.ends_with("Notice.\n\n---\n\nNot legal advice."));
    }

    #[test]
    fn test_fingerprint() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
