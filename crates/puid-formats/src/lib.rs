//! # puid-formats
//!
//! Static membership tables over [PRONOM](https://www.nationalarchives.gov.uk/PRONOM/)
//! persistent unique identifiers (PUIDs), e.g. `fmt/412` or `x-fmt/45`.
//!
//! The tables answer one question per family: "does this identifier belong
//! to the family?" Callers use the answer to pick a conversion:
//!
//! | Family | Typical action |
//! |--------|----------------|
//! | [`Family::Word`] | convert to PDF with LibreOffice |
//! | [`Family::Pdf`]  | thumbnail the first page |
//! | [`Family::Text`] | extract text with Tika |
//!
//! Identifiers are matched exactly (case-sensitive, no trimming), as they
//! appear in DROID / siegfried reports.
//!
//! ```rust
//! use puid_formats::{is_pdf, is_text, is_word};
//!
//! assert!(is_word("fmt/412"));
//! assert!(is_pdf("fmt/276"));
//! assert!(is_text("x-fmt/111"));
//! assert!(!is_text("fmt/11"));
//! ```

use serde::{Deserialize, Serialize};

// ── Tables ───────────────────────────────────────────────────────────────────

/// Microsoft Word formats (97–2003, 2007+ OOXML, templates, macro-enabled).
pub const WORD_PUIDS: &[&str] = &[
    "fmt/37", "fmt/38", "fmt/39", "fmt/40", "fmt/412", "fmt/523", "fmt/597", "fmt/599",
    "fmt/609", "fmt/754", "x-fmt/45",
];

/// PDF 1.0–1.7, PDF/A, PDF/X and PDF 2.0.
pub const PDF_PUIDS: &[&str] = &[
    "fmt/14", "fmt/15", "fmt/16", "fmt/17", "fmt/18", "fmt/19", "fmt/20", "fmt/95", "fmt/144",
    "fmt/145", "fmt/146", "fmt/147", "fmt/148", "fmt/157", "fmt/158", "fmt/276", "fmt/354",
    "fmt/476", "fmt/477", "fmt/478", "fmt/479", "fmt/480", "fmt/481", "fmt/488", "fmt/489",
    "fmt/490", "fmt/491", "fmt/492", "fmt/493",
];

/// Formats a text extractor can read: the PDF and Word families plus
/// plain text, RTF and a few legacy word-processor formats.
pub const TEXT_PUIDS: &[&str] = &[
    "fmt/14", "fmt/15", "fmt/16", "fmt/17", "fmt/18", "fmt/19", "fmt/20", "fmt/37", "fmt/38",
    "fmt/39", "fmt/40", "fmt/95", "fmt/144", "fmt/145", "fmt/146", "fmt/147", "fmt/148",
    "fmt/157", "fmt/158", "fmt/276", "fmt/354", "fmt/412", "fmt/473", "fmt/476", "fmt/477",
    "fmt/478", "fmt/479", "fmt/480", "fmt/481", "fmt/488", "fmt/489", "fmt/490", "fmt/491",
    "fmt/492", "fmt/493", "fmt/523", "fmt/597", "fmt/599", "fmt/609", "fmt/754", "x-fmt/45",
    "x-fmt/111", "x-fmt/273", "x-fmt/274", "x-fmt/275", "x-fmt/276",
];

// ── Predicates ───────────────────────────────────────────────────────────────

/// True if `puid` is one of the Microsoft Word formats.
pub fn is_word(puid: &str) -> bool {
    WORD_PUIDS.contains(&puid)
}

/// True if `puid` is one of the PDF formats.
pub fn is_pdf(puid: &str) -> bool {
    PDF_PUIDS.contains(&puid)
}

/// True if `puid` is a format text can be extracted from.
pub fn is_text(puid: &str) -> bool {
    TEXT_PUIDS.contains(&puid)
}

// ── Families ─────────────────────────────────────────────────────────────────

/// A named PUID table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Word,
    Pdf,
    Text,
}

impl Family {
    /// Every family, in table order.
    pub const ALL: [Family; 3] = [Family::Word, Family::Pdf, Family::Text];

    /// Membership test for this family.
    pub fn contains(self, puid: &str) -> bool {
        match self {
            Family::Word => is_word(puid),
            Family::Pdf => is_pdf(puid),
            Family::Text => is_text(puid),
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Family::Word => "word",
            Family::Pdf => "pdf",
            Family::Text => "text",
        })
    }
}

/// All families `puid` belongs to. Empty for unknown identifiers.
///
/// A PDF or Word identifier is always also a text identifier, so the result
/// has at most two entries.
pub fn families(puid: &str) -> Vec<Family> {
    Family::ALL
        .into_iter()
        .filter(|f| f.contains(puid))
        .collect()
}
