//! Multilingual header pattern tables.
//!
//! Two tiers of matching live here:
//! - [`classify`] runs the per-column regex tables (identifier / name /
//!   grade) used by structure inference.
//! - [`matches_header_keyword`] runs a stricter literal-substring list tuned
//!   for header-row discovery in the grid scanner.
//!
//! The tables are pure data; nothing here holds state.

use lazy_static::lazy_static;
use regex::Regex;

/// Semantic category a column header can classify into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Identifier,
    Name,
    Grade,
}

// Pattern sets are ordered: identifier patterns are consulted before name
// patterns, which are consulted before grade patterns. "رقم الطالب" must land
// on Identifier even though it also carries the student token.
const IDENTIFIER_PATTERNS: &[&str] = &[
    r"(?i)\b(id|no|num|number|code)\b",
    r"(?i)student\s*(id|no|number|code)",
    r"(?i)\broll\b",
    "رقم",
    "كود",
    "الرقم",
    "номер",
    r"(?i)identificaci[oó]n",
    r"(?i)c[oó]digo",
    "学号",
    "번호",
];

const NAME_PATTERNS: &[&str] = &[
    r"(?i)\bname\b",
    r"(?i)student\s*name",
    "اسم",
    "الاسم",
    "طالب",
    r"(?i)\bnombre\b",
    "имя",
    "фамилия",
    "姓名",
    "이름",
];

const GRADE_PATTERNS: &[&str] = &[
    r"(?i)\b(grade|mark|score|total|final|exam|result)\b",
    r"(?i)\bgpa\b",
    "درجة",
    "الدرجة",
    "امتحان",
    "نتيجة",
    "مجموع",
    "اختبار",
    r"(?i)calificaci[oó]n",
    r"(?i)\bnota\b",
    "оценка",
    "балл",
    "成绩",
    "成績",
    "성적",
    "점수",
];

// Literal keywords for header-row discovery. Substring containment on the
// lowercased cell text, deliberately stricter than the regex tables: a row
// qualifies as a header row only when it carries identifier- or name-bearing
// words, not grade words (grade labels also appear in summary rows).
const HEADER_IDENTIFIER_KEYWORDS: &[&str] = &["id", "code", "رقم", "كود", "номер", "学号", "번호"];
const HEADER_NAME_KEYWORDS: &[&str] = &["name", "اسم", "طالب", "nombre", "имя", "姓名", "이름"];

lazy_static! {
    static ref TABLES: Vec<(Category, Vec<Regex>)> = vec![
        (Category::Identifier, compile(IDENTIFIER_PATTERNS)),
        (Category::Name, compile(NAME_PATTERNS)),
        (Category::Grade, compile(GRADE_PATTERNS)),
    ];
}

#[allow(clippy::expect_used)]
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("pattern table entry compiles"))
        .collect()
}

/// Classify a header string into a category, or `None` when no table matches.
///
/// Categories are consulted in declaration order (identifier, name, grade)
/// and the first matching table wins.
#[must_use]
pub fn classify(header: &str) -> Option<Category> {
    let text = header.trim();
    if text.is_empty() {
        return None;
    }
    for (category, table) in TABLES.iter() {
        if table.iter().any(|re| re.is_match(text)) {
            return Some(*category);
        }
    }
    None
}

/// Header-row keyword test used by the grid scanner's row scoring.
#[must_use]
pub fn matches_header_keyword(cell_text: &str) -> bool {
    matches_identifier_keyword(cell_text) || matches_name_keyword(cell_text)
}

/// Identifier-bearing literal keyword test (header-row discovery).
#[must_use]
pub fn matches_identifier_keyword(cell_text: &str) -> bool {
    let lowered = cell_text.trim().to_lowercase();
    !lowered.is_empty() && HEADER_IDENTIFIER_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Name-bearing literal keyword test (header-row discovery).
#[must_use]
pub fn matches_name_keyword(cell_text: &str) -> bool {
    let lowered = cell_text.trim().to_lowercase();
    !lowered.is_empty() && HEADER_NAME_KEYWORDS.iter().any(|k| lowered.contains(k))
}
