//! Local file naming and file selection.
//!
//! Both are pure functions so the same file always maps to the same local
//! name and the same eligibility on every run.

use crate::core::model::{Discussion, DiscussionDraft, FileRef};
use chrono::NaiveDate;
use regex::Regex;

/// Date prefix used when the owning session has no parsed date.
const UNDATED_PREFIX: &str = "00000000";

/// Stable numeric identifier of a file URL.
///
/// Prefers a numeric `ID` query parameter, then the last run of digits in
/// the query values, then in the last path segment. Digits elsewhere in the
/// path (`/app18/`) are shared by every file of a site and never used.
#[must_use]
pub fn file_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let id = pairs.iter().find(|(k, v)| {
        k.eq_ignore_ascii_case("id") && !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit())
    });
    if let Some((_, v)) = id {
        return Some(v.clone());
    }

    let re = Regex::new(r"\d+").ok()?;
    let last_digits = |text: &str| re.find_iter(text).last().map(|m| m.as_str().to_string());

    pairs
        .iter()
        .rev()
        .find_map(|(_, v)| last_digits(v))
        .or_else(|| {
            parsed
                .path_segments()
                .and_then(Iterator::last)
                .and_then(|segment| last_digits(segment))
        })
}

/// Local file name for an attachment: `YYYYMMDD_<id>.pdf`.
///
/// When the URL yields no id the 1-based position of the file within
/// the session (`<discussion>_<file>`) stands in for the id.
#[must_use]
pub fn derive_alias(date: Option<NaiveDate>, url: &str, position: (usize, usize)) -> String {
    let prefix = date.map_or_else(
        || UNDATED_PREFIX.to_string(),
        |d| d.format("%Y%m%d").to_string(),
    );
    let id = file_id(url).unwrap_or_else(|| format!("{}_{}", position.0 + 1, position.1 + 1));
    format!("{prefix}_{id}.pdf")
}

/// Attach aliases to parsed discussions of a session dated `date`.
#[must_use]
pub fn assign_aliases(date: Option<NaiveDate>, drafts: Vec<DiscussionDraft>) -> Vec<Discussion> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(d, draft)| Discussion {
            title: draft.title,
            files: draft
                .files
                .into_iter()
                .enumerate()
                .map(|(f, file)| FileRef {
                    alias: derive_alias(date, &file.url, (d, f)),
                    url: file.url,
                    name: file.name,
                })
                .collect(),
        })
        .collect()
}

/// Whether a file name is selected by `patterns`.
///
/// An empty pattern list accepts everything; otherwise the raw name must
/// contain at least one pattern as a case-sensitive substring.
#[must_use]
pub fn matches_patterns(name: &str, patterns: &[String]) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| name.contains(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::FileDraft;
    use proptest::prelude::*;

    const SIEL: &str = "https://sieldocs.vd.ch/ecm/app18/service/siel/getContent?ID=";

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn alias_from_id_query_parameter() {
        let url = format!("{SIEL}123");
        assert_eq!(derive_alias(date(2025, 1, 1), &url, (0, 0)), "20250101_123.pdf");
    }

    #[test]
    fn alias_falls_back_to_last_digits() {
        let url = "https://docs.example.org/files/2025/doc-4567.pdf";
        assert_eq!(derive_alias(date(2025, 3, 9), url, (0, 0)), "20250309_4567.pdf");
    }

    #[test]
    fn alias_falls_back_to_position() {
        let url = "https://docs.example.org/files/rapport.pdf";
        assert_eq!(derive_alias(date(2025, 3, 9), url, (1, 2)), "20250309_2_3.pdf");
    }

    #[test]
    fn alias_for_undated_session() {
        let url = format!("{SIEL}42");
        assert_eq!(derive_alias(None, &url, (0, 0)), "00000000_42.pdf");
    }

    #[test]
    fn non_numeric_id_parameter_is_skipped() {
        let url = "https://docs.example.org/get?ID=abc&rev=7";
        assert_eq!(file_id(url).as_deref(), Some("7"));
    }

    #[test]
    fn digits_in_site_path_are_not_an_id() {
        let url = "https://sieldocs.vd.ch/ecm/app18/service/siel/getContent?ID=abc";
        assert_eq!(file_id(url), None);
    }

    #[test]
    fn non_numeric_ids_get_distinct_aliases() {
        let drafts = vec![DiscussionDraft {
            title: "Postulats".to_string(),
            files: vec![
                FileDraft {
                    url: format!("{SIEL}abc"),
                    name: "25_POS_17.pdf".to_string(),
                },
                FileDraft {
                    url: format!("{SIEL}def"),
                    name: "25_POS_18.pdf".to_string(),
                },
            ],
        }];

        let discussions = assign_aliases(date(2025, 6, 18), drafts);
        let aliases: Vec<_> = discussions[0].files.iter().map(|f| f.alias.as_str()).collect();
        assert_eq!(aliases, ["20250618_1_1.pdf", "20250618_1_2.pdf"]);
    }

    #[test]
    fn assign_aliases_keeps_order() {
        let drafts = vec![
            DiscussionDraft {
                title: "Postulats".to_string(),
                files: vec![
                    FileDraft {
                        url: format!("{SIEL}123"),
                        name: "25_POS_17.pdf".to_string(),
                    },
                    FileDraft {
                        url: format!("{SIEL}456"),
                        name: "25_RAP_3.pdf".to_string(),
                    },
                ],
            },
            DiscussionDraft {
                title: "Divers".to_string(),
                files: vec![],
            },
        ];

        let discussions = assign_aliases(date(2025, 1, 1), drafts);
        assert_eq!(discussions.len(), 2);
        let aliases: Vec<_> = discussions[0].files.iter().map(|f| f.alias.as_str()).collect();
        assert_eq!(aliases, ["20250101_123.pdf", "20250101_456.pdf"]);
        assert_eq!(discussions[0].files[1].name, "25_RAP_3.pdf");
        assert!(discussions[1].files.is_empty());
    }

    #[test]
    fn filter_by_pattern() {
        let patterns = vec!["_POS_".to_string()];
        assert!(matches_patterns("25_POS_17.pdf", &patterns));
        assert!(!matches_patterns("25_RAP_3.pdf", &patterns));
        assert!(!matches_patterns("25_pos_17.pdf", &patterns));
    }

    #[test]
    fn empty_patterns_accept_everything() {
        assert!(matches_patterns("25_POS_17.pdf", &[]));
        assert!(matches_patterns("25_RAP_3.pdf", &[]));
    }

    #[test]
    fn any_pattern_is_enough() {
        let patterns = vec!["_POS_".to_string(), "_RAP_".to_string()];
        assert!(matches_patterns("25_RAP_3.pdf", &patterns));
    }

    proptest! {
        #[test]
        fn alias_is_stable(id in 1u32..10_000_000, d in 0usize..20, f in 0usize..20) {
            let url = format!("{SIEL}{id}");
            let first = derive_alias(date(2024, 5, 17), &url, (d, f));
            let second = derive_alias(date(2024, 5, 17), &url, (d, f));
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first, format!("20240517_{id}.pdf"));
        }
    }
}
