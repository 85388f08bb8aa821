//! ModeList payload parser
//!
//! The device answers a ModeList read with INI-like Latin-1 text. Sections
//! named `[Mode-{<id>}]` describe acquisition modes; each contributes one
//! entry `"<id> - <name>"` where the name prefers the English variant.

use std::collections::HashSet;

#[derive(Default)]
struct Section {
    active: bool,
    id: String,
    name_en: String,
    name: String,
}

impl Section {
    fn flush(&mut self, out: &mut Vec<String>) {
        if self.active {
            let name = if self.name_en.is_empty() {
                &self.name
            } else {
                &self.name_en
            };
            let name = name.trim();

            if !name.is_empty() {
                if self.id.is_empty() {
                    out.push(name.to_string());
                } else {
                    out.push(format!("{} - {}", self.id, name));
                }
            }
        }

        *self = Section::default();
    }
}

/// Parse a ModeList payload into an ordered, deduplicated list of mode
/// descriptors. Malformed sections are skipped; this never fails.
pub fn parse_mode_list(data: &[u8]) -> Vec<String> {
    // Latin-1 text; the device may append binary padding after a NUL.
    let mut text: String = data.iter().map(|&b| b as char).collect();
    if let Some(nul) = text.find('\0') {
        text.truncate(nul);
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut result = Vec::new();
    let mut section = Section::default();

    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        // An XML tail marks the end of the textual config.
        if line.starts_with("<!--") {
            break;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section.flush(&mut result);

            section.active = line.starts_with("[Mode-");
            if section.active {
                // Section header form: [Mode-{00000001}]
                if let (Some(l), Some(r)) = (line.find('{'), line.find('}')) {
                    if r > l {
                        section.id = line[l + 1..r].trim().to_string();
                    }
                }
            }
            continue;
        }

        if !section.active {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            continue;
        }

        if key.eq_ignore_ascii_case("ModeName_en") {
            section.name_en = value.to_string();
        } else if key.eq_ignore_ascii_case("ModeName") {
            section.name = value.to_string();
        }
    }

    section.flush(&mut result);

    // De-dup while preserving first-seen order.
    let mut seen = HashSet::new();
    result
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_sections_with_preferred_names() {
        let payload =
            b"[Mode-{00000005}]\nModeName_en=Fast Scan\n[Mode-{00000006}]\nModeName=Slow\n";

        assert_eq!(
            parse_mode_list(payload),
            vec![
                "00000005 - Fast Scan".to_string(),
                "00000006 - Slow".to_string()
            ]
        );
    }

    #[test]
    fn test_english_name_preferred_over_plain() {
        let payload = b"[Mode-{01}]\nModeName=Schnell\nModeName_en=Fast\n";

        assert_eq!(parse_mode_list(payload), vec!["01 - Fast".to_string()]);
    }

    #[test]
    fn test_crlf_and_cr_normalisation() {
        let payload = b"[Mode-{01}]\r\nModeName_en=A\r[Mode-{02}]\r\nModeName_en=B\r\n";

        assert_eq!(
            parse_mode_list(payload),
            vec!["01 - A".to_string(), "02 - B".to_string()]
        );
    }

    #[test]
    fn test_truncated_at_first_nul() {
        let payload = b"[Mode-{01}]\nModeName_en=A\n\0[Mode-{02}]\nModeName_en=B\n";

        assert_eq!(parse_mode_list(payload), vec!["01 - A".to_string()]);
    }

    #[test]
    fn test_comments_and_foreign_sections_ignored() {
        let payload = b"; global comment\n[General]\nModeName_en=Nope\n[Mode-{03}]\n; note\nModeName_en=Real\n";

        assert_eq!(parse_mode_list(payload), vec!["03 - Real".to_string()]);
    }

    #[test]
    fn test_xml_tail_terminates_parsing() {
        let payload =
            b"[Mode-{01}]\nModeName_en=A\n<!--<paramDescription>\n[Mode-{02}]\nModeName_en=B\n";

        assert_eq!(parse_mode_list(payload), vec!["01 - A".to_string()]);
    }

    #[test]
    fn test_duplicates_removed_preserving_order() {
        let payload = b"[Mode-{01}]\nModeName_en=A\n[Mode-{02}]\nModeName_en=B\n[Mode-{01}]\nModeName_en=A\n";

        assert_eq!(
            parse_mode_list(payload),
            vec!["01 - A".to_string(), "02 - B".to_string()]
        );
    }

    #[test]
    fn test_sections_without_names_skipped() {
        let payload = b"[Mode-{01}]\nOtherKey=1\n[Mode-{02}]\nModeName_en=  \n[Mode-{03}]\nModeName_en=Ok\n";

        assert_eq!(parse_mode_list(payload), vec!["03 - Ok".to_string()]);
    }

    #[test]
    fn test_parse_is_idempotent_over_trailing_nul() {
        let bare = b"[Mode-{01}]\nModeName_en=A\n";
        let with_nul = b"[Mode-{01}]\nModeName_en=A\n\0\0\0";

        assert_eq!(parse_mode_list(bare), parse_mode_list(with_nul));
    }

    #[test]
    fn test_latin1_high_bytes_survive() {
        // 0xE9 is 'é' in Latin-1
        let payload = b"[Mode-{01}]\nModeName=Expos\xE9\n";

        assert_eq!(parse_mode_list(payload), vec!["01 - Expos\u{e9}".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_mode_list(b""), Vec::<String>::new());
    }
}
