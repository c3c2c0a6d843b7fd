use crate::signs::mappings::SignCombo;
use crate::signs::sign::{SignId, SignLabels};
use crate::signs::tables::SignTables;
use crate::signs::techniques::Locale;

/// Number of ASCII codes covered by the two-sign code table.
pub const ASCII_CODES: usize = 128;

fn combo_label(labels: &SignLabels, combo: &SignCombo) -> String {
    combo
        .signs()
        .iter()
        .map(|sign| labels.label(*sign))
        .collect::<Vec<_>>()
        .join(">")
}

fn chord_label(keys: &[String]) -> String {
    keys.iter()
        .map(|key| {
            let mut chars = key.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("+")
}

/// One line per binding, grouped by table in search order. Technique names
/// follow `locale`.
pub fn format_cheat_sheet(tables: &SignTables, locale: Locale) -> String {
    let labels = &tables.labels;
    let mut lines = Vec::new();

    lines.push("Words".to_string());
    let mut words: Vec<_> = tables.actions.words().iter().collect();
    words.sort_by_key(|(combo, _)| **combo);
    for (combo, text) in words {
        lines.push(format!("  {} -> {text}", combo_label(labels, combo)));
    }

    lines.push("Special keys".to_string());
    let mut keys: Vec<_> = tables.actions.special_keys().iter().collect();
    keys.sort_by_key(|(combo, _)| **combo);
    for (combo, key) in keys {
        let key = match key {
            Some(key) => chord_label(std::slice::from_ref(key)),
            None => "(release)".to_string(),
        };
        lines.push(format!("  {} -> {key}", combo_label(labels, combo)));
    }

    lines.push("Shortcuts".to_string());
    let mut shortcuts: Vec<_> = tables.actions.shortcuts().iter().collect();
    shortcuts.sort_by_key(|(combo, _)| **combo);
    for (combo, chord) in shortcuts {
        lines.push(format!("  {} -> {}", combo_label(labels, combo), chord_label(chord)));
    }

    if !tables.techniques.is_empty() {
        lines.push("Techniques".to_string());
        for technique in tables.techniques.iter() {
            lines.push(format!(
                "  {} -> {}",
                technique.pattern.join(">"),
                technique.name.get(locale)
            ));
        }
    }

    lines.join("\n")
}

/// Ordered pairs of known signs assigned to ASCII codes 0..128, row-major
/// over the signs sorted by id.
pub fn ascii_code_table(labels: &SignLabels) -> Vec<(u8, [SignId; 2])> {
    let signs: Vec<SignId> = labels.iter().map(|(id, _)| id).collect();
    signs
        .iter()
        .flat_map(|first| signs.iter().map(move |second| [*first, *second]))
        .take(ASCII_CODES)
        .enumerate()
        .map(|(code, pair)| (code as u8, pair))
        .collect()
}

pub fn format_ascii_table(labels: &SignLabels) -> String {
    ascii_code_table(labels)
        .into_iter()
        .map(|(code, [first, second])| {
            format!(
                "ASCII {code}: {} -> {}{}",
                char::from(code).escape_default(),
                labels.label(first),
                labels.label(second)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheat_sheet_lists_builtin_bindings() {
        let tables = SignTables::builtin().expect("builtin");
        let text = format_cheat_sheet(&tables, Locale::Native);
        assert!(text.contains("  巳 -> hello"));
        assert!(text.contains("  戌 -> Space"));
        assert!(text.contains("  ? -> Ctrl+Enter"));
        assert!(text.contains("  酉 -> Ctrl+O"));
    }

    #[test]
    fn technique_names_follow_the_locale() {
        let tables = SignTables::builtin().expect("builtin");

        let native = format_cheat_sheet(&tables, Locale::Native);
        assert!(native.contains("  巳>未>申>亥>午>寅 -> 豪火球の術"));
        assert!(!native.contains("Great Fireball Technique"));

        let english = format_cheat_sheet(&tables, Locale::English);
        assert!(english.contains("  巳>未>申>亥>午>寅 -> Great Fireball Technique"));
    }

    #[test]
    fn ascii_table_covers_128_codes() {
        let tables = SignTables::builtin().expect("builtin");
        let table = ascii_code_table(&tables.labels);
        assert_eq!(table.len(), ASCII_CODES);
        assert_eq!(table[0], (0, [SignId(1), SignId(1)]));
        assert_eq!(table[13], (13, [SignId(2), SignId(2)]));
        assert_eq!(table[127], (127, [SignId(11), SignId(8)]));

        let text = format_ascii_table(&tables.labels);
        assert!(text.contains("ASCII 65: A -> 巳巳"));
    }
}
