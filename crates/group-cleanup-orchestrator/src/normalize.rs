//! Base words of item-group names.
//!
//! Groups created over the years tend to share a stem ("Šaldytuvai",
//! "Saldytuvai_2024", "šaldytuvai (seni)"). Pruning looks for every group
//! sharing the stem of a group an item was moved out of.

/// Reduces a group name to the key used to find related groups.
pub trait CategoryKeyNormalizer: Send + Sync {
    /// Base word of `name`, or `None` when nothing is left after reduction.
    fn base_word(&self, name: &str) -> Option<String>;
}

/// Lower-case, ASCII-folded text up to the first separator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparatorBaseWord;

const SEPARATORS: &[char] = &['_', '-', '/', '(', ')', '[', ']', '.', ',', ';', ':'];

impl CategoryKeyNormalizer for SeparatorBaseWord {
    fn base_word(&self, name: &str) -> Option<String> {
        let folded: String = name.trim().to_lowercase().chars().map(fold_char).collect();
        let base = folded
            .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
            .next()
            .unwrap_or_default();
        (!base.is_empty()).then(|| base.to_string())
    }
}

/// Strip diacritics from a lower-case letter.
fn fold_char(c: char) -> char {
    match c {
        'ą' | 'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' => 'a',
        'č' | 'ç' | 'ć' => 'c',
        'ď' => 'd',
        'ę' | 'ė' | 'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'ğ' => 'g',
        'į' | 'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ř' => 'r',
        'š' | 'ś' | 'ş' => 's',
        'ť' => 't',
        'ų' | 'ū' | 'ù' | 'ú' | 'û' | 'ü' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        other => other,
    }
}
