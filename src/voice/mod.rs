//! Deterministic grammar for voice corrections to OPEN bills.
//!
//! The LLM only ever produces structured item payloads; the correction
//! commands themselves ("change cement quantity to 5", "remove fevicol")
//! are parsed locally so edits stay predictable and testable.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum BillCommand {
    SetQuantity { item: String, value: f64 },
    SetRate { item: String, value: f64 },
    RemoveItem { item: String },
}

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:change|set)\s+(.+?)\s+quantity\s+to\s+(\d+(?:\.\d+)?)").unwrap()
});
static RATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:change|set)\s+(.+?)\s+rate\s+to\s+(\d+(?:\.\d+)?)").unwrap()
});
static REMOVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:remove|delete)\s+(.+)").unwrap());

/// Parse a spoken correction. Input is lower-cased and spoken Hindi
/// numbers are normalized first, so "change cement rate to teen sau"
/// resolves to 300. Remove beats rate beats quantity when several
/// patterns hit the same text.
pub fn parse_command(input: &str) -> Option<BillCommand> {
    let command = normalize_spoken_numbers(&input.to_lowercase());

    if let Some(caps) = REMOVE_RE.captures(&command) {
        return Some(BillCommand::RemoveItem {
            item: caps[1].trim().to_string(),
        });
    }

    if let Some(caps) = RATE_RE.captures(&command) {
        return Some(BillCommand::SetRate {
            item: caps[1].trim().to_string(),
            value: caps[2].parse().ok()?,
        });
    }

    if let Some(caps) = QUANTITY_RE.captures(&command) {
        return Some(BillCommand::SetQuantity {
            item: caps[1].trim().to_string(),
            value: caps[2].parse().ok()?,
        });
    }

    None
}

fn number_word(word: &str) -> Option<u32> {
    let n = match word {
        "ek" => 1,
        "do" => 2,
        "teen" => 3,
        "char" | "chaar" => 4,
        "paanch" | "panch" => 5,
        "chhe" => 6,
        "saat" => 7,
        "aath" => 8,
        "nau" => 9,
        "das" => 10,
        "gyarah" => 11,
        "barah" => 12,
        _ => return None,
    };
    Some(n)
}

fn multiplier_word(word: &str) -> Option<u32> {
    match word {
        "sau" => Some(100),
        "hazaar" => Some(1000),
        _ => None,
    }
}

// "rate" is meaningful to the command grammar, so it is not a filler here.
fn is_filler(word: &str) -> bool {
    matches!(word, "rupaye" | "rupees" | "rs" | "ka" | "ke" | "mein")
}

/// Rewrite spoken Hindi numerals as digits: "do sau" -> "200",
/// "barah" -> "12". Filler words around amounts are dropped.
pub fn normalize_spoken_numbers(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let mut result: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;

    while i < words.len() {
        let word = words[i];

        if let Some(n) = number_word(word) {
            // "barah sau" -> 1200
            if let Some(mult) = words.get(i + 1).and_then(|w| multiplier_word(w)) {
                result.push((n * mult).to_string());
                i += 2;
                continue;
            }
            result.push(n.to_string());
            i += 1;
            continue;
        }

        if is_filler(word) {
            i += 1;
            continue;
        }

        result.push(word.to_string());
        i += 1;
    }

    result.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plain_numbers() {
        assert_eq!(normalize_spoken_numbers("do"), "2");
        assert_eq!(normalize_spoken_numbers("chaar bori"), "4 bori");
    }

    #[test]
    fn normalizes_multiplied_numbers() {
        assert_eq!(normalize_spoken_numbers("do sau"), "200");
        assert_eq!(normalize_spoken_numbers("barah sau"), "1200");
        assert_eq!(normalize_spoken_numbers("paanch hazaar"), "5000");
    }

    #[test]
    fn drops_filler_words() {
        assert_eq!(normalize_spoken_numbers("do sau rupaye ka cement"), "200 cement");
    }

    #[test]
    fn leaves_unknown_text_alone() {
        assert_eq!(normalize_spoken_numbers("Cement 50 KG"), "cement 50 kg");
    }

    #[test]
    fn parses_quantity_change() {
        assert_eq!(
            parse_command("change cement quantity to 5"),
            Some(BillCommand::SetQuantity {
                item: "cement".into(),
                value: 5.0
            })
        );
        assert_eq!(
            parse_command("set white paint quantity to 2.5"),
            Some(BillCommand::SetQuantity {
                item: "white paint".into(),
                value: 2.5
            })
        );
    }

    #[test]
    fn parses_rate_change() {
        assert_eq!(
            parse_command("set cement rate to 320"),
            Some(BillCommand::SetRate {
                item: "cement".into(),
                value: 320.0
            })
        );
    }

    #[test]
    fn parses_spoken_rate_value() {
        assert_eq!(
            parse_command("change cement rate to teen sau"),
            Some(BillCommand::SetRate {
                item: "cement".into(),
                value: 300.0
            })
        );
    }

    #[test]
    fn parses_removal() {
        assert_eq!(
            parse_command("remove fevicol"),
            Some(BillCommand::RemoveItem {
                item: "fevicol".into()
            })
        );
        assert_eq!(
            parse_command("delete white paint"),
            Some(BillCommand::RemoveItem {
                item: "white paint".into()
            })
        );
    }

    #[test]
    fn unparseable_commands_yield_none() {
        assert_eq!(parse_command("make it cheaper"), None);
        assert_eq!(parse_command(""), None);
    }
}
