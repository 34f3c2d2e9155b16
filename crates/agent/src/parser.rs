//! Rule-based extraction of a [`FilterSet`] from a free-text housing request.
//!
//! Each field has its own matcher over a [`NormalizedUtterance`]. Matchers do
//! not look at each other's output, so a new amenity keyword never touches
//! price or bedroom handling. Parsing is total: text with nothing
//! recognizable yields an empty filter set.

use std::collections::BTreeSet;

use homefinder_core::domain::filter::FilterSet;
use homefinder_core::domain::language::LANGUAGE_ALIASES;
use homefinder_core::store::ListingStore;

const PRICE_CUES_BEFORE: &[&str] =
    &["under", "below", "max", "maximum", "budget", "than", "upto", "up", "within", "$"];
const PRICE_CUES_AFTER: &[&str] = &["mo", "month", "monthly", "max", "budget", "rent"];
const PRICE_FILLERS: &[&str] = &["of", "is", "to", "around", "about", "at"];
const BEDROOM_WORDS: &[&str] = &["bed", "beds", "bedroom", "bedrooms", "br", "bd", "bds"];
/// Units that turn a nearby number into a distance, time or count instead of rent.
const NON_RENT_UNITS: &[&str] = &[
    "mile", "miles", "mi", "minute", "minutes", "min", "mins", "block", "blocks", "bath", "baths",
    "bathroom", "bathrooms", "ba", "ft", "feet", "sqft",
];
const MIN_RENT_DIGITS: usize = 3;
const MAX_BEDROOMS: u32 = 20;

const US_STATES: &[(&str, &str)] = &[
    ("AL", "alabama"),
    ("AK", "alaska"),
    ("AZ", "arizona"),
    ("AR", "arkansas"),
    ("CA", "california"),
    ("CO", "colorado"),
    ("CT", "connecticut"),
    ("DE", "delaware"),
    ("DC", "district of columbia"),
    ("FL", "florida"),
    ("GA", "georgia"),
    ("HI", "hawaii"),
    ("ID", "idaho"),
    ("IL", "illinois"),
    ("IN", "indiana"),
    ("IA", "iowa"),
    ("KS", "kansas"),
    ("KY", "kentucky"),
    ("LA", "louisiana"),
    ("ME", "maine"),
    ("MD", "maryland"),
    ("MA", "massachusetts"),
    ("MI", "michigan"),
    ("MN", "minnesota"),
    ("MS", "mississippi"),
    ("MO", "missouri"),
    ("MT", "montana"),
    ("NE", "nebraska"),
    ("NV", "nevada"),
    ("NH", "new hampshire"),
    ("NJ", "new jersey"),
    ("NM", "new mexico"),
    ("NY", "new york"),
    ("NC", "north carolina"),
    ("ND", "north dakota"),
    ("OH", "ohio"),
    ("OK", "oklahoma"),
    ("OR", "oregon"),
    ("PA", "pennsylvania"),
    ("RI", "rhode island"),
    ("SC", "south carolina"),
    ("SD", "south dakota"),
    ("TN", "tennessee"),
    ("TX", "texas"),
    ("UT", "utah"),
    ("VT", "vermont"),
    ("VA", "virginia"),
    ("WA", "washington"),
    ("WV", "west virginia"),
    ("WI", "wisconsin"),
    ("WY", "wyoming"),
];

/// Lower-cased, trimmed text plus its tokens. Every matcher works on this
/// form, so casing never changes the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedUtterance {
    pub text: String,
    pub tokens: Vec<String>,
}

impl NormalizedUtterance {
    pub fn new(utterance: &str) -> Self {
        let text = utterance.trim().to_lowercase();
        let tokens = tokenize(&text);
        Self { text, tokens }
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueryParser {
    /// (lower-cased, display) pairs, longest first.
    cities: Vec<(String, String)>,
    states: Vec<String>,
    zip_codes: BTreeSet<String>,
}

impl QueryParser {
    pub fn new<C, S, Z>(cities: C, states: S, zip_codes: Z) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
        Z: IntoIterator,
        Z::Item: Into<String>,
    {
        let mut cities = cities
            .into_iter()
            .map(Into::into)
            .map(|city: String| (city.trim().to_lowercase(), city.trim().to_string()))
            .filter(|(lowered, _)| !lowered.is_empty())
            .collect::<Vec<_>>();
        cities.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        cities.dedup_by(|a, b| a.0 == b.0);

        Self {
            cities,
            states: states.into_iter().map(Into::into).collect(),
            zip_codes: zip_codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parser whose city, state and zip vocabulary is what the store holds.
    pub fn from_store(store: &ListingStore) -> Self {
        Self::new(store.cities(), store.states(), store.zip_codes())
    }

    pub fn parse(&self, utterance: &str) -> FilterSet {
        let utterance = NormalizedUtterance::new(utterance);
        let tokens = &utterance.tokens;

        FilterSet {
            max_rent: extract_max_rent(tokens),
            min_bedrooms: extract_min_bedrooms(tokens),
            city: self.extract_city(&utterance.text),
            state: self.extract_state(&utterance),
            zip_code: self.extract_zip_code(tokens),
            language: extract_language(&utterance.text),
            section8_accepted: required(mentions_section8(tokens)),
            hud_approved: required(contains_any(tokens, &["hud"])),
            low_income_eligible: required(mentions_low_income(tokens)),
            nearby_transit: required(contains_any(
                tokens,
                &["transit", "bus", "buses", "train", "trains", "marta", "subway"],
            )),
            pets_allowed: required(contains_any(
                tokens,
                &["pet", "pets", "dog", "dogs", "cat", "cats"],
            )),
            accessibility: required(contains_any(
                tokens,
                &["wheelchair", "accessible", "accessibility", "disability", "disabled"],
            )),
            max_ami_percent: extract_ami_percent(tokens),
            top_n: None,
        }
    }

    fn extract_city(&self, text: &str) -> Option<String> {
        self.cities
            .iter()
            .find(|(lowered, _)| text.contains(lowered.as_str()))
            .map(|(_, display)| display.clone())
    }

    fn extract_state(&self, utterance: &NormalizedUtterance) -> Option<String> {
        let abbreviations = self.abbreviation_slots(utterance);
        self.states
            .iter()
            .find(|code| {
                let by_name = US_STATES
                    .iter()
                    .find(|(abbreviation, _)| abbreviation.eq_ignore_ascii_case(code))
                    .is_some_and(|(_, name)| contains_phrase(&utterance.tokens, name));
                by_name || abbreviations.iter().any(|token| token.eq_ignore_ascii_case(code))
            })
            .cloned()
    }

    /// Two-letter words sitting where a state abbreviation is written: right
    /// after a known city, right after a comma, or closing the text after
    /// "in". Elsewhere "in" and "me" stay plain words.
    fn abbreviation_slots<'a>(&self, utterance: &'a NormalizedUtterance) -> Vec<&'a str> {
        let tokens = &utterance.tokens;
        let mut slots = tokens
            .iter()
            .enumerate()
            .filter(|(index, token)| {
                let preceding = &tokens[..*index];
                let after_city =
                    self.cities.iter().any(|(city, _)| ends_with_phrase(preceding, city));
                let closing = *index + 1 == tokens.len()
                    && preceding.last().is_some_and(|previous| previous == "in");
                token.len() == 2 && (after_city || closing)
            })
            .map(|(_, token)| token.as_str())
            .collect::<Vec<_>>();

        slots.extend(
            utterance
                .text
                .split(',')
                .skip(1)
                .filter_map(|segment| segment.split_whitespace().next())
                .map(|word| word.trim_matches(|ch: char| !ch.is_alphanumeric()))
                .filter(|word| word.len() == 2),
        );
        slots
    }

    fn extract_zip_code(&self, tokens: &[String]) -> Option<String> {
        tokens
            .iter()
            .enumerate()
            .find(|(index, token)| {
                token.len() == 5
                    && token.chars().all(|ch| ch.is_ascii_digit())
                    && !price_cue_before(tokens, *index)
                    && self.zip_codes.contains(token.as_str())
            })
            .map(|(_, token)| token.clone())
    }
}

fn required(mentioned: bool) -> Option<bool> {
    mentioned.then_some(true)
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_alphanumeric() || matches!(character, '$' | '%' | '.' | ',') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized
        .split_whitespace()
        .map(|token| token.trim_matches(|ch: char| ch == ',' || ch == '.'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_any(tokens: &[String], words: &[&str]) -> bool {
    tokens.iter().any(|token| words.contains(&token.as_str()))
}

/// True when the whitespace-separated words of `phrase` appear as consecutive
/// tokens.
fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words = phrase.split_whitespace().collect::<Vec<_>>();
    !words.is_empty()
        && tokens.windows(words.len()).any(|window| {
            window.iter().zip(&words).all(|(token, word)| token == word)
        })
}

fn ends_with_phrase(tokens: &[String], phrase: &str) -> bool {
    let words = phrase.split_whitespace().collect::<Vec<_>>();
    let Some(start) = tokens.len().checked_sub(words.len()) else {
        return false;
    };
    !words.is_empty() && tokens[start..].iter().zip(&words).all(|(token, word)| token == word)
}

fn mentions_section8(tokens: &[String]) -> bool {
    contains_any(tokens, &["section8", "voucher", "vouchers"])
        || contains_phrase(tokens, "section 8")
}

fn mentions_low_income(tokens: &[String]) -> bool {
    contains_phrase(tokens, "low income")
        || contains_any(tokens, &["lowincome", "affordable", "cheap", "subsidized", "subsidised"])
}

fn extract_max_rent(tokens: &[String]) -> Option<u32> {
    for (index, token) in tokens.iter().enumerate() {
        if token == "$" {
            continue;
        }
        let next_is_unit = tokens.get(index + 1).is_some_and(|next| {
            BEDROOM_WORDS.contains(&next.as_str()) || NON_RENT_UNITS.contains(&next.as_str())
        });
        if next_is_unit || !looks_like_rent(token) {
            continue;
        }

        let cued = token.starts_with('$')
            || price_cue_before(tokens, index)
            || price_cue_after(tokens, index);
        if !cued {
            continue;
        }
        if let Some(amount) = parse_money_token(token) {
            return Some(amount);
        }
    }
    None
}

/// A number reads as rent with a `$` prefix, a `k` suffix, or at least three
/// digits. "1" in "within 1 mile" does not.
fn looks_like_rent(token: &str) -> bool {
    let digits = token.chars().take_while(|ch| *ch != '.').filter(char::is_ascii_digit).count();
    token.starts_with('$') || token.ends_with('k') || digits >= MIN_RENT_DIGITS
}

fn price_cue_before(tokens: &[String], index: usize) -> bool {
    let mut cursor = index;
    while cursor > 0 {
        cursor -= 1;
        let previous = tokens[cursor].as_str();
        if PRICE_CUES_BEFORE.contains(&previous) {
            return true;
        }
        if !PRICE_FILLERS.contains(&previous) {
            return false;
        }
    }
    false
}

fn price_cue_after(tokens: &[String], index: usize) -> bool {
    match tokens.get(index + 1).map(String::as_str) {
        Some("a" | "per") => {
            matches!(tokens.get(index + 2).map(String::as_str), Some("month" | "mo"))
        }
        Some(next) => PRICE_CUES_AFTER.contains(&next),
        None => false,
    }
}

/// Dollar amount from `$1,200`, `1200`, `$1.2k`. Anything else is `None`.
fn parse_money_token(token: &str) -> Option<u32> {
    let trimmed = token.trim_start_matches('$').replace(',', "");
    let (number_part, multiplier) = match trimmed.strip_suffix('k') {
        Some(prefix) => (prefix, 1_000.0),
        None => (trimmed.as_str(), 1.0),
    };
    if number_part.is_empty() || !number_part.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
    {
        return None;
    }

    let dollars = number_part.parse::<f64>().ok()? * multiplier;
    (dollars.is_finite() && dollars >= 0.0 && dollars <= f64::from(u32::MAX))
        .then(|| dollars.round() as u32)
}

fn extract_min_bedrooms(tokens: &[String]) -> Option<u32> {
    for (index, token) in tokens.iter().enumerate() {
        if token == "studio" || token == "studios" {
            return Some(0);
        }

        if let Some(count) = glued_bedroom_count(token) {
            return Some(count);
        }

        let next_is_bedroom =
            tokens.get(index + 1).is_some_and(|next| BEDROOM_WORDS.contains(&next.as_str()));
        if next_is_bedroom {
            if let Some(count) = small_number(token) {
                return Some(count);
            }
        }
    }
    None
}

/// `2br`, `3bed`, `1bedroom` and friends.
fn glued_bedroom_count(token: &str) -> Option<u32> {
    let digits_end = token.find(|ch: char| !ch.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let (digits, suffix) = token.split_at(digits_end);
    if !BEDROOM_WORDS.contains(&suffix) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|count| *count <= MAX_BEDROOMS)
}

fn small_number(token: &str) -> Option<u32> {
    let value = match token {
        "zero" => 0,
        "one" | "a" | "single" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => digits.parse::<u32>().ok()?,
    };
    (value <= MAX_BEDROOMS).then_some(value)
}

fn extract_ami_percent(tokens: &[String]) -> Option<u32> {
    for (index, token) in tokens.iter().enumerate() {
        let (number, rest_starts) = match token.strip_suffix('%') {
            Some(number) => (number, index + 1),
            None if matches!(
                tokens.get(index + 1).map(String::as_str),
                Some("percent" | "pct")
            ) =>
            {
                (token.as_str(), index + 2)
            }
            None => continue,
        };
        let Ok(percent) = number.parse::<u32>() else {
            continue;
        };

        let mentions_ami = tokens
            .iter()
            .skip(rest_starts)
            .take(4)
            .any(|next| next == "ami" || next == "median");
        if mentions_ami && (1..=200).contains(&percent) {
            return Some(percent);
        }
    }
    None
}

/// Language whose alias appears earliest in the text; on equal position the
/// longer alias wins.
fn extract_language(text: &str) -> Option<String> {
    LANGUAGE_ALIASES
        .iter()
        .filter_map(|(alias, canonical)| {
            text.find(alias).map(|position| (position, alias.len(), *canonical))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, _, canonical)| canonical.to_string())
}
