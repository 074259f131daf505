mod error;
mod grammar;

pub use error::ParseError;

use solvereign_config::ParserWhitelistConfig;
use solvereign_core::{hash::input_hash, ParseStatus, TourTemplate};

/// Outcome of parsing a single forecast line. `canonical` is `Some` only for
/// PASS/WARN lines — it is the pipe-joined form fed, after sorting, into
/// `input_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub line_no: usize,
    pub raw: String,
    pub status: ParseStatus,
    pub canonical: Option<String>,
    pub message: Option<String>,
}

impl ParsedLine {
    fn pass(line_no: usize, raw: &str, canonical: String) -> Self {
        ParsedLine {
            line_no,
            raw: raw.to_string(),
            status: ParseStatus::Pass,
            canonical: Some(canonical),
            message: None,
        }
    }

    fn warn(line_no: usize, raw: &str, canonical: String, message: String) -> Self {
        ParsedLine {
            line_no,
            raw: raw.to_string(),
            status: ParseStatus::Warn,
            canonical: Some(canonical),
            message: Some(message),
        }
    }

    fn fail(line_no: usize, raw: &str, message: String) -> Self {
        ParsedLine {
            line_no,
            raw: raw.to_string(),
            status: ParseStatus::Fail,
            canonical: None,
            message: Some(message),
        }
    }
}

/// Full result of parsing a forecast document.
#[derive(Debug, Clone)]
pub struct ForecastParseReport {
    pub lines: Vec<ParsedLine>,
    pub templates: Vec<TourTemplate>,
    pub canonical_lines: Vec<String>,
    pub input_hash: String,
    pub fail_count: usize,
    pub warn_count: usize,
}

/// Strips `\r`, C0 control characters other than `\n`, and trims trailing
/// whitespace from each line; blank lines and lines starting with `#` are
/// dropped entirely.
fn canonicalize(raw_text: &str) -> Vec<String> {
    raw_text
        .replace("\r\n", "\n")
        .lines()
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_control() || *c == '\t')
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Parses a raw forecast document against the whitelist grammar, producing a
/// per-line PASS/WARN/FAIL report, the expanded template set from usable
/// lines, and the canonical `input_hash`.
pub fn parse_forecast(
    raw_text: &str,
    whitelist: &ParserWhitelistConfig,
) -> Result<ForecastParseReport, ParseError> {
    let canonical_lines = canonicalize(raw_text);
    if canonical_lines.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut lines = Vec::with_capacity(canonical_lines.len());
    let mut templates = Vec::new();
    let mut fail_count = 0;
    let mut warn_count = 0;
    let mut hash_inputs: Vec<String> = Vec::new();

    for (idx, raw) in canonical_lines.iter().enumerate() {
        let (parsed, line_templates) = grammar::parse_line(idx, raw, whitelist);
        match parsed.status {
            ParseStatus::Fail => fail_count += 1,
            ParseStatus::Warn => warn_count += 1,
            ParseStatus::Pass => {}
        }
        if let Some(canonical) = &parsed.canonical {
            hash_inputs.push(canonical.clone());
        }
        templates.extend(line_templates);
        lines.push(parsed);
    }

    if fail_count == canonical_lines.len() {
        return Err(ParseError::NoUsableLines);
    }

    hash_inputs.sort();
    let input_hash = input_hash(&hash_inputs);

    Ok(ForecastParseReport {
        lines,
        templates,
        canonical_lines,
        input_hash,
        fail_count,
        warn_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> ParserWhitelistConfig {
        ParserWhitelistConfig::default()
    }

    #[test]
    fn parses_a_clean_line() {
        let report = parse_forecast("Mo 06:00-14:00 3 Fahrer", &whitelist()).unwrap();
        assert_eq!(report.fail_count, 0);
        assert_eq!(report.templates.len(), 1);
        assert_eq!(report.templates[0].count, 3);
    }

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        let text = "# weekly forecast\n\nMo 06:00-14:00 1 Fahrer\n# trailing note\n";
        let report = parse_forecast(text, &whitelist()).unwrap();
        assert_eq!(report.canonical_lines.len(), 1);
        assert_eq!(report.fail_count, 0);
    }

    #[test]
    fn unknown_day_fails() {
        let report = parse_forecast("Xx 08:00-16:00 1 Fahrer", &whitelist()).unwrap();
        assert_eq!(report.fail_count, 1);
        assert!(report.templates.is_empty());
    }

    #[test]
    fn high_count_warns_but_still_expands() {
        let report = parse_forecast("Mo 08:00-16:00 11 Fahrer", &whitelist()).unwrap();
        assert_eq!(report.warn_count, 1);
        assert_eq!(report.templates[0].count, 11);
    }

    #[test]
    fn input_hash_is_stable_across_identical_runs() {
        let text = "Mo 06:00-14:00 3 Fahrer\nDi 09:00-17:00 2 Fahrer";
        let a = parse_forecast(text, &whitelist()).unwrap();
        let b = parse_forecast(text, &whitelist()).unwrap();
        assert_eq!(a.input_hash, b.input_hash);
    }

    #[test]
    fn input_hash_is_independent_of_line_order() {
        let forward = "Mo 06:00-14:00 1 Fahrer\nDi 09:00-17:00 1 Fahrer";
        let backward = "Di 09:00-17:00 1 Fahrer\nMo 06:00-14:00 1 Fahrer";
        let a = parse_forecast(forward, &whitelist()).unwrap();
        let b = parse_forecast(backward, &whitelist()).unwrap();
        assert_eq!(a.input_hash, b.input_hash);
    }

    #[test]
    fn all_failing_lines_is_an_error() {
        let result = parse_forecast("garbage line here", &whitelist());
        assert!(matches!(result, Err(ParseError::NoUsableLines)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn day_token() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("Mo"),
            Just("Di"),
            Just("Mi"),
            Just("Do"),
            Just("Fr"),
            Just("Sa"),
            Just("So"),
        ]
    }

    fn forecast_line() -> impl Strategy<Value = (&'static str, u32, u32, u32)> {
        (day_token(), 0u32..23, 0u32..59, 1u32..20)
    }

    proptest! {
        /// Parsing the same well-formed line twice always yields the same
        /// `input_hash`, regardless of its content.
        #[test]
        fn parsing_is_deterministic((day, hour, count_val, minute) in forecast_line()) {
            let start_hour = hour;
            let end_hour = (hour + 2) % 24;
            let line = format!(
                "{} {:02}:{:02}-{:02}:{:02} {} Fahrer",
                day, start_hour, minute % 60, end_hour, minute % 60, count_val
            );
            let whitelist = ParserWhitelistConfig::default();
            let a = parse_forecast(&line, &whitelist).unwrap();
            let b = parse_forecast(&line, &whitelist).unwrap();
            prop_assert_eq!(a.input_hash, b.input_hash);
            prop_assert_eq!(a.templates.len(), b.templates.len());
        }

        /// A single well-formed PASS/WARN line always expands into exactly
        /// one template carrying the parsed `count`.
        #[test]
        fn expansion_multiplicity_matches_count((day, hour, count_val, minute) in forecast_line()) {
            let start_hour = hour;
            let end_hour = (hour + 2) % 24;
            let line = format!(
                "{} {:02}:{:02}-{:02}:{:02} {} Fahrer",
                day, start_hour, minute % 60, end_hour, minute % 60, count_val
            );
            let whitelist = ParserWhitelistConfig::default();
            let report = parse_forecast(&line, &whitelist).unwrap();
            prop_assert_eq!(report.fail_count, 0);
            prop_assert_eq!(report.templates.len(), 1);
            prop_assert_eq!(report.templates[0].count, count_val);
        }
    }
}
