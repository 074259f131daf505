use solvereign_config::{german_day_token, ParserWhitelistConfig};
use solvereign_core::{Day, TourTemplate};

use crate::ParsedLine;

/// `LINE := DAY WS TIME "-" TIME [WS "+" WS TIME "-" TIME]
///          [WS COUNT WS "Fahrer"] [WS DEPOT] [WS SKILL]`
///
/// Tokens are split on whitespace and consumed left to right; everything
/// after the optional split range is positional-but-optional, so a line may
/// carry zero, one, or two trailing tokens (depot, then skill).
struct Tokens<'a> {
    day_token: &'a str,
    primary: TimeRange,
    split: Option<TimeRange>,
    count: u32,
    depot: Option<&'a str>,
    skill: Option<&'a str>,
}

#[derive(Clone, Copy)]
struct TimeRange {
    start_min: u32,
    end_min: u32,
}

/// Parses a single canonicalized forecast line against the whitelist
/// grammar. Returns `(ParsedLine, Vec<TourTemplate>)`; the template vector is
/// empty unless the line is PASS or WARN. A split-notation line produces two
/// templates, one per leg, each carrying the line's full `count`.
pub fn parse_line(
    line_no: usize,
    raw: &str,
    whitelist: &ParserWhitelistConfig,
) -> (ParsedLine, Vec<TourTemplate>) {
    let fields: Vec<&str> = raw.split_whitespace().collect();
    if fields.is_empty() {
        return (ParsedLine::fail(line_no, raw, "empty line".to_string()), Vec::new());
    }

    let tokens = match tokenize(&fields) {
        Ok(t) => t,
        Err(reason) => return (ParsedLine::fail(line_no, raw, reason), Vec::new()),
    };

    let day = match whitelist.day_aliases.get(&tokens.day_token.to_uppercase()) {
        Some(day) => *day,
        None => {
            return (
                ParsedLine::fail(line_no, raw, format!("unknown day token '{}'", tokens.day_token)),
                Vec::new(),
            )
        }
    };

    if tokens.primary.end_min == tokens.primary.start_min {
        return (
            ParsedLine::fail(line_no, raw, "time range start equals end".to_string()),
            Vec::new(),
        );
    }
    if let Some(split) = tokens.split {
        if split.end_min == split.start_min {
            return (
                ParsedLine::fail(line_no, raw, "split time range start equals end".to_string()),
                Vec::new(),
            );
        }
    }

    if let Some(depot) = tokens.depot {
        if !whitelist.depot_dictionary.is_empty() && !whitelist.depot_dictionary.contains(depot) {
            return (
                ParsedLine::fail(line_no, raw, format!("unknown depot '{}'", depot)),
                Vec::new(),
            );
        }
    }
    if let Some(skill) = tokens.skill {
        if !whitelist.skill_dictionary.is_empty() && !whitelist.skill_dictionary.contains(skill) {
            return (
                ParsedLine::fail(line_no, raw, format!("unknown skill '{}'", skill)),
                Vec::new(),
            );
        }
    }

    if tokens.count == 0 {
        return (
            ParsedLine::fail(line_no, raw, "count must be positive".to_string()),
            Vec::new(),
        );
    }

    let templates = build_templates(line_no, day, &tokens);
    let canonical = canonical_line(day, &tokens);
    let span_min = span_of(&tokens);

    if tokens.count > whitelist.high_count_threshold {
        return (
            ParsedLine::warn(
                line_no,
                raw,
                canonical,
                format!(
                    "count {} exceeds high-count threshold {}",
                    tokens.count, whitelist.high_count_threshold
                ),
            ),
            templates,
        );
    }

    if span_min > 12 * 60 {
        return (
            ParsedLine::warn(
                line_no,
                raw,
                canonical,
                format!("span {} minutes exceeds 12h", span_min),
            ),
            templates,
        );
    }

    (ParsedLine::pass(line_no, raw, canonical), templates)
}

/// Total span in minutes from the earliest leg's start to the latest leg's
/// end, used only for the WARN(span > 12h) rule.
fn span_of(tokens: &Tokens) -> u32 {
    let primary_duration = leg_duration(tokens.primary);
    match tokens.split {
        None => primary_duration,
        Some(split) => {
            let gap = if split.start_min >= tokens.primary.end_min {
                split.start_min - tokens.primary.end_min
            } else {
                (split.start_min + 24 * 60) - tokens.primary.end_min
            };
            primary_duration + gap + leg_duration(split)
        }
    }
}

fn leg_duration(range: TimeRange) -> u32 {
    if range.end_min <= range.start_min {
        range.end_min + 24 * 60 - range.start_min
    } else {
        range.end_min - range.start_min
    }
}

fn tokenize<'a>(fields: &[&'a str]) -> Result<Tokens<'a>, String> {
    let day_token = fields[0];
    let primary = fields
        .get(1)
        .ok_or_else(|| "missing time range".to_string())
        .and_then(|f| parse_time_range(f))?;

    let mut idx = 2;
    let mut split = None;
    if fields.get(idx) == Some(&"+") {
        idx += 1;
        let range_field = fields
            .get(idx)
            .ok_or_else(|| "'+' not followed by a time range".to_string())?;
        split = Some(parse_time_range(range_field)?);
        idx += 1;
    }

    let mut count = 1u32;
    if let (Some(count_field), Some(keyword_field)) = (fields.get(idx), fields.get(idx + 1)) {
        if keyword_field.eq_ignore_ascii_case("fahrer") {
            if let Ok(parsed_count) = count_field.parse::<u32>() {
                count = parsed_count;
                idx += 2;
            }
        }
    }

    let remaining = &fields[idx..];
    if remaining.len() > 2 {
        return Err(format!("unexpected trailing tokens: {}", remaining.join(" ")));
    }
    let depot = remaining.first().copied();
    let skill = remaining.get(1).copied();

    Ok(Tokens {
        day_token,
        primary,
        split,
        count,
        depot,
        skill,
    })
}

fn parse_time_range(field: &str) -> Result<TimeRange, String> {
    let (start, end) = field
        .split_once('-')
        .ok_or_else(|| format!("invalid time range '{}', expected HH:MM-HH:MM", field))?;
    Ok(TimeRange {
        start_min: parse_hhmm(start)?,
        end_min: parse_hhmm(end)?,
    })
}

fn parse_hhmm(field: &str) -> Result<u32, String> {
    let (h, m) = field
        .split_once(':')
        .ok_or_else(|| format!("invalid time field '{}', expected HH:MM", field))?;
    let hours: u32 = h.parse().map_err(|_| format!("invalid hour in '{}'", field))?;
    let minutes: u32 = m.parse().map_err(|_| format!("invalid minute in '{}'", field))?;
    if hours >= 24 || minutes >= 60 {
        return Err(format!("time field '{}' out of range", field));
    }
    Ok(hours * 60 + minutes)
}

/// A split-notation line becomes two templates, one per leg, each carrying
/// the full `count`; the generic TWO_SPLIT gap-band detection in the block
/// builder pairs their instances back up once expanded.
fn build_templates(line_no: usize, day: Day, tokens: &Tokens) -> Vec<TourTemplate> {
    let mut templates = vec![TourTemplate {
        template_id: format!("T{:05}-A", line_no),
        day,
        start_min: tokens.primary.start_min,
        end_min: tokens.primary.end_min,
        depot: tokens.depot.map(str::to_string),
        skill: tokens.skill.map(str::to_string),
        count: tokens.count,
    }];

    if let Some(split) = tokens.split {
        templates.push(TourTemplate {
            template_id: format!("T{:05}-B", line_no),
            day,
            start_min: split.start_min,
            end_min: split.end_min,
            depot: tokens.depot.map(str::to_string),
            skill: tokens.skill.map(str::to_string),
            count: tokens.count,
        });
    }

    templates
}

/// Canonical pipe-form: `DAY|START-END|[SPLIT]|count|depot|skill`, used to
/// compute `input_hash` after sorting lexicographically across every
/// PASS/WARN line.
fn canonical_line(day: Day, tokens: &Tokens) -> String {
    let split = match tokens.split {
        Some(r) => format!("{:02}:{:02}-{:02}:{:02}", r.start_min / 60, r.start_min % 60, r.end_min / 60, r.end_min % 60),
        None => String::new(),
    };
    format!(
        "{}|{:02}:{:02}-{:02}:{:02}|{}|{}|{}|{}",
        german_day_token(day),
        tokens.primary.start_min / 60,
        tokens.primary.start_min % 60,
        tokens.primary.end_min / 60,
        tokens.primary.end_min % 60,
        split,
        tokens.count,
        tokens.depot.unwrap_or(""),
        tokens.skill.unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> ParserWhitelistConfig {
        ParserWhitelistConfig::default()
    }

    #[test]
    fn parses_minimal_line() {
        let (parsed, templates) = parse_line(0, "Mo 06:00-14:00 1 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Pass);
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].count, 1);
        assert_eq!(templates[0].start_min, 360);
        assert_eq!(templates[0].end_min, 840);
    }

    #[test]
    fn day_token_is_case_insensitive() {
        let (parsed, _) = parse_line(0, "mo 06:00-14:00 1 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Pass);
    }

    #[test]
    fn split_notation_produces_two_templates() {
        let (parsed, templates) = parse_line(0, "Mo 06:00-10:00 + 15:00-19:00 1 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Pass);
        assert_eq!(templates.len(), 2);
        assert_eq!((templates[0].start_min, templates[0].end_min), (360, 600));
        assert_eq!((templates[1].start_min, templates[1].end_min), (900, 1140));
    }

    #[test]
    fn depot_and_skill_are_optional_trailing_tokens() {
        let (parsed, templates) = parse_line(0, "Mo 06:00-14:00 1 Fahrer DEPOT_A STD", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Pass);
        assert_eq!(templates[0].depot.as_deref(), Some("DEPOT_A"));
        assert_eq!(templates[0].skill.as_deref(), Some("STD"));
    }

    #[test]
    fn count_fahrer_defaults_to_one_when_absent() {
        let (parsed, templates) = parse_line(0, "Mo 06:00-14:00", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Pass);
        assert_eq!(templates[0].count, 1);
    }

    #[test]
    fn unknown_day_fails() {
        let (parsed, templates) = parse_line(0, "Xx 06:00-14:00 1 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Fail);
        assert!(templates.is_empty());
    }

    #[test]
    fn equal_start_and_end_fails() {
        let (parsed, _) = parse_line(0, "Mo 06:00-06:00 1 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Fail);
    }

    #[test]
    fn high_count_warns_but_still_expands() {
        let (parsed, templates) = parse_line(0, "Mo 06:00-14:00 11 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Warn);
        assert_eq!(templates[0].count, 11);
    }

    #[test]
    fn crossing_midnight_is_accepted() {
        let (parsed, templates) = parse_line(0, "Mo 22:00-06:00 1 Fahrer", &whitelist());
        assert_eq!(parsed.status, solvereign_core::ParseStatus::Pass);
        assert!(templates[0].end_min <= templates[0].start_min);
    }
}
