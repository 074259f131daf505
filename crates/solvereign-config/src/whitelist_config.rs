use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use solvereign_core::Day;

/// Grammar whitelist for the forecast parser: anything not in these
/// dictionaries is a parse FAIL for that line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserWhitelistConfig {
    /// Day tokens are matched case-insensitively; keys are stored uppercased.
    pub day_aliases: BTreeMap<String, Day>,
    pub depot_dictionary: BTreeSet<String>,
    pub skill_dictionary: BTreeSet<String>,
    pub high_count_threshold: u32,
}

impl Default for ParserWhitelistConfig {
    fn default() -> Self {
        let mut day_aliases = BTreeMap::new();
        for (alias, day) in [
            ("MO", Day::Mon),
            ("DI", Day::Tue),
            ("MI", Day::Wed),
            ("DO", Day::Thu),
            ("FR", Day::Fri),
            ("SA", Day::Sat),
            ("SO", Day::Sun),
        ] {
            day_aliases.insert(alias.to_string(), day);
        }

        ParserWhitelistConfig {
            day_aliases,
            depot_dictionary: BTreeSet::new(),
            skill_dictionary: BTreeSet::new(),
            high_count_threshold: 10,
        }
    }
}

/// The canonical German abbreviation for a day, used when emitting
/// canonical parse lines regardless of the input token's case.
pub fn german_day_token(day: Day) -> &'static str {
    match day {
        Day::Mon => "Mo",
        Day::Tue => "Di",
        Day::Wed => "Mi",
        Day::Thu => "Do",
        Day::Fri => "Fr",
        Day::Sat => "Sa",
        Day::Sun => "So",
    }
}
