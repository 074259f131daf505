use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use solvereign_core::{TourInstance, TourTemplate};

use crate::error::SchedulerError;

/// Expands a week's `TourTemplate`s into dated `TourInstance`s anchored on
/// `week_anchor_date`, which must be a Monday. Each template with `count = k`
/// produces exactly `k` instances, numbered `1..=k`.
pub fn expand(
    templates: &[TourTemplate],
    week_anchor_date: NaiveDate,
) -> Result<Vec<TourInstance>, SchedulerError> {
    if week_anchor_date.weekday() != Weekday::Mon {
        return Err(SchedulerError::NotAMonday(week_anchor_date));
    }

    let mut instances = Vec::with_capacity(templates.len());
    for template in templates {
        let date = week_anchor_date + Duration::days(template.day.offset());
        let midnight = date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let crosses_midnight = template.crosses_midnight();
        let start = midnight + Duration::minutes(template.start_min as i64);
        let end_day = if crosses_midnight { midnight + Duration::days(1) } else { midnight };
        let end = end_day + Duration::minutes(template.end_min as i64);

        for instance_no in 1..=template.count.max(1) {
            instances.push(TourInstance {
                instance_id: format!("{}-I{:03}", template.template_id, instance_no),
                template_id: template.template_id.clone(),
                instance_no,
                date,
                start,
                end,
                crosses_midnight,
                depot: template.depot.clone(),
                skill: template.skill.clone(),
            });
        }
    }

    solvereign_core::order::sort_instances(&mut instances);
    Ok(instances)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_day() -> impl Strategy<Value = Day> {
        prop_oneof![
            Just(Day::Mon),
            Just(Day::Tue),
            Just(Day::Wed),
            Just(Day::Thu),
            Just(Day::Fri),
            Just(Day::Sat),
            Just(Day::Sun),
        ]
    }

    proptest! {
        /// Expansion multiplicity: a template with `count = k` always
        /// produces exactly `k` instances, each landing on
        /// `week_anchor_date + day.offset()`.
        #[test]
        fn expands_count_instances_per_template(
            days in prop::collection::vec(arb_day(), 0..20),
            start_min in 0u32..1380,
            duration_min in 1u32..59,
            count in 1u32..5,
        ) {
            let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
            let templates: Vec<TourTemplate> = days
                .iter()
                .enumerate()
                .map(|(idx, day)| TourTemplate {
                    template_id: format!("T{:05}-{:03}", 0, idx),
                    day: *day,
                    start_min,
                    end_min: start_min + duration_min,
                    depot: Some("D1".into()),
                    skill: Some("STD".into()),
                    count,
                })
                .collect();

            let day_by_template: std::collections::BTreeMap<&str, Day> = templates
                .iter()
                .map(|t| (t.template_id.as_str(), t.day))
                .collect();

            let instances = expand(&templates, monday).unwrap();
            prop_assert_eq!(instances.len(), templates.len() * count as usize);
            for instance in &instances {
                let day = day_by_template[instance.template_id.as_str()];
                let expected_date = monday + Duration::days(day.offset());
                prop_assert_eq!(instance.date, expected_date);
            }
        }
    }
}
