//! Weekly opening hours from a detail page.
//!
//! The schedule table has no reliable nesting, so each day is found by
//! position: the weekday label, then the next time-range cell, cut off at the
//! next table row. When the cells are irregular the captured text can pick up
//! neighbouring content (a "Fermé" label, a stray row); consumers of the
//! harvested data already cope with that shape, so it is kept as is.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::normalize;
use crate::types::{Day, Schedule};

const TIMERANGE_MARKER: &str = "places--schedules-regular-content-timerange";
const ROW_MARKER: &str = "places--schedules-regular-content-row";

static RE_WEEKDAY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<div class="places--schedules-regular-content-weekday">\s*(Lundi|Mardi|Mercredi|Jeudi|Vendredi|Samedi|Dimanche)\s*</div>"#,
    )
    .expect("invalid regex: weekday label")
});

static RE_EXCEPTIONAL_SUB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)places--schedules-regular-content-exceptional-sub[^>]*>(.*?)</div>")
        .expect("invalid regex: exceptional sub-schedule")
});

/// Opening hours for every weekday that has a label on the page.
pub fn extract_schedule(html: &str) -> Schedule {
    let mut schedule = Schedule::default();

    for day in Day::ALL {
        let Some(label_end) = find_label(html, day) else {
            continue;
        };
        let Some((window, bounded)) = timerange_window(html, label_end) else {
            log::debug!("No time range after {}", day);
            continue;
        };

        let hours = match RE_EXCEPTIONAL_SUB.captures(window) {
            Some(caps) => normalize(&caps[1]),
            None => normalize(trim_to_tags(window, bounded)),
        };
        schedule.insert(day, hours);
    }

    schedule
}

/// Byte offset just past the day's label, compact form first.
fn find_label(html: &str, day: Day) -> Option<usize> {
    let compact = format!(">{}</div>", day.label());
    if let Some(pos) = html.find(&compact) {
        return Some(pos + compact.len());
    }

    RE_WEEKDAY_LABEL
        .captures_iter(html)
        .find(|caps| &caps[1] == day.label())
        .and_then(|caps| caps.get(0))
        .map(|m| m.end())
}

/// Markup from just past the first time-range class after `from` up to the
/// next row class, or to the end of the document. The flag is set when a row
/// class bounds the window.
fn timerange_window(html: &str, from: usize) -> Option<(&str, bool)> {
    let marker = from + html[from..].find(TIMERANGE_MARKER)?;
    let after_marker = marker + TIMERANGE_MARKER.len();

    Some(match html[after_marker..].find(ROW_MARKER) {
        Some(pos) => (&html[after_marker..after_marker + pos], true),
        None => (&html[after_marker..], false),
    })
}

/// Drops the tail of the time-range tag and, when bounded, the head of the
/// row tag, so only whole tags reach the normalizer.
fn trim_to_tags(window: &str, bounded: bool) -> &str {
    let start = window.find('>').map_or(window.len(), |pos| pos + 1);
    let stop = if bounded {
        window
            .rfind('<')
            .filter(|&pos| pos >= start)
            .unwrap_or(window.len())
    } else {
        window.len()
    };

    &window[start..stop]
}
