//! Visibility rule and predicate chain applied after the cache
//!
//! Both run on every request, so one cached fetch serves all roles and pages.

use crate::models::{Activity, FilterSet};
use crate::services::base::Caller;

/// Age bounds assumed when either side leaves them open.
const AGE_FLOOR: u32 = 0;
const AGE_CEILING: u32 = 999;

/// Drops pending and rejected listings unless the caller is an admin.
pub fn visible_to<'a>(
    activities: impl IntoIterator<Item = &'a Activity>,
    caller: Option<&Caller>,
) -> Vec<&'a Activity> {
    let admin = caller.is_some_and(Caller::is_admin);
    activities
        .into_iter()
        .filter(|a| admin || a.is_publicly_visible())
        .collect()
}

/// Keeps the activities matching every predicate present in `filters`.
pub fn apply_filters<'a>(
    activities: impl IntoIterator<Item = &'a Activity>,
    filters: &FilterSet,
) -> Vec<&'a Activity> {
    let query = filters
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    activities
        .into_iter()
        .filter(|a| matches(a, filters, query.as_deref()))
        .collect()
}

fn matches(activity: &Activity, filters: &FilterSet, query: Option<&str>) -> bool {
    if let Some(category) = filters.category.as_deref() {
        if !activity.categories.iter().any(|c| c == category) {
            return false;
        }
    }

    if filters.min_age.is_some() || filters.max_age.is_some() {
        // Range overlap, not containment
        let item_min = activity.age_min.unwrap_or(AGE_FLOOR);
        let item_max = activity.age_max.unwrap_or(AGE_CEILING);
        let query_min = filters.min_age.unwrap_or(AGE_FLOOR);
        let query_max = filters.max_age.unwrap_or(AGE_CEILING);
        if !(item_min <= query_max && item_max >= query_min) {
            return false;
        }
    }

    if let Some(neighborhood) = filters.neighborhood.as_deref() {
        if activity.neighborhood.as_deref() != Some(neighborhood) {
            return false;
        }
    }

    let price = activity.price_amount();
    if filters.min_price.is_some_and(|min| price < min) {
        return false;
    }
    if filters.max_price.is_some_and(|max| price > max) {
        return false;
    }

    // Start and end are checked independently: two different schedule
    // entries may satisfy them.
    if let Some(start) = filters.start_date {
        if !activity.schedule.iter().any(|s| s.date >= start) {
            return false;
        }
    }
    if let Some(end) = filters.end_date {
        if !activity.schedule.iter().any(|s| s.date <= end) {
            return false;
        }
    }

    if let Some(query) = query {
        if !activity.search_text().contains(query) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityPatch, ApprovalStatus, LocalizedText, Price, ScheduleEntry};
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    fn activity(id: &str) -> Activity {
        Activity::from_patch(id.to_string(), ActivityPatch::default(), Utc::now())
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sports_and_arts() -> Vec<Activity> {
        let mut a1 = activity("a1");
        a1.categories = vec!["sports".into()];
        a1.age_min = Some(5);
        a1.age_max = Some(12);
        a1.price = Some(Price { amount: 50.0, currency: "EUR".into() });

        let mut a2 = activity("a2");
        a2.categories = vec!["arts".into()];
        a2.age_min = Some(6);
        a2.age_max = Some(14);
        a2.price = Some(Price { amount: 60.0, currency: "EUR".into() });

        vec![a1, a2]
    }

    fn ids<'a>(activities: impl IntoIterator<Item = &'a Activity>) -> Vec<String> {
        activities.into_iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_category_filter() {
        let filters = FilterSet { category: Some("sports".into()), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&sports_and_arts(), &filters)), vec!["a1"]);
    }

    #[test]
    fn test_age_overlap() {
        let filters = FilterSet { min_age: Some(7), max_age: Some(10), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&sports_and_arts(), &filters)), vec!["a1", "a2"]);

        let filters = FilterSet { min_age: Some(13), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&sports_and_arts(), &filters)), vec!["a2"]);

        let filters = FilterSet { max_age: Some(5), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&sports_and_arts(), &filters)), vec!["a1"]);
    }

    #[test]
    fn test_age_defaults_for_open_items() {
        // No bounds on the item means it covers every age
        let filters = FilterSet { min_age: Some(40), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&[activity("open")], &filters)), vec!["open"]);
    }

    #[test]
    fn test_price_bounds() {
        let filters = FilterSet { min_price: Some(55.0), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&sports_and_arts(), &filters)), vec!["a2"]);

        let filters = FilterSet { max_price: Some(50.0), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&sports_and_arts(), &filters)), vec!["a1"]);
    }

    #[test]
    fn test_missing_price_counts_as_free() {
        let filters = FilterSet { max_price: Some(0.0), ..FilterSet::default() };
        assert_eq!(ids(apply_filters(&[activity("free")], &filters)), vec!["free"]);

        let filters = FilterSet { min_price: Some(1.0), ..FilterSet::default() };
        assert!(apply_filters(&[activity("free")], &filters).is_empty());
    }

    #[test]
    fn test_neighborhood_exact_match() {
        let mut a = activity("a");
        a.neighborhood = Some("20e".into());
        let filters = FilterSet { neighborhood: Some("20".into()), ..FilterSet::default() };
        assert!(apply_filters(&[a.clone()], &filters).is_empty());

        let filters = FilterSet { neighborhood: Some("20e".into()), ..FilterSet::default() };
        assert_eq!(apply_filters(&[a], &filters).len(), 1);
    }

    #[test]
    fn test_date_bounds_checked_independently() {
        let mut a = activity("split");
        a.schedule = vec![
            ScheduleEntry { date: date("2026-01-10"), start_time: None, end_time: None },
            ScheduleEntry { date: date("2026-06-10"), start_time: None, end_time: None },
        ];

        // No single entry lies within March, yet each bound is met by one entry
        let filters = FilterSet {
            start_date: Some(date("2026-03-01")),
            end_date: Some(date("2026-03-31")),
            ..FilterSet::default()
        };
        assert_eq!(apply_filters(&[a.clone()], &filters).len(), 1);

        let filters = FilterSet { start_date: Some(date("2026-07-01")), ..FilterSet::default() };
        assert!(apply_filters(&[a], &filters).is_empty());
    }

    #[test]
    fn test_date_filter_requires_schedule() {
        let filters = FilterSet { end_date: Some(date("2030-01-01")), ..FilterSet::default() };
        assert!(apply_filters(&[activity("unscheduled")], &filters).is_empty());
    }

    #[test]
    fn test_free_text_is_case_insensitive_across_languages() {
        let mut a = activity("a");
        a.title = LocalizedText::new("Soccer club", "Club de football");
        a.description = LocalizedText::new("Weekly training", "Entraînement hebdomadaire");

        for q in ["SOCCER", "football", "entraînement", "weekly training"] {
            let filters = FilterSet { q: Some(q.into()), ..FilterSet::default() };
            assert_eq!(apply_filters(&[a.clone()], &filters).len(), 1, "query {}", q);
        }
        let filters = FilterSet { q: Some("tennis".into()), ..FilterSet::default() };
        assert!(apply_filters(&[a], &filters).is_empty());
    }

    #[test]
    fn test_visibility_rule() {
        let statuses = [
            ("pending", Some(ApprovalStatus::Pending)),
            ("rejected", Some(ApprovalStatus::Rejected)),
            ("approved", Some(ApprovalStatus::Approved)),
            ("legacy", None),
        ];
        let all: Vec<Activity> = statuses
            .iter()
            .map(|(id, status)| {
                let mut a = activity(id);
                a.approval_status = *status;
                a
            })
            .collect();

        let parent = Caller::new("u1", "parent");
        let admin = Caller::new("u2", "admin");

        assert_eq!(ids(visible_to(&all, None)), vec!["approved", "legacy"]);
        assert_eq!(ids(visible_to(&all, Some(&parent))), vec!["approved", "legacy"]);
        assert_eq!(visible_to(&all, Some(&admin)).len(), 4);
    }

    fn arb_activity() -> impl Strategy<Value = Activity> {
        (
            "[a-z0-9]{4}",
            prop::sample::select(vec!["sports", "arts", "music"]),
            prop::option::of(0u32..18),
            prop::option::of(0u32..18),
            prop::option::of(0.0f64..200.0),
            prop::sample::select(vec!["11e", "20e"]),
        )
            .prop_map(|(id, category, age_min, age_max, amount, neighborhood)| {
                let mut a = activity(&id);
                a.categories = vec![category.to_string()];
                a.age_min = age_min;
                a.age_max = age_max;
                a.price = amount.map(|amount| Price { amount, currency: "EUR".into() });
                a.neighborhood = Some(neighborhood.to_string());
                a
            })
    }

    fn arb_filters() -> impl Strategy<Value = FilterSet> {
        (
            prop::option::of(prop::sample::select(vec!["sports", "arts", "music"])),
            prop::option::of(0u32..18),
            prop::option::of(0u32..18),
            prop::option::of(0.0f64..200.0),
            prop::option::of(prop::sample::select(vec!["11e", "20e"])),
        )
            .prop_map(|(category, min_age, max_age, max_price, neighborhood)| FilterSet {
                category: category.map(str::to_string),
                min_age,
                max_age,
                max_price,
                neighborhood: neighborhood.map(str::to_string),
                ..FilterSet::default()
            })
    }

    proptest! {
        #[test]
        fn prop_filters_are_idempotent(
            activities in prop::collection::vec(arb_activity(), 0..30),
            filters in arb_filters()
        ) {
            let once = apply_filters(&activities, &filters);
            let twice = apply_filters(once.iter().copied(), &filters);
            prop_assert_eq!(ids(once), ids(twice));
        }

        #[test]
        fn prop_empty_filter_keeps_everything(
            activities in prop::collection::vec(arb_activity(), 0..30)
        ) {
            let kept = apply_filters(&activities, &FilterSet::default());
            prop_assert_eq!(ids(kept), ids(&activities));
        }
    }
}
