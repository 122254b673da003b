//! Study plan generation. Plans are computed locally from course metadata
//! and the student's progress; no provider round trip is involved, so the
//! interaction log records `internal` as the model.

use serde::Serialize;

pub const STUDY_PLAN_MODEL: &str = "internal";

#[derive(Debug, Clone, Serialize)]
pub struct StudyPlanOutcome {
    pub plan: StudyPlan,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyPlan {
    pub course_title: String,
    pub total_duration_hours: i64,
    pub available_hours_per_week: u32,
    pub target_weeks: u32,
    pub current_progress: String,
    pub weekly_schedule: Vec<WeekPlan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekPlan {
    pub week: u32,
    pub recommended_hours: f64,
    pub focus_areas: Vec<String>,
    pub goals: Vec<String>,
}

/// Spreads the remaining course hours over the requested number of weeks.
/// Weekly hours are capped at what the student said they can spend; when the
/// target is not reachable within that cap, the recommendations say so.
pub fn build_study_plan(
    course_title: &str,
    duration_hours: i64,
    progress_percentage: f64,
    available_hours_per_week: u32,
    target_weeks: u32,
) -> StudyPlanOutcome {
    let remaining_fraction = (1.0 - progress_percentage / 100.0).clamp(0.0, 1.0);
    let remaining_hours = duration_hours as f64 * remaining_fraction;
    let hours_per_week_needed = remaining_hours / f64::from(target_weeks.max(1));

    let weekly_schedule = (1..=target_weeks)
        .map(|week| WeekPlan {
            week,
            recommended_hours: hours_per_week_needed.min(f64::from(available_hours_per_week)),
            focus_areas: vec![format!("Week {week} materials")],
            goals: vec![format!("Complete week {week} objectives")],
        })
        .collect();

    let mut recommendations = vec![
        format!("Haftada {available_hours_per_week} saat ayırabilirsiniz"),
        format!("Kursun tamamlanması için {target_weeks} hafta planladınız"),
        "Düzenli çalışma saatleri belirlemeniz önerilir".to_string(),
        "Her hafta sonunda ilerlemenizi değerlendirin".to_string(),
    ];

    if hours_per_week_needed > f64::from(available_hours_per_week) {
        recommendations.push(
            "Hedeflenen sürede bitirmek için daha fazla çalışma saatine ihtiyacınız var"
                .to_string(),
        );
    }

    StudyPlanOutcome {
        plan: StudyPlan {
            course_title: course_title.to_string(),
            total_duration_hours: duration_hours,
            available_hours_per_week,
            target_weeks,
            current_progress: format!("{progress_percentage:.1}% complete"),
            weekly_schedule,
        },
        recommendations,
    }
}

#[cfg(test)]
mod plan_tests {
    use super::*;

    #[test]
    fn plan_schedules_one_entry_per_week() {
        let outcome = build_study_plan("Rust 101", 40, 0.0, 10, 4);

        assert_eq!(outcome.plan.weekly_schedule.len(), 4);
        assert_eq!(outcome.plan.weekly_schedule[0].week, 1);
        assert_eq!(outcome.plan.weekly_schedule[3].week, 4);
        assert_eq!(outcome.plan.current_progress, "0.0% complete");
    }

    #[test]
    fn plan_caps_weekly_hours_at_availability() {
        // 60 remaining hours over 2 weeks needs 30h/week, student has 5.
        let outcome = build_study_plan("Rust 101", 60, 0.0, 5, 2);

        for week in &outcome.plan.weekly_schedule {
            assert!(week.recommended_hours <= 5.0);
        }
        assert!(outcome
            .recommendations
            .iter()
            .any(|line| line.contains("daha fazla çalışma saatine")));
    }

    #[test]
    fn plan_accounts_for_existing_progress() {
        // Half done: 20 remaining hours over 4 weeks fits into 10h/week.
        let outcome = build_study_plan("Rust 101", 40, 50.0, 10, 4);

        let first = &outcome.plan.weekly_schedule[0];
        assert!((first.recommended_hours - 5.0).abs() < f64::EPSILON);
        assert_eq!(outcome.recommendations.len(), 4);
    }

    #[test]
    fn plan_handles_overreported_progress() {
        let outcome = build_study_plan("Rust 101", 40, 140.0, 10, 2);

        for week in &outcome.plan.weekly_schedule {
            assert!(week.recommended_hours >= 0.0);
        }
    }
}
