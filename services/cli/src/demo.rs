use crate::infra::{parse_date, start_of_day, CatalogArgs};
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use nurse_merit::analytics::{
    improvement_areas, nurse_average_score, performance_trend, smart_alerts, standings,
    strengths, ItemAverage,
};
use nurse_merit::awards::{
    AwardRepository, AwardService, AwardServiceError, EvaluationRepository,
    EvaluationSubmission, InMemoryAwardRepository, InMemoryEvaluationRepository,
    InMemoryNotifier, StoredEvaluation,
};
use nurse_merit::badges::BadgeEngine;
use nurse_merit::config::AppConfig;
use nurse_merit::error::AppError;
use nurse_merit::history::NurseId;
use nurse_merit::scoring::{EvaluationType, ItemCatalog, ScoreSet, ScoringEngine};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Weeks of weekly evaluations to simulate per nurse
    #[arg(long, default_value_t = 8)]
    pub(crate) weeks: u32,
    /// First evaluation day (YYYY-MM-DD). Defaults to `weeks` weeks before today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    #[command(flatten)]
    pub(crate) catalogs: CatalogArgs,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            weeks: 8,
            start: None,
            catalogs: CatalogArgs::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Profile {
    Steady,
    Declining,
    Improving,
}

const ROSTER: [(&str, Profile); 3] = [
    ("nurse-amal", Profile::Steady),
    ("nurse-huda", Profile::Declining),
    ("nurse-rami", Profile::Improving),
];

/// Deterministic 1-5 score for one item of one evaluation.
fn sample_score(profile: Profile, week: u32, weeks: u32, item: usize) -> u8 {
    let late = week >= weeks / 2;
    let wobble = (week as usize + item) % 2 == 0;
    match (profile, late) {
        (Profile::Steady, _) => {
            if (week as usize + item) % 7 == 0 {
                4
            } else {
                5
            }
        }
        (Profile::Declining, false) => 5,
        (Profile::Declining, true) => 3 + u8::from(wobble),
        (Profile::Improving, false) => 3,
        (Profile::Improving, true) => 4 + u8::from(wobble),
    }
}

fn sample_scores(
    catalog: &ItemCatalog,
    evaluation_type: EvaluationType,
    profile: Profile,
    week: u32,
    weeks: u32,
) -> ScoreSet {
    catalog
        .items_for(evaluation_type)
        .enumerate()
        .map(|(index, item)| (item.key.clone(), sample_score(profile, week, weeks, index)))
        .collect()
}

fn item_list(items: &[ItemAverage]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({:.1})", item.key, item.average))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { weeks, start, .. } = args;
    let weeks = weeks.max(1);
    let start = start.map(start_of_day).unwrap_or_else(|| {
        start_of_day(Utc::now().date_naive()) - Duration::weeks(i64::from(weeks))
    });

    let items = config.catalogs.load_items()?;
    let badges = config.catalogs.load_badges()?;

    let evaluations = Arc::new(InMemoryEvaluationRepository::default());
    let awards = Arc::new(InMemoryAwardRepository::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = AwardService::new(
        evaluations.clone(),
        awards.clone(),
        notifier.clone(),
        ScoringEngine::new(items.clone()),
        BadgeEngine::new(badges),
    );

    println!("Nurse merit demo");
    println!(
        "- {} nurses | {} weeks from {} | {} rubric items",
        ROSTER.len(),
        weeks,
        start.date_naive(),
        items.len()
    );

    let mut undelivered = 0;
    for (nurse, profile) in ROSTER {
        for week in 0..weeks {
            let recorded_at = start + Duration::weeks(i64::from(week));
            let mut submissions = vec![EvaluationSubmission {
                nurse_id: NurseId::new(nurse),
                evaluation_type: EvaluationType::Weekly,
                recorded_at,
                scores: sample_scores(&items, EvaluationType::Weekly, profile, week, weeks),
            }];
            if (week + 1) % 4 == 0 {
                submissions.push(EvaluationSubmission {
                    nurse_id: NurseId::new(nurse),
                    evaluation_type: EvaluationType::Monthly,
                    recorded_at: recorded_at + Duration::days(1),
                    scores: sample_scores(&items, EvaluationType::Monthly, profile, week, weeks),
                });
            }

            for submission in submissions {
                undelivered += service.submit(submission)?.notify_failures.len();
            }
        }
    }

    let window = config.analytics.trend_window;
    let mut all_records = Vec::new();
    for (nurse, _) in ROSTER {
        let nurse_id = NurseId::new(nurse);
        let stored = evaluations
            .evaluations_for(&nurse_id)
            .map_err(AwardServiceError::from)?;
        let history: Vec<_> = stored.iter().map(StoredEvaluation::record).collect();
        let score_sets: Vec<ScoreSet> = stored.into_iter().map(|e| e.scores).collect();
        let held = awards
            .awarded(&nurse_id)
            .map_err(AwardServiceError::from)?;

        println!("\n{nurse}");
        if let Some(average) = nurse_average_score(&history) {
            println!("- {} evaluations | average {:.1}%", history.len(), average);
        }
        if let Some(trend) = performance_trend(&history, window) {
            println!(
                "- trend over last {window}: {:?} ({:+.1}%)",
                trend.direction, trend.percentage_change
            );
        }
        for award in &held {
            println!(
                "- badge {} [{}] on {}",
                award.badge_id,
                award.tier,
                award.awarded_at.date_naive()
            );
        }
        println!("- strongest: {}", item_list(&strengths(&score_sets, 2)));
        println!("- focus on: {}", item_list(&improvement_areas(&score_sets, 2)));
        for alert in smart_alerts(&history, window) {
            println!("- alert: {}", alert.message());
        }

        all_records.extend(history);
    }

    println!("\nStandings");
    for (rank, standing) in standings(&all_records).iter().enumerate() {
        println!(
            "{}. {} {:.1}% over {} evaluations",
            rank + 1,
            standing.nurse_id,
            standing.average_score,
            standing.evaluations
        );
    }
    println!(
        "\n{} award notifications sent, {} undelivered",
        notifier.notices().len(),
        undelivered
    );

    Ok(())
}
