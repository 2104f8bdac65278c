use crate::infra::{parse_evaluation_type, print_json, read_json, CatalogArgs};
use clap::builder::RangedU64ValueParser;
use clap::Args;
use nurse_merit::analytics::{
    category_averages, improvement_areas, needs_attention, nurse_average_score,
    performance_trend, smart_alerts, standings, strengths, ItemAverage, NurseStanding,
    PerformanceTrend, SmartAlert,
};
use nurse_merit::badges::{AssessmentOutcome, AwardedBadge, BadgeAssessment, BadgeEngine};
use nurse_merit::config::AppConfig;
use nurse_merit::error::AppError;
use nurse_merit::history::{EvaluationRecord, NurseId};
use nurse_merit::scoring::{Category, EvaluationType, ItemCatalog, ScoreSet, ScoringEngine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Evaluation cadence: weekly or monthly
    #[arg(long = "type", value_parser = parse_evaluation_type)]
    pub(crate) evaluation_type: EvaluationType,
    /// JSON object mapping item keys to 1-5 scores
    #[arg(long)]
    pub(crate) scores: PathBuf,
    #[command(flatten)]
    pub(crate) catalogs: CatalogArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BadgesArgs {
    /// Nurse to assess
    #[arg(long)]
    pub(crate) nurse: String,
    /// JSON array of scored evaluation records
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// JSON array of badges the nurse already holds
    #[arg(long)]
    pub(crate) awarded: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) catalogs: CatalogArgs,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// JSON array of scored evaluation records, any number of nurses. Records that carry
    /// their item `scores` also feed the per-item and per-category breakdowns.
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// Recent window compared against older history (defaults to MERIT_TREND_WINDOW)
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub(crate) window: Option<usize>,
    /// How many nurses to list as needing attention
    #[arg(long, default_value_t = 3)]
    pub(crate) attention: usize,
    /// How many items to list as strengths and as improvement areas
    #[arg(long, default_value_t = 3)]
    pub(crate) focus: usize,
    #[command(flatten)]
    pub(crate) catalogs: CatalogArgs,
}

pub(crate) fn run_score(config: &AppConfig, args: ScoreArgs) -> Result<(), AppError> {
    let engine = ScoringEngine::new(config.catalogs.load_items()?);
    let scores: ScoreSet = read_json(&args.scores)?;

    let breakdown = engine.breakdown(args.evaluation_type, &scores)?;
    info!(
        evaluation_type = %args.evaluation_type,
        items = scores.len(),
        score = breakdown.final_score.value(),
        "evaluation scored"
    );
    print_json(&breakdown)
}

#[derive(Debug, Serialize)]
struct BadgeReport {
    nurse_id: NurseId,
    new_awards: Vec<AwardedBadge>,
    assessments: Vec<BadgeAssessment>,
}

pub(crate) fn run_badges(config: &AppConfig, args: BadgesArgs) -> Result<(), AppError> {
    let engine = BadgeEngine::new(config.catalogs.load_badges()?);
    let nurse_id = NurseId::new(args.nurse);
    let history: Vec<EvaluationRecord> = read_json(&args.history)?;
    let awarded: Vec<AwardedBadge> = match &args.awarded {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let assessments = engine.assess(&nurse_id, &history, &awarded);
    let new_awards: Vec<AwardedBadge> = assessments
        .iter()
        .filter_map(|assessment| match &assessment.outcome {
            AssessmentOutcome::Awarded { award } => Some(award.clone()),
            _ => None,
        })
        .collect();
    info!(nurse = %nurse_id, awards = new_awards.len(), "badge eligibility assessed");

    print_json(&BadgeReport {
        nurse_id,
        new_awards,
        assessments,
    })
}

pub(crate) fn run_catalog(config: &AppConfig) -> Result<(), AppError> {
    let items = config.catalogs.load_items()?;
    let badges = config.catalogs.load_badges()?;

    println!("Item catalog: {} items", items.len());
    for evaluation_type in EvaluationType::ALL {
        println!(
            "- {}: {} items",
            evaluation_type,
            items.items_for(evaluation_type).count()
        );
        if let Some(weights) = items.category_weights(evaluation_type) {
            for (category, weight) in weights {
                println!("    {category}: {:.0}%", weight * 100.0);
            }
        }
    }

    println!("\nBadge catalog: {} badges", badges.len());
    for badge in badges.iter() {
        println!("- {} ({})", badge.name, badge.id);
        for tier in badge.ordered_tiers() {
            println!("    {}: {}", tier.name, tier.criterion.describe());
        }
    }

    Ok(())
}

/// One history row; `scores` is optional so plain evaluation records still load.
#[derive(Debug, Clone, Deserialize)]
struct HistoryEntry {
    #[serde(flatten)]
    record: EvaluationRecord,
    #[serde(default)]
    scores: ScoreSet,
}

#[derive(Debug, Serialize)]
struct NurseAnalysis {
    nurse_id: NurseId,
    average_score: Option<f64>,
    trend: Option<PerformanceTrend>,
    alerts: Vec<SmartAlert>,
    strengths: Vec<ItemAverage>,
    improvement_areas: Vec<ItemAverage>,
    category_averages: BTreeMap<EvaluationType, BTreeMap<Category, f64>>,
}

#[derive(Debug, Serialize)]
struct AnalysisReport {
    window: usize,
    standings: Vec<NurseStanding>,
    needs_attention: Vec<NurseStanding>,
    nurses: Vec<NurseAnalysis>,
}

struct AnalysisOptions {
    window: usize,
    attention: usize,
    focus: usize,
}

fn analyze_nurse(
    nurse_id: &NurseId,
    entries: &[&HistoryEntry],
    catalog: &ItemCatalog,
    options: &AnalysisOptions,
) -> NurseAnalysis {
    let history: Vec<EvaluationRecord> = entries.iter().map(|entry| entry.record.clone()).collect();
    let score_sets: Vec<ScoreSet> = entries
        .iter()
        .filter(|entry| !entry.scores.is_empty())
        .map(|entry| entry.scores.clone())
        .collect();

    let mut per_type = BTreeMap::new();
    for evaluation_type in EvaluationType::ALL {
        let sets: Vec<ScoreSet> = entries
            .iter()
            .filter(|entry| entry.record.evaluation_type == evaluation_type)
            .map(|entry| entry.scores.clone())
            .collect();
        let averages = category_averages(&sets, catalog, evaluation_type);
        if !averages.is_empty() {
            per_type.insert(evaluation_type, averages);
        }
    }

    NurseAnalysis {
        nurse_id: nurse_id.clone(),
        average_score: nurse_average_score(&history),
        trend: performance_trend(&history, options.window),
        alerts: smart_alerts(&history, options.window),
        strengths: strengths(&score_sets, options.focus),
        improvement_areas: improvement_areas(&score_sets, options.focus),
        category_averages: per_type,
    }
}

fn analyze(
    entries: &[HistoryEntry],
    catalog: &ItemCatalog,
    options: &AnalysisOptions,
) -> AnalysisReport {
    let mut by_nurse: BTreeMap<&NurseId, Vec<&HistoryEntry>> = BTreeMap::new();
    for entry in entries {
        by_nurse.entry(&entry.record.nurse_id).or_default().push(entry);
    }

    let nurses = by_nurse
        .into_iter()
        .map(|(nurse_id, entries)| analyze_nurse(nurse_id, &entries, catalog, options))
        .collect();

    let records: Vec<EvaluationRecord> = entries.iter().map(|entry| entry.record.clone()).collect();
    AnalysisReport {
        window: options.window,
        standings: standings(&records),
        needs_attention: needs_attention(&records, options.attention),
        nurses,
    }
}

pub(crate) fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> Result<(), AppError> {
    let catalog = config.catalogs.load_items()?;
    let entries: Vec<HistoryEntry> = read_json(&args.history)?;
    let options = AnalysisOptions {
        window: args.window.unwrap_or(config.analytics.trend_window),
        attention: args.attention,
        focus: args.focus,
    };

    let report = analyze(&entries, &catalog, &options);
    info!(
        records = entries.len(),
        nurses = report.nurses.len(),
        "history analyzed"
    );
    print_json(&report)
}
