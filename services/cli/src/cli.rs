use crate::commands::{
    run_analyze, run_badges, run_catalog, run_score, AnalyzeArgs, BadgesArgs, ScoreArgs,
};
use crate::demo::{run_demo, DemoArgs};
use crate::infra::CatalogArgs;
use clap::{Parser, Subcommand};
use nurse_merit::config::AppConfig;
use nurse_merit::error::AppError;
use nurse_merit::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Nurse Merit",
    about = "Score nurse evaluations and decide badge awards from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one evaluation and print the category breakdown as JSON
    Score(ScoreArgs),
    /// Assess badge eligibility for a nurse from a JSON history
    Badges(BadgesArgs),
    /// Validate the item and badge catalogs and print a summary
    Catalog(CatalogArgs),
    /// Print standings, trends and alerts for a JSON history
    Analyze(AnalyzeArgs),
    /// Run an in-memory walkthrough with sample evaluations (default command)
    Demo(DemoArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "nurse merit ready");

    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Score(args) => {
            args.catalogs.apply(&mut config.catalogs);
            run_score(&config, args)
        }
        Command::Badges(args) => {
            args.catalogs.apply(&mut config.catalogs);
            run_badges(&config, args)
        }
        Command::Catalog(args) => {
            args.apply(&mut config.catalogs);
            run_catalog(&config)
        }
        Command::Analyze(args) => {
            args.catalogs.apply(&mut config.catalogs);
            run_analyze(&config, args)
        }
        Command::Demo(args) => {
            args.catalogs.apply(&mut config.catalogs);
            run_demo(&config, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_merit::scoring::EvaluationType;
    use std::path::PathBuf;

    #[test]
    fn parses_score_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "nurse-merit",
            "score",
            "--type",
            "monthly",
            "--scores",
            "scores.json",
            "--items",
            "rubric.csv",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.evaluation_type, EvaluationType::Monthly);
                assert_eq!(args.scores, PathBuf::from("scores.json"));
                assert_eq!(args.catalogs.items, Some(PathBuf::from("rubric.csv")));
                assert!(args.catalogs.badges.is_none());
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_evaluation_types() {
        assert!(Cli::try_parse_from([
            "nurse-merit",
            "score",
            "--type",
            "yearly",
            "--scores",
            "scores.json",
        ])
        .is_err());
    }

    #[test]
    fn analyze_window_must_be_positive() {
        let parse = |window: &str| {
            Cli::try_parse_from([
                "nurse-merit",
                "analyze",
                "--history",
                "history.json",
                "--window",
                window,
            ])
        };

        assert!(parse("0").is_err());
        match parse("4").expect("positive window parses").command {
            Some(Command::Analyze(args)) => assert_eq!(args.window, Some(4)),
            other => panic!("expected analyze command, got {other:?}"),
        }
    }

    #[test]
    fn demo_is_the_default_command() {
        let cli = Cli::try_parse_from(["nurse-merit"]).expect("no arguments parse");
        assert!(cli.command.is_none());
    }
}
