use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use nurse_merit::config::CatalogConfig;
use nurse_merit::error::AppError;
use nurse_merit::scoring::EvaluationType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Catalog file overrides shared by the commands that need the rubric or badges.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CatalogArgs {
    /// Item catalog CSV (key,question,category,evaluation_types,weight)
    #[arg(long)]
    pub(crate) items: Option<PathBuf>,
    /// Badge catalog JSON array
    #[arg(long)]
    pub(crate) badges: Option<PathBuf>,
}

impl CatalogArgs {
    /// Flags win over paths from the environment.
    pub(crate) fn apply(&self, config: &mut CatalogConfig) {
        if let Some(items) = &self.items {
            config.items_path = Some(items.clone());
        }
        if let Some(badges) = &self.badges {
            config.badges_path = Some(badges.clone());
        }
    }
}

pub(crate) fn parse_evaluation_type(raw: &str) -> Result<EvaluationType, String> {
    EvaluationType::parse(raw)
        .ok_or_else(|| format!("unknown evaluation type '{raw}' (expected weekly or monthly)"))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Midnight UTC of the given day.
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

pub(crate) fn read_json_from<T: DeserializeOwned, R: Read>(reader: R) -> Result<T, AppError> {
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)?;
    read_json_from(BufReader::new(file))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurse_merit::history::EvaluationRecord;
    use nurse_merit::scoring::ScoreSet;
    use std::io::Cursor;

    #[test]
    fn flags_override_configured_paths() {
        let mut config = CatalogConfig {
            items_path: Some(PathBuf::from("env-items.csv")),
            badges_path: Some(PathBuf::from("env-badges.json")),
        };
        let args = CatalogArgs {
            items: Some(PathBuf::from("flag-items.csv")),
            badges: None,
        };

        args.apply(&mut config);

        assert_eq!(config.items_path, Some(PathBuf::from("flag-items.csv")));
        assert_eq!(config.badges_path, Some(PathBuf::from("env-badges.json")));
    }

    #[test]
    fn parses_evaluation_types_and_dates() {
        assert_eq!(parse_evaluation_type("Weekly"), Ok(EvaluationType::Weekly));
        assert!(parse_evaluation_type("daily").is_err());

        let date = parse_date("2025-03-01").expect("valid date");
        assert_eq!(start_of_day(date).to_rfc3339(), "2025-03-01T00:00:00+00:00");
        assert!(parse_date("03/01/2025").is_err());
    }

    #[test]
    fn reads_score_sets_and_history() {
        let scores: ScoreSet =
            read_json_from(Cursor::new(r#"{"punctuality": 5, "infection_control": 4}"#))
                .expect("scores parse");
        assert_eq!(scores.len(), 2);

        let history: Vec<EvaluationRecord> = read_json_from(Cursor::new(
            r#"[{"nurse_id": "n-1", "evaluation_type": "weekly",
                 "recorded_at": "2025-03-03T08:00:00Z", "final_score": 92.5}]"#,
        ))
        .expect("history parses");
        assert_eq!(history[0].final_score.value(), 92.5);

        let out_of_range = read_json_from::<Vec<EvaluationRecord>, _>(Cursor::new(
            r#"[{"nurse_id": "n-1", "evaluation_type": "weekly",
                 "recorded_at": "2025-03-03T08:00:00Z", "final_score": 120}]"#,
        ));
        assert!(matches!(out_of_range, Err(AppError::Json(_))));

        assert!(matches!(
            read_json_from::<ScoreSet, _>(Cursor::new("{not json")),
            Err(AppError::Json(_))
        ));
    }
}
