use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

use celeration::advice::{DEFAULT_AIM_ERROR, DEFAULT_AIM_FLUENCY};
use celeration::models::CelerationResult;
use celeration::stats::{summarize_by_quiz, DEFAULT_MOVING_AVERAGE_WINDOW};
use celeration::{analyze, report, Analysis, AnalysisOptions};

mod db;

#[derive(Parser)]
#[command(name = "celeration")]
#[command(about = "Celeration analytics and coaching tips for timed practice", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import attempts from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print celeration, pattern and tips for one learner
    Analyze {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct ScopeArgs {
    #[arg(long)]
    email: String,
    /// Only attempts on the quiz with this title
    #[arg(long)]
    quiz: Option<String>,
    /// Split celeration before/after this date (YYYY-MM-DD)
    #[arg(long)]
    pivot: Option<NaiveDate>,
    #[arg(long, default_value_t = DEFAULT_AIM_FLUENCY)]
    aim_fluency: f64,
    #[arg(long, default_value_t = DEFAULT_AIM_ERROR)]
    aim_error: f64,
    #[arg(long, default_value_t = DEFAULT_MOVING_AVERAGE_WINDOW)]
    window: usize,
    /// Only attempts from the last N days (default: full history)
    #[arg(long)]
    since_days: Option<i64>,
}

impl ScopeArgs {
    fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            quiz_id: None,
            pivot: self.pivot,
            aim_fluency: self.aim_fluency,
            aim_error: self.aim_error,
            moving_average_window: self.window,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn cutoff(since_days: Option<i64>) -> Option<NaiveDateTime> {
    since_days.map(|days| {
        (Utc::now().date_naive() - Duration::days(days.max(1))).and_time(chrono::NaiveTime::MIN)
    })
}

fn factor(result: Option<&CelerationResult>) -> String {
    result
        .map(|r| format!("x{:.2}/week", r.factor_per_week()))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_analysis(analysis: &Analysis) {
    println!("Practice days: {}", analysis.daily.len());
    println!(
        "Celeration: corrects {}, errors {}",
        factor(analysis.whole_correct.as_ref()),
        factor(analysis.whole_error.as_ref())
    );
    if analysis.correct.pre.is_some() || analysis.error.pre.is_some() {
        println!(
            "  before pivot: corrects {}, errors {}",
            factor(analysis.correct.pre.as_ref()),
            factor(analysis.error.pre.as_ref())
        );
        println!(
            "  after pivot: corrects {}, errors {}",
            factor(analysis.correct.post.as_ref()),
            factor(analysis.error.post.as_ref())
        );
    }
    match analysis.pattern {
        Some(label) => println!("Pattern: {}", label.description()),
        None => println!("Pattern: not enough data"),
    }
    println!("Tips:");
    for tip in &analysis.tips {
        println!("- {tip}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} attempts from {}.", csv.display());
        }
        Commands::Analyze { scope, format } => {
            let options = scope.options();
            options.validate()?;
            let attempts = db::fetch_attempts(
                &pool,
                &scope.email,
                cutoff(scope.since_days),
                scope.quiz.as_deref(),
            )
            .await?;
            let analysis = analyze(&attempts, &options);

            match format {
                OutputFormat::Text => print_analysis(&analysis),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&analysis)?);
                }
            }
        }
        Commands::Report { scope, out } => {
            let options = scope.options();
            options.validate()?;
            let attempts = db::fetch_attempts(
                &pool,
                &scope.email,
                cutoff(scope.since_days),
                scope.quiz.as_deref(),
            )
            .await?;
            let analysis = analyze(&attempts, &options);
            let label = scope.quiz.as_deref().unwrap_or(&scope.email);
            let report = report::build_report(Some(label), &analysis, &summarize_by_quiz(&attempts));
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_reads_full_history_by_default() {
        let cli =
            Cli::try_parse_from(["celeration", "analyze", "--email", "ada@example.com"]).unwrap();
        let Commands::Analyze { scope, .. } = cli.command else {
            panic!("expected analyze subcommand");
        };
        assert_eq!(scope.since_days, None);
        assert_eq!(cutoff(scope.since_days), None);
    }

    #[test]
    fn since_days_limits_the_window() {
        let cli = Cli::try_parse_from([
            "celeration",
            "report",
            "--email",
            "ada@example.com",
            "--since-days",
            "30",
        ])
        .unwrap();
        let Commands::Report { scope, .. } = cli.command else {
            panic!("expected report subcommand");
        };
        assert_eq!(scope.since_days, Some(30));
        let since = cutoff(scope.since_days).unwrap();
        assert_eq!(since.time(), chrono::NaiveTime::MIN);
        assert!(since < Utc::now().naive_utc() - Duration::days(29));
    }
}
