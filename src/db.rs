use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use celeration::ingest::{read_attempts_csv, ImportRow};
use celeration::models::AttemptRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_learner(pool: &PgPool, name: &str, email: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO celeration.learners (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

async fn upsert_quiz(pool: &PgPool, title: &str) -> anyhow::Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO celeration.quizzes (id, title)
        VALUES ($1, $2)
        ON CONFLICT (title) DO UPDATE
        SET title = EXCLUDED.title
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

/// Returns whether a new attempt was stored; rows with a known source key are skipped.
async fn insert_attempt(
    pool: &PgPool,
    learner_id: Uuid,
    quiz_id: Uuid,
    row: &ImportRow,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO celeration.attempts
        (id, learner_id, quiz_id, completed_at, total_questions, correct_answers,
         total_time_minutes, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(learner_id)
    .bind(quiz_id)
    .bind(row.completed_at)
    .bind(row.total_questions)
    .bind(row.correct_answers)
    .bind(row.total_time_minutes)
    .bind(source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let start = NaiveDate::from_ymd_opt(2026, 2, 2)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .context("invalid date")?;

    let learners = [
        ("Avery Lee", "avery.lee@example.com", "Multiplication facts 0-9", 1.35, 0.75),
        ("Jules Moreno", "jules.moreno@example.com", "Sight words set B", 1.05, 1.2),
    ];

    for (name, email, quiz_title, correct_growth, error_growth) in learners {
        let learner_id = upsert_learner(pool, name, email).await?;
        let quiz_id = upsert_quiz(pool, quiz_title).await?;

        for day in 0..14i32 {
            let weeks = f64::from(day) / 7.0;
            let correct = (12.0 * f64::powf(correct_growth, weeks)).round() as i32;
            let errors = (4.0 * f64::powf(error_growth, weeks)).round() as i32;
            let row = ImportRow {
                learner_email: email.to_string(),
                learner_name: name.to_string(),
                quiz_title: quiz_title.to_string(),
                completed_at: start + Duration::days(i64::from(day)),
                total_questions: correct + errors,
                correct_answers: correct,
                total_time_minutes: 1.0,
                source_key: None,
            };
            let source_key = format!("seed-{email}-{day}");
            insert_attempt(pool, learner_id, quiz_id, &row, &source_key).await?;
        }
    }

    Ok(())
}

pub async fn fetch_attempts(
    pool: &PgPool,
    email: &str,
    since: Option<NaiveDateTime>,
    quiz_title: Option<&str>,
) -> anyhow::Result<Vec<AttemptRecord>> {
    let mut query = String::from(
        "SELECT q.id as quiz_id, q.title, a.completed_at, a.total_questions, \
         a.correct_answers, a.total_time_minutes \
         FROM celeration.attempts a \
         JOIN celeration.learners l ON l.id = a.learner_id \
         JOIN celeration.quizzes q ON q.id = a.quiz_id \
         WHERE l.email = $1 \
         AND ($2::timestamp IS NULL OR a.completed_at >= $2)",
    );

    if quiz_title.is_some() {
        query.push_str(" AND q.title = $3");
    }
    query.push_str(" ORDER BY a.completed_at");

    let mut rows = sqlx::query(&query).bind(email).bind(since);
    if let Some(title) = quiz_title {
        rows = rows.bind(title);
    }

    let records = rows.fetch_all(pool).await?;
    let mut attempts = Vec::with_capacity(records.len());

    for row in records {
        attempts.push(AttemptRecord {
            quiz_id: row.get("quiz_id"),
            quiz_title: row.get("title"),
            completed_at: row.get("completed_at"),
            total_questions: row.get("total_questions"),
            correct_answers: row.get("correct_answers"),
            total_time_minutes: row.get("total_time_minutes"),
        });
    }

    tracing::debug!(email, count = attempts.len(), "fetched attempts");
    Ok(attempts)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = read_attempts_csv(file)?;
    let mut inserted = 0usize;

    for row in rows {
        let learner_id = upsert_learner(pool, &row.learner_name, &row.learner_email).await?;
        let quiz_id = upsert_quiz(pool, &row.quiz_title).await?;
        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_attempt(pool, learner_id, quiz_id, &row, &source_key).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}
