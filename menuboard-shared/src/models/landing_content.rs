/// Marketing landing page content, edited by super admins
///
/// Each section ("hero", "features", "pricing", ...) is a free-form JSON
/// document keyed by its name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LandingSection {
    pub section: String,
    pub content: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl LandingSection {
    /// Lists every section, alphabetically
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, LandingSection>(
            "SELECT section, content, updated_at FROM landing_page_content ORDER BY section",
        )
        .fetch_all(pool)
        .await
    }

    /// Creates or replaces a section
    pub async fn upsert(
        pool: &PgPool,
        section: &str,
        content: serde_json::Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, LandingSection>(
            r#"
            INSERT INTO landing_page_content (section, content)
            VALUES ($1, $2)
            ON CONFLICT (section) DO UPDATE
            SET content = EXCLUDED.content, updated_at = NOW()
            RETURNING section, content, updated_at
            "#,
        )
        .bind(section)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, section: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM landing_page_content WHERE section = $1")
            .bind(section)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Section names are lowercase letters, digits, `-` and `_`, up to 100 chars
pub fn is_valid_section_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 100
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}
