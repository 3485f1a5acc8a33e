//! PostgreSQL schema migrations for pricetrail storage.

use sqlx::PgPool;

use crate::error::StorageError;

const SCHEMA_VERSION: i32 = 1;

/// Run all PostgreSQL migrations.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            unique_id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            product_id TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT 'uncategorized',
            url TEXT,
            image_url TEXT,
            current_price DOUBLE PRECISION,
            current_rating DOUBLE PRECISION,
            current_reviews TEXT,
            in_stock BOOLEAN NOT NULL DEFAULT TRUE,
            first_seen TIMESTAMPTZ NOT NULL,
            last_seen TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            times_scraped BIGINT NOT NULL DEFAULT 1,
            price_history JSONB NOT NULL DEFAULT '[]',
            rating_history JSONB NOT NULL DEFAULT '[]',
            lowest_price DOUBLE PRECISION,
            highest_price DOUBLE PRECISION,
            average_price DOUBLE PRECISION,
            price_trend TEXT NOT NULL DEFAULT 'stable',
            price_change_percent DOUBLE PRECISION NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_platform_product \
         ON products (platform, product_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_category_platform
         ON products (category, platform)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_trend_change \
         ON products (price_trend, price_change_percent)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_rating_last_seen \
         ON products (current_rating DESC, last_seen DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_updated ON products (updated_at DESC)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT INTO schema_version (version) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    tracing::info!("PostgreSQL schema up to date (version {})", SCHEMA_VERSION);
    Ok(())
}
