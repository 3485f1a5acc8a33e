//! Migration v1: products table

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS products (
    unique_id TEXT PRIMARY KEY,
    platform TEXT NOT NULL,
    product_id TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT 'uncategorized',
    url TEXT,
    image_url TEXT,
    current_price REAL,
    current_rating REAL,
    current_reviews TEXT,
    in_stock INTEGER NOT NULL DEFAULT 1,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    times_scraped INTEGER NOT NULL DEFAULT 1,
    price_history TEXT NOT NULL DEFAULT '[]',
    rating_history TEXT NOT NULL DEFAULT '[]',
    lowest_price REAL,
    highest_price REAL,
    average_price REAL,
    price_trend TEXT NOT NULL DEFAULT 'stable',
    price_change_percent REAL NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_products_platform_product
    ON products(platform, product_id);
";
