//! Migration v2: query indexes

pub(super) const SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_products_category_platform ON products(category, platform);
CREATE INDEX IF NOT EXISTS idx_products_trend_change ON products(price_trend, price_change_percent);
CREATE INDEX IF NOT EXISTS idx_products_rating_last_seen ON products(current_rating, last_seen);
CREATE INDEX IF NOT EXISTS idx_products_updated_at ON products(updated_at);
";
