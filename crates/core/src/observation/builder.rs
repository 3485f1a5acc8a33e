//! Builder for [`Observation`].

use super::Observation;

impl Observation {
    /// Returns a new builder with the identity fields and title set.
    #[must_use]
    pub fn builder(
        platform: impl Into<String>,
        product_id: impl Into<String>,
        title: impl Into<String>,
    ) -> ObservationBuilder {
        ObservationBuilder::new(platform.into(), product_id.into(), title.into())
    }
}

/// Builder for constructing [`Observation`] instances.
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    platform: String,
    product_id: String,
    title: String,
    price: Option<f64>,
    rating: Option<f64>,
    reviews: Option<String>,
    url: Option<String>,
    image_url: Option<String>,
    category: Option<String>,
}

impl ObservationBuilder {
    #[must_use]
    pub const fn new(platform: String, product_id: String, title: String) -> Self {
        Self {
            platform,
            product_id,
            title,
            price: None,
            rating: None,
            reviews: None,
            url: None,
            image_url: None,
            category: None,
        }
    }

    #[must_use]
    pub const fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub const fn maybe_price(mut self, price: Option<f64>) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub const fn rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub const fn maybe_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn reviews(mut self, reviews: impl Into<String>) -> Self {
        self.reviews = Some(reviews.into());
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Observation {
        Observation {
            platform: self.platform,
            product_id: self.product_id,
            title: self.title,
            price: self.price,
            rating: self.rating,
            reviews: self.reviews,
            url: self.url,
            image_url: self.image_url,
            category: self.category,
        }
    }
}
