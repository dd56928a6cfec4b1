//! Menu browsing, reviews, favorites, and recommendations.

use foodcourt_client::{AppState, ClientError};
use foodcourt_core::{Product, ProductFilter, ProductId, ReviewForm};

use super::CommandError;

fn print_product(product: &Product) {
    let rating = product
        .average_rating
        .map(|r| format!("  ★ {r:.1}"))
        .unwrap_or_default();
    let unavailable = if product.is_orderable() { "" } else { "  (unavailable)" };
    println!(
        "{:>4}  {:<32} {:>8}  {}{rating}{unavailable}",
        product.id.as_i64(),
        product.name,
        product.price.to_string(),
        product.category
    );
}

pub async fn products(state: &AppState, filter: &ProductFilter) -> Result<(), CommandError> {
    let products = state.api().products().await.map_err(ClientError::from)?;
    let matched = filter.apply(&products);
    if matched.is_empty() {
        println!("No products found");
    }
    for product in matched {
        print_product(product);
    }
    Ok(())
}

pub async fn product(state: &mut AppState, id: ProductId) -> Result<(), CommandError> {
    let product = state.view_product(id).await?;
    print_product(&product);
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }
    if state.favorites().contains(product.id) {
        println!("\n♥ In your favorites");
    }
    Ok(())
}

pub async fn reviews(state: &AppState, id: ProductId) -> Result<(), CommandError> {
    let reviews = state.api().product_reviews(id).await.map_err(ClientError::from)?;
    if reviews.is_empty() {
        println!("No reviews yet");
    }
    for review in reviews {
        let author = review.username.as_deref().unwrap_or("anonymous");
        println!("{}/5 by {author}: {}", review.rating, review.comment);
    }
    Ok(())
}

pub async fn review(
    state: &mut AppState,
    id: ProductId,
    rating: u8,
    comment: String,
) -> Result<(), CommandError> {
    state.review(id, &ReviewForm { rating, comment }).await?;
    println!("Thanks for your review!");
    Ok(())
}

pub async fn favorite(state: &mut AppState, id: ProductId) -> Result<(), CommandError> {
    if state.toggle_favorite(id).await? {
        println!("Added to favorites");
    } else {
        println!("Removed from favorites");
    }
    Ok(())
}

pub fn favorites(state: &AppState) {
    if state.favorites().is_empty() {
        println!("No favorites yet");
    }
    for product in state.favorites().iter() {
        print_product(product);
    }
}

pub fn recent(state: &AppState, limit: usize) {
    if state.recently_viewed().is_empty() {
        println!("Nothing viewed yet");
    }
    for product in state.recently_viewed().recent(limit) {
        print_product(product);
    }
}

pub async fn recommend(state: &AppState, limit: usize) -> Result<(), CommandError> {
    let recommendations = state.recommendations(limit).await?;
    if recommendations.is_empty() {
        println!("No recommendations yet. Order something first!");
    }
    for recommendation in recommendations {
        print_product(&recommendation.product);
        println!(
            "      {} ({:.0}% match)",
            recommendation.reason(),
            recommendation.confidence * 100.0
        );
    }
    Ok(())
}
