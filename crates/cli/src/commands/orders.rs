//! Order history.

use foodcourt_client::AppState;

use super::CommandError;

pub async fn list(state: &AppState) -> Result<(), CommandError> {
    let orders = state.orders().await?;
    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in orders {
        let placed = order
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "#{:<6} {:<16} {:>9}  {}",
            order.id.as_i64(),
            placed,
            order.total_amount.to_string(),
            order.status
        );
        for item in &order.items {
            println!("         {} × {}", item.quantity, item.product.name);
        }
    }
    Ok(())
}
