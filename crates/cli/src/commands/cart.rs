//! Cart and checkout commands.

use foodcourt_client::{AppState, ClientError};
use foodcourt_core::{AddressId, Customization, LineKey, ProductId};

use super::{CommandError, index};
use crate::CustomizeArgs;

pub fn show(state: &AppState) {
    let cart = state.cart();
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for (position, line) in cart.lines().iter().enumerate() {
        println!(
            "{:>3}. {:<40} {:>3} × {:>8} = {:>9}",
            position + 1,
            line.display_name(),
            line.quantity,
            line.unit_price().to_string(),
            line.line_total().to_string()
        );
        if let Some(customization) = &line.customization {
            println!("     {}", customization.summary());
        }
    }
    println!("{} items, subtotal {}", cart.item_count(), cart.subtotal());
}

pub async fn add(state: &mut AppState, id: ProductId, args: CustomizeArgs) -> Result<(), CommandError> {
    let customization = if args.is_empty() {
        None
    } else {
        let product = state.api().product(id).await.map_err(ClientError::from)?;
        let mut customization = Customization::for_product(&product);
        if let Some(size) = args.size {
            customization = customization.with_size(size.into());
        }
        if let Some(crust) = args.crust {
            customization = customization.with_crust(crust.into());
        }
        for topping in &args.toppings {
            customization
                .toggle_topping(topping)
                .map_err(ClientError::from)?;
        }
        for extra in &args.extras {
            customization.toggle_extra(extra).map_err(ClientError::from)?;
        }
        if let Some(instructions) = args.instructions {
            customization = customization.with_instructions(instructions);
        }
        Some(customization)
    };

    let key = state.add_to_cart(id, customization).await?;
    if let Some(line) = state.cart().line(&key) {
        println!("Added {} (now {} in cart)", line.display_name(), line.quantity);
    }
    Ok(())
}

fn line_key(state: &AppState, position: usize) -> Result<LineKey, CommandError> {
    state
        .cart()
        .key_at(index("cart line", position)?)
        .ok_or(CommandError::NoSuchPosition {
            kind: "cart line",
            position,
        })
}

pub fn remove(state: &mut AppState, position: usize) -> Result<(), CommandError> {
    let key = line_key(state, position)?;
    state.cart_mut().remove(&key);
    println!("Removed line {position}");
    Ok(())
}

pub fn set(state: &mut AppState, position: usize, quantity: i64) -> Result<(), CommandError> {
    let key = line_key(state, position)?;
    state.cart_mut().set_quantity(&key, quantity);
    show(state);
    Ok(())
}

pub fn clear(state: &mut AppState) {
    state.cart_mut().clear();
    println!("Cart cleared");
}

pub async fn checkout(state: &mut AppState, address: Option<AddressId>, notes: &str) -> Result<(), CommandError> {
    let receipt = state.checkout(address, notes).await?;
    let order = &receipt.order;
    println!("Order #{} placed: {} ({})", order.id, order.total_amount, order.status);
    println!("Delivering to {}", order.delivery_address);
    if let Some(eta) = order.estimated_delivery_time {
        println!("Estimated delivery {}", eta.format("%H:%M"));
    }
    println!("You earned {} points", receipt.points_earned);
    for achievement in receipt.unlocked {
        println!("🏆 Achievement unlocked: {} (+{} points)", achievement.name, achievement.points);
    }
    Ok(())
}
