//! Shopping list commands. Lists are addressed by name, items by position.

use uuid::Uuid;

use foodcourt_client::{AppState, ClientError};
use foodcourt_core::{ProductId, ShoppingListError};

use super::{CommandError, index};

fn list_id(state: &AppState, name: &str) -> Result<Uuid, CommandError> {
    state
        .shopping_lists()
        .find_by_name(name)
        .map(|list| list.id)
        .ok_or_else(|| ShoppingListError::ListNotFound(name.to_string()).into())
}

fn item_id(state: &AppState, list: Uuid, position: usize) -> Result<Uuid, CommandError> {
    let index = index("list item", position)?;
    state
        .shopping_lists()
        .get(list)
        .and_then(|l| l.items.get(index))
        .map(|item| item.id)
        .ok_or(CommandError::NoSuchPosition {
            kind: "list item",
            position,
        })
}

pub fn show(state: &AppState, name: Option<&str>) -> Result<(), CommandError> {
    let lists = state.shopping_lists();
    let Some(name) = name else {
        let current = lists.current().map(|l| l.id);
        for list in lists.iter() {
            let marker = if Some(list.id) == current { "*" } else { " " };
            let open = list.items.iter().filter(|i| !i.completed).count();
            println!("{marker} {:<24} {open} open / {} items", list.name, list.items.len());
        }
        if lists.iter().next().is_none() {
            println!("No shopping lists yet");
        }
        return Ok(());
    };

    let id = list_id(state, name)?;
    let Some(list) = lists.get(id) else {
        return Ok(());
    };
    println!("{}", list.name);
    for (position, item) in list.items.iter().enumerate() {
        let mark = if item.completed { "x" } else { " " };
        println!("{:>3}. [{mark}] {} × {}", position + 1, item.quantity, item.product.name);
    }
    Ok(())
}

pub fn create(state: &mut AppState, name: &str) -> Result<(), CommandError> {
    state.shopping_lists_mut().create(name)?;
    println!("Created list {name}");
    Ok(())
}

pub fn delete(state: &mut AppState, name: &str) -> Result<(), CommandError> {
    let id = list_id(state, name)?;
    state.shopping_lists_mut().remove(id);
    println!("Deleted list {name}");
    Ok(())
}

pub fn select(state: &mut AppState, name: &str) -> Result<(), CommandError> {
    let id = list_id(state, name)?;
    state.shopping_lists_mut().select(id);
    Ok(())
}

pub async fn add(
    state: &mut AppState,
    name: &str,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), CommandError> {
    let id = list_id(state, name)?;
    let product = state.api().product(product_id).await.map_err(ClientError::from)?;
    state.shopping_lists_mut().add_item(id, &product, quantity)?;
    println!("Added {} to {name}", product.name);
    Ok(())
}

pub fn remove(state: &mut AppState, name: &str, position: usize) -> Result<(), CommandError> {
    let list = list_id(state, name)?;
    let item = item_id(state, list, position)?;
    state.shopping_lists_mut().remove_item(list, item)?;
    Ok(())
}

pub fn set(state: &mut AppState, name: &str, position: usize, quantity: u32) -> Result<(), CommandError> {
    let list = list_id(state, name)?;
    let item = item_id(state, list, position)?;
    state.shopping_lists_mut().update_quantity(list, item, quantity)?;
    Ok(())
}

pub fn toggle(state: &mut AppState, name: &str, position: usize) -> Result<(), CommandError> {
    let list = list_id(state, name)?;
    let item = item_id(state, list, position)?;
    state.shopping_lists_mut().toggle_completed(list, item)?;
    show(state, Some(name))
}

pub fn tidy(state: &mut AppState, name: &str) -> Result<(), CommandError> {
    let list = list_id(state, name)?;
    let removed = state.shopping_lists_mut().clear_completed(list)?;
    println!("Removed {removed} completed items");
    Ok(())
}

pub fn to_cart(state: &mut AppState, name: &str) -> Result<(), CommandError> {
    let list = list_id(state, name)?;
    let added = state.move_list_to_cart(list)?;
    println!("Added {added} items to the cart");
    Ok(())
}
