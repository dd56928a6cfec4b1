//! Named shopping lists, persisted under the `shoppingLists` key.
//!
//! A list collects products to order later. Items can be ticked off, and the
//! unticked ones moved into the cart in one go.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartError};
use crate::product::Product;

/// Errors raised by shopping-list operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShoppingListError {
    #[error("shopping list not found: {0}")]
    ListNotFound(String),
    #[error("item not found: {0}")]
    ItemNotFound(Uuid),
    #[error("a list named {0:?} already exists")]
    DuplicateName(String),
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// One product on a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub product: Product,
    pub quantity: u32,
    #[serde(default)]
    pub completed: bool,
    pub added_at: DateTime<Utc>,
}

/// A named list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingListItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShoppingList {
    fn item_mut(&mut self, item_id: Uuid) -> Result<&mut ShoppingListItem, ShoppingListError> {
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(ShoppingListError::ItemNotFound(item_id))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// All lists plus the currently selected one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingLists {
    #[serde(default)]
    lists: Vec<ShoppingList>,
    #[serde(default)]
    current: Option<Uuid>,
}

impl ShoppingLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list and select it.
    ///
    /// # Errors
    ///
    /// Returns [`ShoppingListError::DuplicateName`] if the name is taken.
    pub fn create(&mut self, name: &str) -> Result<Uuid, ShoppingListError> {
        let name = name.trim();
        if self.find_by_name(name).is_some() {
            return Err(ShoppingListError::DuplicateName(name.to_owned()));
        }
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.lists.push(ShoppingList {
            id,
            name: name.to_owned(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        self.current = Some(id);
        Ok(id)
    }

    /// Delete a list. If it was selected, the first remaining list is selected.
    pub fn remove(&mut self, list_id: Uuid) -> bool {
        let before = self.lists.len();
        self.lists.retain(|l| l.id != list_id);
        if self.current == Some(list_id) {
            self.current = self.lists.first().map(|l| l.id);
        }
        self.lists.len() != before
    }

    pub fn select(&mut self, list_id: Uuid) -> bool {
        if self.get(list_id).is_some() {
            self.current = Some(list_id);
            true
        } else {
            false
        }
    }

    /// The selected list, falling back to the first one.
    #[must_use]
    pub fn current(&self) -> Option<&ShoppingList> {
        self.current
            .and_then(|id| self.get(id))
            .or_else(|| self.lists.first())
    }

    #[must_use]
    pub fn get(&self, list_id: Uuid) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ShoppingList> {
        self.lists
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShoppingList> {
        self.lists.iter()
    }

    /// Add `quantity` of a product, merging with an existing item for it.
    ///
    /// # Errors
    ///
    /// Returns [`ShoppingListError::ListNotFound`] for an unknown list.
    pub fn add_item(
        &mut self,
        list_id: Uuid,
        product: &Product,
        quantity: u32,
    ) -> Result<Uuid, ShoppingListError> {
        let list = self.list_mut(list_id)?;
        list.touch();
        if let Some(item) = list.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            return Ok(item.id);
        }
        let id = Uuid::new_v4();
        list.items.push(ShoppingListItem {
            id,
            product: product.clone(),
            quantity,
            completed: false,
            added_at: Utc::now(),
        });
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns an error if the list or item does not exist.
    pub fn remove_item(&mut self, list_id: Uuid, item_id: Uuid) -> Result<(), ShoppingListError> {
        let list = self.list_mut(list_id)?;
        let before = list.items.len();
        list.items.retain(|i| i.id != item_id);
        if list.items.len() == before {
            return Err(ShoppingListError::ItemNotFound(item_id));
        }
        list.touch();
        Ok(())
    }

    /// Set an item's quantity; zero removes the item.
    ///
    /// # Errors
    ///
    /// Returns an error if the list or item does not exist.
    pub fn update_quantity(
        &mut self,
        list_id: Uuid,
        item_id: Uuid,
        quantity: u32,
    ) -> Result<(), ShoppingListError> {
        if quantity == 0 {
            return self.remove_item(list_id, item_id);
        }
        let list = self.list_mut(list_id)?;
        list.item_mut(item_id)?.quantity = quantity;
        list.touch();
        Ok(())
    }

    /// Flip an item's completed flag. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the list or item does not exist.
    pub fn toggle_completed(
        &mut self,
        list_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, ShoppingListError> {
        let list = self.list_mut(list_id)?;
        let item = list.item_mut(item_id)?;
        item.completed = !item.completed;
        let completed = item.completed;
        list.touch();
        Ok(completed)
    }

    /// Drop every completed item. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`ShoppingListError::ListNotFound`] for an unknown list.
    pub fn clear_completed(&mut self, list_id: Uuid) -> Result<usize, ShoppingListError> {
        let list = self.list_mut(list_id)?;
        let before = list.items.len();
        list.items.retain(|i| !i.completed);
        list.touch();
        Ok(before - list.items.len())
    }

    /// Put every open item of a list into the cart, `quantity` units each.
    ///
    /// Returns the number of units added. All or nothing: if the cart refuses
    /// any product, the cart is left as it was.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown list or an unorderable product.
    pub fn move_to_cart(&self, list_id: Uuid, cart: &mut Cart) -> Result<u32, ShoppingListError> {
        let list = self
            .get(list_id)
            .ok_or_else(|| ShoppingListError::ListNotFound(list_id.to_string()))?;
        let mut staged = cart.clone();
        let mut added = 0_u32;
        for item in list.items.iter().filter(|i| !i.completed) {
            for _ in 0..item.quantity {
                staged.add(&item.product, None)?;
                added += 1;
            }
        }
        *cart = staged;
        Ok(added)
    }

    fn list_mut(&mut self, list_id: Uuid) -> Result<&mut ShoppingList, ShoppingListError> {
        self.lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| ShoppingListError::ListNotFound(list_id.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::product::fixtures;
    use crate::types::ProductCategory;

    #[test]
    fn test_create_selects_new_list() {
        let mut lists = ShoppingLists::new();
        let weekend = lists.create("Weekend").unwrap();
        assert_eq!(lists.current().unwrap().id, weekend);
        let party = lists.create("Party").unwrap();
        assert_eq!(lists.current().unwrap().id, party);
        assert!(matches!(
            lists.create("party"),
            Err(ShoppingListError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_remove_current_falls_back_to_first() {
        let mut lists = ShoppingLists::new();
        let a = lists.create("A").unwrap();
        let b = lists.create("B").unwrap();
        assert!(lists.remove(b));
        assert_eq!(lists.current().unwrap().id, a);
        assert!(!lists.remove(b));
    }

    #[test]
    fn test_add_item_merges_by_product() {
        let mut lists = ShoppingLists::new();
        let id = lists.create("Groceries").unwrap();
        let cola = fixtures::product(5, ProductCategory::Beverage, 250);
        let first = lists.add_item(id, &cola, 1).unwrap();
        let second = lists.add_item(id, &cola, 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(lists.get(id).unwrap().items[0].quantity, 3);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut lists = ShoppingLists::new();
        let id = lists.create("L").unwrap();
        let item = lists.add_item(id, &fixtures::pizza(1, 900), 2).unwrap();
        lists.update_quantity(id, item, 0).unwrap();
        assert!(lists.get(id).unwrap().items.is_empty());
        assert_eq!(
            lists.update_quantity(id, item, 1),
            Err(ShoppingListError::ItemNotFound(item))
        );
    }

    #[test]
    fn test_clear_completed_and_move_to_cart() {
        let mut lists = ShoppingLists::new();
        let id = lists.create("Friday").unwrap();
        let pizza = fixtures::pizza(1, 900);
        let fries = fixtures::product(2, ProductCategory::Side, 300);
        lists.add_item(id, &pizza, 2).unwrap();
        let fries_item = lists.add_item(id, &fries, 1).unwrap();
        assert!(lists.toggle_completed(id, fries_item).unwrap());

        let mut cart = Cart::new();
        assert_eq!(lists.move_to_cart(id, &mut cart).unwrap(), 2);
        assert_eq!(cart.item_count(), 2);
        assert!(!cart.contains_product(fries.id));

        assert_eq!(lists.clear_completed(id).unwrap(), 1);
        assert_eq!(lists.get(id).unwrap().items.len(), 1);
    }

    #[test]
    fn test_move_to_cart_is_all_or_nothing() {
        let mut lists = ShoppingLists::new();
        let id = lists.create("Saturday").unwrap();
        let pizza = fixtures::pizza(1, 900);
        let mut fries = fixtures::product(2, ProductCategory::Side, 300);
        fries.available = false;
        lists.add_item(id, &pizza, 2).unwrap();
        lists.add_item(id, &fries, 1).unwrap();

        let mut cart = Cart::new();
        let cola = fixtures::product(5, ProductCategory::Beverage, 250);
        cart.add(&cola, None).unwrap();
        let before = cart.clone();

        assert!(matches!(
            lists.move_to_cart(id, &mut cart),
            Err(ShoppingListError::Cart(CartError::Unavailable(_)))
        ));
        assert_eq!(cart, before);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_unknown_list() {
        let mut lists = ShoppingLists::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            lists.add_item(missing, &fixtures::pizza(1, 900), 1),
            Err(ShoppingListError::ListNotFound(_))
        ));
        assert!(!lists.select(missing));
    }
}
