use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{self, CartItem, Product, ProductVariant},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    #[error("not enough stock: {available} available, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("item is not in the cart")]
    NotInCart,

    #[error("cart amount is too large")]
    AmountTooLarge,
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotInCart => AppError::NotFound,
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// Current catalog data for one variant, captured into a cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSnapshot {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub color: String,
    pub unit_price: i64,
    pub stock: i32,
    pub image: Option<String>,
}

impl VariantSnapshot {
    pub fn new(product: &Product, variant: &ProductVariant) -> Self {
        Self {
            product_id: product.id,
            variant_id: variant.id,
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            color: variant.color.clone(),
            unit_price: variant.price,
            stock: variant.stock,
            image: variant
                .images
                .first()
                .cloned()
                .or_else(|| product.featured_image.clone()),
        }
    }

    fn into_line(self, quantity: i32) -> Result<CartItem, CartError> {
        let subtotal = line_subtotal(self.unit_price, quantity).ok_or(CartError::AmountTooLarge)?;
        Ok(CartItem {
            product_id: self.product_id,
            variant_id: self.variant_id,
            quantity,
            product_name: self.product_name,
            product_slug: self.product_slug,
            color: self.color,
            unit_price: self.unit_price,
            stock: self.stock,
            image: self.image,
            subtotal,
        })
    }
}

/// One line per variant; quantities are bounded by the stock captured in
/// each line's snapshot and the total always fits in an `i64`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts back a persisted line without re-checking stock; stock that
    /// dropped since the line was added is caught by `update_quantity` and
    /// at checkout.
    pub fn restore(&mut self, snapshot: VariantSnapshot, quantity: i32) -> Result<(), CartError> {
        let line = snapshot.into_line(quantity)?;
        self.ensure_total_fits(&line)?;
        self.items.push(line);
        Ok(())
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line(&self, variant_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.variant_id == variant_id)
    }

    /// Adds `quantity` units, merging with an existing line for the same variant.
    /// Returns the resulting quantity of that line.
    pub fn add(&mut self, snapshot: VariantSnapshot, quantity: i32) -> Result<i32, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity);
        }

        let existing = self
            .items
            .iter()
            .position(|item| item.variant_id == snapshot.variant_id);
        let requested = match existing {
            Some(index) => self.items[index].quantity.saturating_add(quantity),
            None => quantity,
        };
        ensure_stock(snapshot.stock, requested)?;

        let line = snapshot.into_line(requested)?;
        self.ensure_total_fits(&line)?;
        match existing {
            Some(index) => self.items[index] = line,
            None => self.items.push(line),
        }
        Ok(requested)
    }

    /// Sets the quantity of a line; zero or less removes it.
    pub fn update_quantity(&mut self, variant_id: Uuid, quantity: i32) -> Result<(), CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.variant_id == variant_id)
            .ok_or(CartError::NotInCart)?;

        if quantity <= 0 {
            self.items.remove(index);
            return Ok(());
        }

        let mut line = self.items[index].clone();
        ensure_stock(line.stock, quantity)?;
        line.quantity = quantity;
        line.subtotal = line_subtotal(line.unit_price, quantity).ok_or(CartError::AmountTooLarge)?;
        self.ensure_total_fits(&line)?;
        self.items[index] = line;
        Ok(())
    }

    pub fn remove(&mut self, variant_id: Uuid) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.variant_id == variant_id)
            .ok_or(CartError::NotInCart)?;
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(|item| item.subtotal).sum()
    }

    /// Rejects `line` when the cart total with it in place would overflow.
    fn ensure_total_fits(&self, line: &CartItem) -> Result<(), CartError> {
        self.items
            .iter()
            .filter(|item| item.variant_id != line.variant_id)
            .try_fold(line.subtotal, |total, item| total.checked_add(item.subtotal))
            .map(|_| ())
            .ok_or(CartError::AmountTooLarge)
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn into_view(self) -> models::Cart {
        let total = self.total();
        let item_count = self.item_count();
        models::Cart {
            items: self.items,
            total,
            item_count,
        }
    }
}

/// `None` when the amount does not fit in an `i64`.
pub fn line_subtotal(unit_price: i64, quantity: i32) -> Option<i64> {
    unit_price.checked_mul(i64::from(quantity))
}

fn ensure_stock(available: i32, requested: i32) -> Result<(), CartError> {
    if requested > available {
        return Err(CartError::InsufficientStock {
            available,
            requested,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(price: i64, stock: i32) -> VariantSnapshot {
        VariantSnapshot {
            product_id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            product_name: "Smartphone XYZ".into(),
            product_slug: "smartphone-xyz".into(),
            color: "Negro".into(),
            unit_price: price,
            stock,
            image: None,
        }
    }

    #[test]
    fn add_merges_lines_for_the_same_variant() {
        let mut cart = Cart::new();
        let phone = snapshot(59999, 15);

        assert_eq!(cart.add(phone.clone(), 2), Ok(2));
        assert_eq!(cart.add(phone.clone(), 3), Ok(5));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.line(phone.variant_id).map(|l| l.quantity), Some(5));
        assert_eq!(cart.total(), 5 * 59999);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn add_rejects_quantity_above_stock() {
        let mut cart = Cart::new();
        let chair = snapshot(19999, 8);

        assert_eq!(
            cart.add(chair.clone(), 9),
            Err(CartError::InsufficientStock {
                available: 8,
                requested: 9
            })
        );
        assert!(cart.is_empty());

        cart.add(chair.clone(), 6).unwrap();
        assert_eq!(
            cart.add(chair.clone(), 3),
            Err(CartError::InsufficientStock {
                available: 8,
                requested: 9
            })
        );
        assert_eq!(cart.line(chair.variant_id).map(|l| l.quantity), Some(6));
    }

    #[test]
    fn add_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(snapshot(100, 5), 0), Err(CartError::InvalidQuantity));
        assert_eq!(cart.add(snapshot(100, 5), -1), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn merged_line_takes_the_latest_price() {
        let mut cart = Cart::new();
        let mut shirt = snapshot(2999, 50);
        cart.add(shirt.clone(), 1).unwrap();

        shirt.unit_price = 2499;
        cart.add(shirt.clone(), 1).unwrap();

        let line = cart.line(shirt.variant_id).unwrap();
        assert_eq!(line.unit_price, 2499);
        assert_eq!(line.subtotal, 4998);
    }

    #[test]
    fn update_quantity_bounds_and_removal() {
        let mut cart = Cart::new();
        let ball = snapshot(4999, 30);
        let shirt = snapshot(2999, 50);
        cart.add(ball.clone(), 1).unwrap();
        cart.add(shirt.clone(), 2).unwrap();

        cart.update_quantity(ball.variant_id, 4).unwrap();
        assert_eq!(cart.total(), 4 * 4999 + 2 * 2999);

        assert!(matches!(
            cart.update_quantity(ball.variant_id, 31),
            Err(CartError::InsufficientStock { .. })
        ));

        cart.update_quantity(shirt.variant_id, 0).unwrap();
        assert!(cart.line(shirt.variant_id).is_none());
        assert_eq!(cart.item_count(), 4);

        assert_eq!(
            cart.update_quantity(Uuid::new_v4(), 1),
            Err(CartError::NotInCart)
        );
    }

    #[test]
    fn remove_and_clear() {
        let mut cart = Cart::new();
        let ball = snapshot(4999, 30);
        cart.add(ball.clone(), 2).unwrap();
        cart.add(snapshot(100, 1), 1).unwrap();

        let removed = cart.remove(ball.variant_id).unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(cart.remove(ball.variant_id), Err(CartError::NotInCart));

        cart.clear();
        let view = cart.into_view();
        assert!(view.items.is_empty());
        assert_eq!(view.total, 0);
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn view_total_is_sum_of_subtotals() {
        let mut cart = Cart::new();
        cart.add(snapshot(59999, 15), 2).unwrap();
        cart.add(snapshot(2999, 50), 3).unwrap();
        let view = cart.into_view();
        let summed: i64 = view.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(view.total, summed);
        assert_eq!(view.total, 2 * 59999 + 3 * 2999);
        assert_eq!(view.item_count, 5);
    }

    #[test]
    fn restored_lines_keep_quantity_above_current_stock() {
        let mut cart = Cart::new();
        let chair = snapshot(19999, 2);
        cart.restore(chair.clone(), 5).unwrap();

        assert_eq!(cart.line(chair.variant_id).map(|l| l.quantity), Some(5));
        assert_eq!(cart.total(), 5 * 19999);
        assert!(matches!(
            cart.update_quantity(chair.variant_id, 3),
            Err(CartError::InsufficientStock { .. })
        ));
        cart.update_quantity(chair.variant_id, 2).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn oversized_amounts_are_rejected_not_wrapped() {
        let mut cart = Cart::new();
        let pricey = snapshot(i64::MAX / 2 + 1, 10);

        assert_eq!(cart.add(pricey.clone(), 2), Err(CartError::AmountTooLarge));
        assert!(cart.is_empty());

        cart.add(pricey.clone(), 1).unwrap();
        assert_eq!(
            cart.update_quantity(pricey.variant_id, 2),
            Err(CartError::AmountTooLarge)
        );
        assert_eq!(cart.line(pricey.variant_id).map(|l| l.quantity), Some(1));

        // Each line fits on its own; together they overflow the total.
        assert_eq!(
            cart.add(snapshot(i64::MAX / 2 + 1, 10), 1),
            Err(CartError::AmountTooLarge)
        );
        assert_eq!(
            cart.restore(snapshot(i64::MAX / 2 + 1, 10), 1),
            Err(CartError::AmountTooLarge)
        );
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), i64::MAX / 2 + 1);
    }

    #[test]
    fn line_subtotal_reports_overflow() {
        assert_eq!(line_subtotal(2999, 3), Some(8997));
        assert_eq!(line_subtotal(i64::MAX, 2), None);
    }

    #[test]
    fn cart_errors_map_to_http_errors() {
        assert!(matches!(AppError::from(CartError::NotInCart), AppError::NotFound));
        assert!(matches!(
            AppError::from(CartError::InvalidQuantity),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(CartError::AmountTooLarge),
            AppError::BadRequest(_)
        ));
    }
}
