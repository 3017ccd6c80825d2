//! Cart aggregation and catalog pricing
//!
//! A cart is a list of lines keyed by what makes two items interchangeable:
//! the product, the chosen variant, the set of chosen options and the line
//! notes. Adding an item whose key is already present increases that line's
//! quantity instead of creating a second line.
//!
//! Prices carried by a cart are display values only. [`Cart::price`]
//! recomputes every line from the tenant catalog, which is what an order
//! stores.
//!
//! # Example
//!
//! ```
//! use menuboard_shared::cart::{Cart, CartItem};
//! use rust_decimal::Decimal;
//! use uuid::Uuid;
//!
//! let pizza = Uuid::new_v4();
//! let mut cart = Cart::new();
//! cart.add(CartItem::new(pizza, 1).with_unit_price(Decimal::new(950, 2))).unwrap();
//! cart.add(CartItem::new(pizza, 2).with_unit_price(Decimal::new(950, 2))).unwrap();
//!
//! assert_eq!(cart.lines().len(), 1);
//! assert_eq!(cart.item_count(), 3);
//! assert_eq!(cart.subtotal(), Decimal::new(2850, 2));
//! ```

use std::collections::{HashMap, HashSet};

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::customization::{CustomizationGroup, CustomizationOption};
use crate::models::product::Product;
use crate::models::product_variant::ProductVariant;

/// Maximum quantity of a single line
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Maximum number of distinct lines in a cart
pub const MAX_CART_LINES: usize = 50;

const DECIMAL_PLACES: u32 = 2;

/// Rounds a monetary amount to cents, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Cart and pricing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Cart is empty")]
    Empty,

    #[error("Cart cannot hold more than {max} different items")]
    TooManyLines { max: usize },

    #[error("Quantity must be between 1 and {max}, got {quantity}")]
    QuantityOutOfRange { quantity: u32, max: u32 },

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Product '{0}' is currently unavailable")]
    ProductUnavailable(String),

    #[error("Variant {variant_id} does not belong to product {product_id}")]
    VariantNotFound { product_id: Uuid, variant_id: Uuid },

    #[error("Product '{0}' requires choosing a variant")]
    VariantRequired(String),

    #[error("Option {option_id} is not available for product {product_id}")]
    OptionNotFound { product_id: Uuid, option_id: Uuid },

    #[error("'{group}' needs between {min} and {max} choices, got {selected}")]
    SelectionOutOfRange {
        group: String,
        min: i32,
        /// Rendered as "any" when the group has no upper bound
        max: String,
        selected: usize,
    },
}

/// Identity of a cart line
///
/// Option IDs are kept sorted and deduplicated, and blank notes are treated
/// as no notes, so equal choices always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub option_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

impl LineKey {
    pub fn new(
        product_id: Uuid,
        variant_id: Option<Uuid>,
        mut option_ids: Vec<Uuid>,
        notes: Option<String>,
    ) -> Self {
        option_ids.sort_unstable();
        option_ids.dedup();

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Self {
            product_id,
            variant_id,
            option_ids,
            notes,
        }
    }
}

/// An item as sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,

    #[serde(default)]
    pub variant_id: Option<Uuid>,

    #[serde(default)]
    pub option_ids: Vec<Uuid>,

    #[serde(default)]
    pub notes: Option<String>,

    pub quantity: u32,

    /// Price shown to the customer; ignored when pricing an order
    #[serde(default)]
    pub unit_price: Decimal,
}

impl CartItem {
    pub fn new(product_id: Uuid, quantity: u32) -> Self {
        Self {
            product_id,
            variant_id: None,
            option_ids: Vec::new(),
            notes: None,
            quantity,
            unit_price: Decimal::ZERO,
        }
    }

    pub fn with_variant(mut self, variant_id: Uuid) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    pub fn with_options(mut self, option_ids: Vec<Uuid>) -> Self {
        self.option_ids = option_ids;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(
            self.product_id,
            self.variant_id,
            self.option_ids.clone(),
            self.notes.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub key: LineKey,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

/// Ordered collection of cart lines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

fn check_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity == 0 || quantity > MAX_LINE_QUANTITY {
        return Err(CartError::QuantityOutOfRange {
            quantity,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from client items, merging items with equal keys
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Result<Self, CartError> {
        let mut cart = Cart::new();
        for item in items {
            cart.add(item)?;
        }
        Ok(cart)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds an item, merging it into an existing line with the same key
    ///
    /// The merged line keeps the most recent display price. Fails without
    /// changing the cart when the resulting quantity is out of range or a new
    /// line would exceed [`MAX_CART_LINES`].
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        check_quantity(item.quantity)?;
        let key = item.key();

        if let Some(line) = self.lines.iter_mut().find(|l| l.key == key) {
            let merged = line.quantity + item.quantity;
            check_quantity(merged)?;
            line.quantity = merged;
            line.unit_price = item.unit_price;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CartError::TooManyLines {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            key,
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
        Ok(())
    }

    /// Sets a line's quantity; 0 removes the line
    ///
    /// Returns false when no line has that key.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return Ok(self.remove(key));
        }
        check_quantity(quantity)?;

        match self.lines.iter_mut().find(|l| &l.key == key) {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.key != key);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of units across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of the display line totals
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Prices every line from the catalog
    ///
    /// # Errors
    ///
    /// Any line that references a product outside the catalog, an unavailable
    /// product, a foreign variant or option, or violates a group's selection
    /// bounds fails the whole cart.
    pub fn price(&self, catalog: &Catalog) -> Result<PricedCart, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        let lines = self
            .lines
            .iter()
            .map(|line| catalog.price_line(line))
            .collect::<Result<Vec<_>, _>>()?;

        let total = round_money(lines.iter().map(|l| l.line_total).sum());

        Ok(PricedCart {
            item_count: self.item_count(),
            lines,
            total,
        })
    }
}

/// Chosen option as stored on an order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineOption {
    pub id: Uuid,
    pub group_name: String,
    pub name: String,
    pub price_delta: Decimal,
}

/// Priced line snapshot stored in `orders.items`
///
/// Names are copied so the order still reads correctly after the menu changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub variant_id: Option<Uuid>,
    pub variant_name: Option<String>,
    pub options: Vec<OrderLineOption>,
    pub notes: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedCart {
    pub lines: Vec<OrderLine>,
    pub item_count: u32,
    pub total: Decimal,
}

/// The slice of a tenant catalog needed to price a cart
///
/// Products in a hidden category can't be ordered, same as unavailable ones.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<Uuid, Product>,
    variants: HashMap<Uuid, ProductVariant>,
    groups: HashMap<Uuid, CustomizationGroup>,
    options: HashMap<Uuid, CustomizationOption>,
    hidden_categories: HashSet<Uuid>,
}

impl Catalog {
    pub fn new(
        products: Vec<Product>,
        variants: Vec<ProductVariant>,
        groups: Vec<CustomizationGroup>,
        options: Vec<CustomizationOption>,
    ) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            variants: variants.into_iter().map(|v| (v.id, v)).collect(),
            groups: groups.into_iter().map(|g| (g.id, g)).collect(),
            options: options.into_iter().map(|o| (o.id, o)).collect(),
            hidden_categories: HashSet::new(),
        }
    }

    pub fn with_hidden_categories(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.hidden_categories.extend(ids);
        self
    }

    /// Loads the products referenced by a cart, scoped to one tenant
    pub async fn load(pool: &PgPool, tenant_id: Uuid, cart: &Cart) -> Result<Self, sqlx::Error> {
        let mut product_ids: Vec<Uuid> = cart.lines().iter().map(|l| l.key.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products = Product::find_many(pool, tenant_id, &product_ids).await?;
        let mut category_ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
        category_ids.sort_unstable();
        category_ids.dedup();
        let hidden = Category::hidden_ids(pool, tenant_id, &category_ids).await?;
        let variants = ProductVariant::list_for_products(pool, tenant_id, &product_ids).await?;
        let groups = CustomizationGroup::list_for_products(pool, tenant_id, &product_ids).await?;
        let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
        let options = CustomizationOption::list_for_groups(pool, tenant_id, &group_ids).await?;

        Ok(Self::new(products, variants, groups, options).with_hidden_categories(hidden))
    }

    fn price_line(&self, line: &CartLine) -> Result<OrderLine, CartError> {
        let key = &line.key;
        let product = self
            .products
            .get(&key.product_id)
            .ok_or(CartError::ProductNotFound(key.product_id))?;

        if !product.is_available || self.hidden_categories.contains(&product.category_id) {
            return Err(CartError::ProductUnavailable(product.name.clone()));
        }

        let has_variants = self.variants.values().any(|v| v.product_id == product.id);
        let variant = match key.variant_id {
            Some(variant_id) => Some(
                self.variants
                    .get(&variant_id)
                    .filter(|v| v.product_id == product.id)
                    .ok_or(CartError::VariantNotFound {
                        product_id: product.id,
                        variant_id,
                    })?,
            ),
            None if has_variants => return Err(CartError::VariantRequired(product.name.clone())),
            None => None,
        };

        let mut options = Vec::with_capacity(key.option_ids.len());
        let mut picked_per_group: HashMap<Uuid, usize> = HashMap::new();
        for option_id in &key.option_ids {
            let (option, group) = self
                .options
                .get(option_id)
                .and_then(|o| self.groups.get(&o.group_id).map(|g| (o, g)))
                .filter(|(_, g)| g.product_id == product.id)
                .ok_or(CartError::OptionNotFound {
                    product_id: product.id,
                    option_id: *option_id,
                })?;

            *picked_per_group.entry(group.id).or_default() += 1;
            options.push(OrderLineOption {
                id: option.id,
                group_name: group.name.clone(),
                name: option.name.clone(),
                price_delta: option.price_delta,
            });
        }

        let mut groups: Vec<&CustomizationGroup> = self
            .groups
            .values()
            .filter(|g| g.product_id == product.id)
            .collect();
        groups.sort_by_key(|g| (g.sort_order, g.created_at));
        for group in groups {
            let selected = picked_per_group.get(&group.id).copied().unwrap_or(0);
            if !group.accepts(selected) {
                return Err(CartError::SelectionOutOfRange {
                    group: group.name.clone(),
                    min: group.min_select,
                    max: if group.max_select == 0 {
                        "any".to_string()
                    } else {
                        group.max_select.to_string()
                    },
                    selected,
                });
            }
        }

        let base = variant.map(|v| v.price).unwrap_or(product.price);
        let deltas: Decimal = options.iter().map(|o| o.price_delta).sum();
        let unit_price = round_money((base + deltas).max(Decimal::ZERO));
        let line_total = round_money(unit_price * Decimal::from(line.quantity));

        Ok(OrderLine {
            product_id: product.id,
            product_name: product.name.clone(),
            variant_id: variant.map(|v| v.id),
            variant_name: variant.map(|v| v.name.clone()),
            options,
            notes: key.notes.clone(),
            quantity: line.quantity,
            unit_price,
            line_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn product(name: &str, price: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            price,
            image_url: None,
            is_available: true,
            is_featured: false,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(product_id: Uuid, name: &str, price: Decimal) -> ProductVariant {
        ProductVariant {
            id: Uuid::new_v4(),
            product_id,
            name: name.to_string(),
            price,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn group(product_id: Uuid, name: &str, min: i32, max: i32) -> CustomizationGroup {
        CustomizationGroup {
            id: Uuid::new_v4(),
            product_id,
            name: name.to_string(),
            min_select: min,
            max_select: max,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn option(group_id: Uuid, name: &str, delta: Decimal) -> CustomizationOption {
        CustomizationOption {
            id: Uuid::new_v4(),
            group_id,
            name: name.to_string(),
            price_delta: delta,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_merges_equal_keys() {
        let id = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut cart = Cart::new();

        cart.add(CartItem::new(id, 1).with_options(vec![a, b])).unwrap();
        cart.add(CartItem::new(id, 2).with_options(vec![b, a, a])).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);

        cart.add(CartItem::new(id, 1).with_options(vec![a]).with_notes("no onions"))
            .unwrap();
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_blank_notes_merge_with_no_notes() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(CartItem::new(id, 1)).unwrap();
        cart.add(CartItem::new(id, 1).with_notes("   ")).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_quantity_bounds() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();

        assert_eq!(
            cart.add(CartItem::new(id, 0)),
            Err(CartError::QuantityOutOfRange { quantity: 0, max: 99 })
        );

        cart.add(CartItem::new(id, 98)).unwrap();
        assert_eq!(
            cart.add(CartItem::new(id, 2)),
            Err(CartError::QuantityOutOfRange { quantity: 100, max: 99 })
        );
        assert_eq!(cart.item_count(), 98);
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for _ in 0..MAX_CART_LINES {
            cart.add(CartItem::new(Uuid::new_v4(), 1)).unwrap();
        }
        assert_eq!(
            cart.add(CartItem::new(Uuid::new_v4(), 1)),
            Err(CartError::TooManyLines { max: MAX_CART_LINES })
        );
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(CartItem::new(id, 2)).unwrap();
        let key = cart.lines()[0].key.clone();

        assert_eq!(cart.set_quantity(&key, 5), Ok(true));
        assert_eq!(cart.item_count(), 5);

        assert_eq!(cart.set_quantity(&key, 0), Ok(true));
        assert!(cart.is_empty());
        assert_eq!(cart.set_quantity(&key, 3), Ok(false));
    }

    #[test]
    fn test_subtotal_uses_display_prices() {
        let mut cart = Cart::new();
        cart.add(CartItem::new(Uuid::new_v4(), 2).with_unit_price(dec(450)))
            .unwrap();
        cart.add(CartItem::new(Uuid::new_v4(), 1).with_unit_price(dec(1299)))
            .unwrap();
        assert_eq!(cart.subtotal(), dec(2199));
    }

    #[test]
    fn test_price_uses_catalog_not_client() {
        let pizza = product("Margherita", dec(950));
        let size = variant(pizza.id, "Large", dec(1250));
        let extras = group(pizza.id, "Extras", 0, 2);
        let cheese = option(extras.id, "Cheese", dec(150));
        let olives = option(extras.id, "Olives", dec(75));

        let catalog = Catalog::new(
            vec![pizza.clone()],
            vec![size.clone()],
            vec![extras],
            vec![cheese.clone(), olives.clone()],
        );

        let cart = Cart::from_items(vec![CartItem::new(pizza.id, 2)
            .with_variant(size.id)
            .with_options(vec![cheese.id, olives.id])
            .with_unit_price(dec(1))])
        .unwrap();

        let priced = cart.price(&catalog).unwrap();
        assert_eq!(priced.item_count, 2);
        assert_eq!(priced.lines[0].unit_price, dec(1475));
        assert_eq!(priced.lines[0].line_total, dec(2950));
        assert_eq!(priced.lines[0].variant_name.as_deref(), Some("Large"));
        assert_eq!(priced.total, dec(2950));
    }

    #[test]
    fn test_price_rejects_invalid_lines() {
        let burger = product("Burger", dec(1100));
        let mut soup = product("Soup", dec(500));
        soup.is_available = false;
        let sauce = group(burger.id, "Sauce", 1, 1);
        let ketchup = option(sauce.id, "Ketchup", Decimal::ZERO);
        let mayo = option(sauce.id, "Mayo", Decimal::ZERO);

        let catalog = Catalog::new(
            vec![burger.clone(), soup.clone()],
            vec![],
            vec![sauce],
            vec![ketchup.clone(), mayo.clone()],
        );

        let missing = Uuid::new_v4();
        let cart = Cart::from_items(vec![CartItem::new(missing, 1)]).unwrap();
        assert_eq!(cart.price(&catalog), Err(CartError::ProductNotFound(missing)));

        let cart = Cart::from_items(vec![CartItem::new(soup.id, 1)]).unwrap();
        assert_eq!(
            cart.price(&catalog),
            Err(CartError::ProductUnavailable("Soup".to_string()))
        );

        let cart = Cart::from_items(vec![CartItem::new(burger.id, 1)]).unwrap();
        assert!(matches!(
            cart.price(&catalog),
            Err(CartError::SelectionOutOfRange { selected: 0, .. })
        ));

        let cart = Cart::from_items(vec![
            CartItem::new(burger.id, 1).with_options(vec![ketchup.id, mayo.id])
        ])
        .unwrap();
        assert!(matches!(
            cart.price(&catalog),
            Err(CartError::SelectionOutOfRange { selected: 2, .. })
        ));

        let foreign_option = Uuid::new_v4();
        let cart = Cart::from_items(vec![
            CartItem::new(burger.id, 1).with_options(vec![foreign_option])
        ])
        .unwrap();
        assert_eq!(
            cart.price(&catalog),
            Err(CartError::OptionNotFound {
                product_id: burger.id,
                option_id: foreign_option,
            })
        );

        assert_eq!(Cart::new().price(&catalog), Err(CartError::Empty));
    }

    #[test]
    fn test_price_rejects_hidden_category() {
        let special = product("Truffle Risotto", dec(2200));
        let catalog = Catalog::new(vec![special.clone()], vec![], vec![], vec![])
            .with_hidden_categories([special.category_id]);

        let cart = Cart::from_items(vec![CartItem::new(special.id, 1)]).unwrap();
        assert_eq!(
            cart.price(&catalog),
            Err(CartError::ProductUnavailable("Truffle Risotto".to_string()))
        );

        let other = Catalog::new(vec![special], vec![], vec![], vec![])
            .with_hidden_categories([Uuid::new_v4()]);
        assert!(cart.price(&other).is_ok());
    }

    #[test]
    fn test_price_requires_own_variant() {
        let cola = product("Cola", dec(300));
        let water = product("Water", dec(200));
        let small = variant(cola.id, "33cl", dec(300));
        let bottle = variant(water.id, "1l", dec(400));
        let catalog = Catalog::new(
            vec![cola.clone(), water],
            vec![small, bottle.clone()],
            vec![],
            vec![],
        );

        let cart = Cart::from_items(vec![CartItem::new(cola.id, 1)]).unwrap();
        assert_eq!(
            cart.price(&catalog),
            Err(CartError::VariantRequired("Cola".to_string()))
        );

        let cart = Cart::from_items(vec![CartItem::new(cola.id, 1).with_variant(bottle.id)])
            .unwrap();
        assert_eq!(
            cart.price(&catalog),
            Err(CartError::VariantNotFound {
                product_id: cola.id,
                variant_id: bottle.id,
            })
        );
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(12345, 3)), dec(1235));
        assert_eq!(round_money(Decimal::new(-12345, 3)), dec(-1235));
        assert_eq!(round_money(dec(100)), dec(100));
    }
}
