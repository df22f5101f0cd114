use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Id carried by entities that have not been persisted yet
pub const UNSAVED_ID: i32 = -1;

/// Largest price that fits `NUMERIC(12,2)`: 9 999 999 999.99
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Price must be a non-negative amount with at most two fractional digits
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("negative_price"));
    }
    if price.normalize().scale() > 2 {
        return Err(ValidationError::new("price_precision"));
    }
    if *price > MAX_PRICE {
        return Err(ValidationError::new("price_too_large"));
    }
    Ok(())
}

/// Lifecycle status shared by categories and products
///
/// Persisted as an integer (`1` = active, `2` = inactive).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    #[sea_orm(num_value = 1)]
    Active,
    #[sea_orm(num_value = 2)]
    Inactive,
}

impl Status {
    pub fn from_active(active: bool) -> Self {
        if active { Status::Active } else { Status::Inactive }
    }

    pub fn is_active(self) -> bool {
        self == Status::Active
    }
}

/// Identity shared by every persisted entity
///
/// `id` is [`UNSAVED_ID`] until the store assigns one. `created_date` is fixed at
/// construction (microsecond precision, like `timestamptz`). `version` is the
/// optimistic-concurrency counter the store bumps on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pk {
    id: i32,
    created_date: DateTime<Utc>,
    version: i32,
}

impl Pk {
    pub fn new() -> Self {
        Self {
            id: UNSAVED_ID,
            created_date: Utc::now().trunc_subsecs(6),
            version: 1,
        }
    }

    /// Rebuild an identity read back from the store or a DTO
    pub fn restore(id: i32, created_date: DateTime<Utc>, version: i32) -> Self {
        Self {
            id,
            created_date,
            version,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }
}

impl Default for Pk {
    fn default() -> Self {
        Self::new()
    }
}

/// Entities with a store identity
pub trait Identifiable {
    /// Entity name used in errors and logs
    const ENTITY: &'static str;

    fn pk(&self) -> &Pk;

    fn id(&self) -> i32 {
        self.pk().id()
    }

    fn created_date(&self) -> DateTime<Utc> {
        self.pk().created_date()
    }

    fn version(&self) -> i32 {
        self.pk().version()
    }

    fn is_persisted(&self) -> bool {
        self.pk().is_persisted()
    }
}

/// Status toggling, the only post-construction status change
pub trait Activatable {
    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;
}

/// Product category
///
/// Products reference their category; the reverse view is a query
/// (`CategoryRepository::get_products_by_category`), not a stored list.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Category {
    pk: Pk,
    #[validate(
        length(min = 1, max = 80, message = "category name must be 1 to 80 characters"),
        custom(function = "validate_not_blank", message = "category name is required")
    )]
    name: String,
    #[validate(length(max = 200, message = "category description must be at most 200 characters"))]
    description: Option<String>,
    status: Status,
}

impl Category {
    /// New, unsaved, active category
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self::with_status(name, description, Status::Active)
    }

    pub fn with_status(name: impl Into<String>, description: Option<String>, status: Status) -> Self {
        Self::from_parts(Pk::new(), name, description, status)
    }

    pub fn from_parts(
        pk: Pk,
        name: impl Into<String>,
        description: Option<String>,
        status: Status,
    ) -> Self {
        Self {
            pk,
            name: name.into(),
            description,
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn with_pk(mut self, pk: Pk) -> Self {
        self.pk = pk;
        self
    }
}

impl Identifiable for Category {
    const ENTITY: &'static str = "Category";

    fn pk(&self) -> &Pk {
        &self.pk
    }
}

impl Activatable for Category {
    fn set_active(&mut self, active: bool) {
        self.status = Status::from_active(active);
    }

    fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Product belonging to exactly one category
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Product {
    pk: Pk,
    #[validate(
        length(min = 1, max = 80, message = "product name must be 1 to 80 characters"),
        custom(function = "validate_not_blank", message = "product name is required")
    )]
    name: String,
    #[validate(length(max = 200, message = "product description must be at most 200 characters"))]
    description: Option<String>,
    #[validate(custom(
        function = "validate_price",
        message = "price must be a non-negative amount with at most two decimals"
    ))]
    price: Decimal,
    status: Status,
    category: Category,
}

impl Product {
    /// New, unsaved, active product
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        category: Category,
        description: Option<String>,
    ) -> Self {
        Self::with_status(name, price, category, description, Status::Active)
    }

    pub fn with_status(
        name: impl Into<String>,
        price: Decimal,
        category: Category,
        description: Option<String>,
        status: Status,
    ) -> Self {
        Self::from_parts(Pk::new(), name, description, price, status, category)
    }

    pub fn from_parts(
        pk: Pk,
        name: impl Into<String>,
        description: Option<String>,
        price: Decimal,
        status: Status,
        category: Category,
    ) -> Self {
        Self {
            pk,
            name: name.into(),
            description,
            price,
            status,
            category,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn category_id(&self) -> i32 {
        self.category.id()
    }

    /// The only way to change a product's price
    pub fn change_price(&mut self, price: Decimal) {
        self.price = price;
    }

    pub(crate) fn with_pk(mut self, pk: Pk) -> Self {
        self.pk = pk;
        self
    }

    pub(crate) fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl Identifiable for Product {
    const ENTITY: &'static str = "Product";

    fn pk(&self) -> &Pk {
        &self.pk
    }
}

impl Activatable for Product {
    fn set_active(&mut self, active: bool) {
        self.status = Status::from_active(active);
    }

    fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
