//! Conversions between catalog entities and DTOs

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::dto::{CategoryDto, ProductDto};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Activatable, Category, Identifiable, Pk, Product, Status};

/// Render a price with two fractional digits, or exactly when it has more
pub fn format_price(price: Decimal) -> String {
    if price.scale() <= 2 {
        format!("{:.2}", price)
    } else {
        price.to_string()
    }
}

/// Parse a price string into a decimal amount
pub fn parse_price(value: &str) -> CatalogResult<Decimal> {
    Decimal::from_str(value.trim()).map_err(|e| CatalogError::Format {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl From<&Category> for CategoryDto {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id(),
            name: category.name().to_string(),
            description: category.description().map(str::to_string),
            active: category.is_active(),
            created_date: category.created_date(),
            version: category.version(),
        }
    }
}

impl From<&Product> for ProductDto {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id(),
            name: product.name().to_string(),
            description: product.description().map(str::to_string),
            price: format_price(product.price()),
            active: product.is_active(),
            category: CategoryDto::from(product.category()),
            created_date: product.created_date(),
            version: product.version(),
        }
    }
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        Category::from_parts(
            Pk::restore(dto.id, dto.created_date, dto.version),
            dto.name,
            dto.description,
            Status::from_active(dto.active),
        )
    }
}

impl TryFrom<ProductDto> for Product {
    type Error = CatalogError;

    fn try_from(dto: ProductDto) -> CatalogResult<Self> {
        let price = parse_price(&dto.price)?;

        Ok(Product::from_parts(
            Pk::restore(dto.id, dto.created_date, dto.version),
            dto.name,
            dto.description,
            price,
            Status::from_active(dto.active),
            Category::from(dto.category),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{SubsecRound, Utc};

    fn beverages() -> Category {
        Category::from_parts(
            Pk::restore(1, Utc::now().trunc_subsecs(6), 3),
            "Beverages",
            Some("Drinks".to_string()),
            Status::Active,
        )
    }

    fn cola() -> Product {
        Product::from_parts(
            Pk::restore(3, Utc::now().trunc_subsecs(6), 2),
            "Cola",
            None,
            Decimal::new(350, 2),
            Status::Inactive,
            beverages(),
        )
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Decimal::new(350, 2)), "3.50");
        assert_eq!(format_price(Decimal::new(35, 1)), "3.50");
        assert_eq!(format_price(Decimal::new(4, 0)), "4.00");
        assert_eq!(format_price(Decimal::ZERO), "0.00");
        assert_eq!(format_price(Decimal::new(3555, 3)), "3.555");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("3.50").unwrap(), Decimal::new(35, 1));
        assert_eq!(parse_price(" 4 ").unwrap(), Decimal::new(4, 0));

        let err = parse_price("three fifty").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("three fifty"));
        assert_eq!(parse_price("").unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_category_to_dto() {
        let category = beverages();
        let dto = CategoryDto::from(&category);

        assert_eq!(dto.id, 1);
        assert_eq!(dto.name, "Beverages");
        assert_eq!(dto.description.as_deref(), Some("Drinks"));
        assert!(dto.active);
        assert_eq!(dto.version, 3);
    }

    #[test]
    fn test_product_to_dto_maps_nested_category() {
        let dto = ProductDto::from(&cola());

        assert_eq!(dto.price, "3.50");
        assert!(!dto.active);
        assert_eq!(dto.category.id, 1);
        assert!(dto.category.active);
    }

    #[test]
    fn test_entity_dto_round_trip() {
        let category = beverages();
        assert_eq!(Category::from(CategoryDto::from(&category)), category);

        let product = cola();
        assert_eq!(Product::try_from(ProductDto::from(&product)).unwrap(), product);

        let precise = Product::from_parts(
            *product.pk(),
            "Cola",
            None,
            Decimal::new(3555, 3),
            Status::Active,
            beverages(),
        );
        assert_eq!(Product::try_from(ProductDto::from(&precise)).unwrap(), precise);
    }

    #[test]
    fn test_dto_with_bad_price_is_format_error() {
        let mut dto = ProductDto::from(&cola());
        dto.price = "3,50".to_string();

        let err = Product::try_from(dto).unwrap_err();

        assert!(matches!(err, CatalogError::Format { ref value, .. } if value == "3,50"));
    }

    #[test]
    fn test_dto_serializes_to_json() {
        let json = serde_json::to_value(ProductDto::from(&cola())).unwrap();

        assert_eq!(json["price"], "3.50");
        assert_eq!(json["active"], false);
        assert_eq!(json["category"]["name"], "Beverages");

        let back: ProductDto = serde_json::from_value(json).unwrap();
        assert_eq!(back.name, "Cola");
    }
}
