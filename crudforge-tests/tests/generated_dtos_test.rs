//! Tests over the Rust DTOs that build.rs generates from `fixtures/catalog.rs`
//!
//! Compiling this file at all proves the Rust projection emits valid code;
//! the tests check the serde shape of what was emitted.

use anyhow::Result;
use serde_json::json;

// Include generated code from build.rs
// Allow dead_code since not every generated field is read in tests
#[allow(dead_code)]
mod product_dtos {
    include!(concat!(env!("OUT_DIR"), "/models/product_dtos/mod.rs"));
}
#[allow(dead_code)]
mod supplier_dtos {
    include!(concat!(env!("OUT_DIR"), "/models/supplier_dtos/mod.rs"));
}

use product_dtos::*;
use supplier_dtos::*;

#[test]
fn test_add_dto_uses_camel_case() -> Result<()> {
    let dto: ProductAddDto = serde_json::from_value(json!({
        "name": "Desk lamp",
        "price": 19.5,
        "inStock": true,
        "tags": ["home"],
        "attributes": { "color": "black" },
        "supplierId": 7
    }))?;
    assert_eq!(dto.name, "Desk lamp");
    assert_eq!(dto.supplier_id, 7);
    assert!(dto.description.is_none());
    assert_eq!(dto.attributes.get("color").map(String::as_str), Some("black"));

    let value = serde_json::to_value(&dto)?;
    assert_eq!(value["inStock"], json!(true));
    // None fields are omitted
    assert!(value.get("description").is_none());
    // Ignored properties never reach Add DTOs
    assert!(value.get("id").is_none());
    assert!(value.get("createdTime").is_none());
    Ok(())
}

#[test]
fn test_update_dto_is_all_optional() -> Result<()> {
    let dto: ProductUpdateDto = serde_json::from_value(json!({ "price": 21.0 }))?;
    assert_eq!(dto.price, Some(21.0));
    assert!(dto.name.is_none());
    assert!(dto.supplier_id.is_none());
    assert_eq!(serde_json::to_value(&dto)?, json!({ "price": 21.0 }));
    Ok(())
}

#[test]
fn test_detail_and_item_keep_ignored_properties() -> Result<()> {
    let detail: ProductDetailDto = serde_json::from_value(json!({
        "id": 1,
        "name": "Desk lamp",
        "price": 19.5,
        "inStock": false,
        "tags": [],
        "attributes": {},
        "createdTime": 1700000000,
        "supplierId": 7
    }))?;
    assert_eq!(detail.id, 1);
    assert_eq!(detail.created_time, 1700000000);

    let item: ProductItemDto = serde_json::from_value(json!({
        "id": 1,
        "name": "Desk lamp",
        "price": 19.5,
        "inStock": false,
        "createdTime": 1700000000,
        "supplierId": 7
    }))?;
    let value = serde_json::to_value(&item)?;
    // Collections stay out of list items
    assert!(value.get("tags").is_none());
    assert!(value.get("attributes").is_none());
    Ok(())
}

#[test]
fn test_filter_dto_pages() -> Result<()> {
    let filter: ProductFilterDto = serde_json::from_value(json!({
        "inStock": true,
        "pageIndex": 2,
        "pageSize": 50
    }))?;
    assert_eq!(filter.in_stock, Some(true));
    assert_eq!(filter.page_index, Some(2));
    assert_eq!(filter.page_size, Some(50));
    assert!(filter.name.is_none());
    Ok(())
}

#[test]
fn test_collection_navigation_stays_out() -> Result<()> {
    let dto: SupplierAddDto = serde_json::from_value(json!({ "name": "Acme" }))?;
    let value = serde_json::to_value(&dto)?;
    assert_eq!(value, json!({ "name": "Acme" }));
    Ok(())
}
