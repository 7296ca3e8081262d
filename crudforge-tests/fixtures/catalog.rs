// Entity declarations read by build.rs; not compiled.
use std::collections::HashMap;

/// Something a supplier sells
#[crud(namespace = "Catalog.Entities")]
pub struct Product {
    #[crud(key)]
    pub id: i64,
    /// Display name
    #[crud(required, max_length = 120)]
    pub name: String,
    pub description: Option<String>,
    #[crud(required)]
    pub price: f64,
    pub in_stock: bool,
    pub tags: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub created_time: i64,
    pub supplier_id: i64,
    #[crud(required)]
    pub supplier: Supplier,
}

#[crud(namespace = "Catalog.Entities")]
pub struct Supplier {
    #[crud(key)]
    pub id: i64,
    #[crud(required, max_length = 80)]
    pub name: String,
    pub products: Vec<Product>,
}
