use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardDetails {
    #[serde(default)]
    pub category: u64,
    #[serde(default)]
    pub product: u64,
    #[serde(default)]
    pub bill: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    /// `"true"` when the product is on sale.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: i64,
    pub uuid: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub total: Option<i64>,
    /// JSON-encoded line items, as stored by the backend.
    #[serde(default)]
    pub product_details: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Data a page fetches once the guard lets the user in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageData {
    Dashboard(DashboardDetails),
    Categories(Vec<Category>),
    Products(Vec<Product>),
}

impl fmt::Display for PageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageData::Dashboard(details) => write!(
                f,
                "categories: {}\nproducts:   {}\nbills:      {}",
                details.category, details.product, details.bill
            ),
            PageData::Categories(categories) => {
                for category in categories {
                    writeln!(f, "{:>5}  {}", category.id, category.name)?;
                }
                Ok(())
            }
            PageData::Products(products) => {
                for product in products {
                    writeln!(
                        f,
                        "{:>5}  {:<24} {:>6}  {}",
                        product.id,
                        product.name,
                        product.price.map(|price| price.to_string()).unwrap_or_default(),
                        product.category_name.as_deref().unwrap_or("-")
                    )?;
                }
                Ok(())
            }
        }
    }
}
