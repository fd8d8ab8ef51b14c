use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A named remote collection exposed under `/api/<path>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    ProductCategories,
    RawMaterialCategories,
    Collections,
    RawMaterials,
    Suppliers,
    Employees,
    Products,
    SalesOrders,
    Customers,
    Cart,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::ProductCategories,
        Resource::RawMaterialCategories,
        Resource::Collections,
        Resource::RawMaterials,
        Resource::Suppliers,
        Resource::Employees,
        Resource::Products,
        Resource::SalesOrders,
        Resource::Customers,
        Resource::Cart,
    ];

    /// Path segment after `/api/`
    pub fn path(&self) -> &'static str {
        match self {
            Resource::ProductCategories => "productCategories",
            Resource::RawMaterialCategories => "rawMaterialCategories",
            Resource::Collections => "collections",
            Resource::RawMaterials => "rawMaterials",
            Resource::Suppliers => "suppliers",
            Resource::Employees => "employees",
            Resource::Products => "products",
            Resource::SalesOrders => "salesOrder",
            Resource::Customers => "customers",
            Resource::Cart => "cart",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resource::ProductCategories => "Product categories",
            Resource::RawMaterialCategories => "Raw material categories",
            Resource::Collections => "Collections",
            Resource::RawMaterials => "Raw materials",
            Resource::Suppliers => "Suppliers",
            Resource::Employees => "Employees",
            Resource::Products => "Products",
            Resource::SalesOrders => "Sales orders",
            Resource::Customers => "Customers",
            Resource::Cart => "Cart",
        }
    }

    /// Singular noun used in confirmation prompts and notices
    pub fn singular(&self) -> &'static str {
        match self {
            Resource::ProductCategories => "category",
            Resource::RawMaterialCategories => "material category",
            Resource::Collections => "collection",
            Resource::RawMaterials => "material",
            Resource::Suppliers => "supplier",
            Resource::Employees => "employee",
            Resource::Products => "product",
            Resource::SalesOrders => "sales order",
            Resource::Customers => "customer",
            Resource::Cart => "cart entry",
        }
    }

    /// Whether the back office is allowed to create, update or delete items
    pub fn is_mutable(&self) -> bool {
        !matches!(self, Resource::SalesOrders | Resource::Customers | Resource::Cart)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "productcategories" | "categories" | "category" => Ok(Resource::ProductCategories),
            "rawmaterialcategories" | "materialcategories" => Ok(Resource::RawMaterialCategories),
            "collections" | "collection" => Ok(Resource::Collections),
            "rawmaterials" | "materials" | "material" => Ok(Resource::RawMaterials),
            "suppliers" | "supplier" => Ok(Resource::Suppliers),
            "employees" | "employee" => Ok(Resource::Employees),
            "products" | "product" => Ok(Resource::Products),
            "salesorder" | "salesorders" | "orders" => Ok(Resource::SalesOrders),
            "customers" | "customer" => Ok(Resource::Customers),
            "cart" => Ok(Resource::Cart),
            _ => Err(anyhow::anyhow!(
                "Unknown resource: {}. Supported resources: {}",
                s,
                Resource::ALL.iter().map(|r| r.path()).collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

/// One record of a resource, keyed by a server-assigned identifier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceItem(pub Map<String, Value>);

impl ResourceItem {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Server identifier, read from `_id` and falling back to `id`
    pub fn id(&self) -> Option<String> {
        ["_id", "id"].iter().find_map(|key| match self.0.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id().as_deref() == Some(id)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Human readable rendering of one field for list and detail output
    pub fn display_field(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(obj)) => obj
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
            Some(other) => other.to_string(),
        }
    }

    /// Apply `updates` on top of the current fields
    pub fn merge(&mut self, updates: &Map<String, Value>) {
        for (key, value) in updates {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn without_fields(mut self, keys: &[&str]) -> Self {
        for key in keys {
            self.0.remove(*key);
        }
        self
    }
}

impl From<Map<String, Value>> for ResourceItem {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
