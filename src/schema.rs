//! Per-resource form fields, list columns and validators

use crate::models::Resource;
use crate::validation::{Pattern, Rule};

pub const MATERIAL_UNITS: &[&str] = &["kg", "g", "l", "ml", "pieza"];

/// How a form field value is entered and encoded
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    /// Sent as the strings `"true"`/`"false"`
    Boolean,
    /// List of sub-documents, edited as JSON text
    JsonArray,
    Choice(&'static [&'static str]),
    /// Identifier of an item in another resource
    Reference(Resource),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    /// Never echoed back; left out of updates when blank or masked
    pub secret: bool,
}

impl FieldSpec {
    pub fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
            rules: Vec::new(),
            secret: false,
        }
    }

    pub fn list(key: &'static str, label: &'static str) -> Self {
        Self::text(key, label).of_kind(FieldKind::JsonArray)
    }

    pub fn number(key: &'static str, label: &'static str) -> Self {
        Self::text(key, label).of_kind(FieldKind::Number).rule(Rule::NonNegativeNumber)
    }

    pub fn of_kind(mut self, kind: FieldKind) -> Self {
        if let FieldKind::Choice(options) = kind {
            self.rules.push(Rule::OneOf(options));
        }
        self.kind = kind;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }
}

/// Everything the generic list controller needs to know about one resource
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource: Resource,
    pub fields: Vec<FieldSpec>,
    pub columns: Vec<&'static str>,
    /// Bookkeeping fields dropped from listed items
    pub strip_fields: &'static [&'static str],
}

impl ResourceSchema {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }
}

fn name_field() -> FieldSpec {
    FieldSpec::text("name", "Name").required().rule(Rule::MinLength(3))
}

pub fn schema_for(resource: Resource) -> ResourceSchema {
    let (fields, columns, strip_fields): (Vec<FieldSpec>, Vec<&'static str>, &'static [&'static str]) =
        match resource {
            Resource::ProductCategories | Resource::RawMaterialCategories | Resource::Collections => {
                (vec![name_field()], vec!["name"], &[])
            }
            Resource::Suppliers => (
                vec![name_field(), FieldSpec::text("contact", "Contact").required()],
                vec!["name", "contact"],
                &[],
            ),
            Resource::RawMaterials => (
                vec![
                    name_field(),
                    FieldSpec::text("unit", "Unit").of_kind(FieldKind::Choice(MATERIAL_UNITS)).required(),
                    FieldSpec::number("currentStock", "Current stock").required(),
                    FieldSpec::number("currentPrice", "Current price").required(),
                    FieldSpec::text("idRawMaterialCategory", "Category")
                        .of_kind(FieldKind::Reference(Resource::RawMaterialCategories))
                        .required(),
                    FieldSpec::text("idSupplier", "Supplier")
                        .of_kind(FieldKind::Reference(Resource::Suppliers))
                        .required(),
                ],
                vec!["name", "unit", "currentStock", "currentPrice", "idSupplier"],
                &[],
            ),
            Resource::Employees => (
                vec![
                    name_field(),
                    FieldSpec::text("surnames", "Surnames").required().rule(Rule::MinLength(3)),
                    FieldSpec::text("phone", "Phone").required().rule(Rule::Matches(Pattern::Phone)),
                    FieldSpec::text("email", "E-mail").required().rule(Rule::Matches(Pattern::Email)),
                    FieldSpec::text("dui", "DUI").required().rule(Rule::Matches(Pattern::Dui)),
                    FieldSpec::text("user", "User").required(),
                    FieldSpec::text("password", "Password").required().rule(Rule::MinLength(4)).secret(),
                ],
                vec!["name", "surnames", "phone", "email"],
                &[],
            ),
            Resource::Products => (
                vec![
                    name_field(),
                    FieldSpec::text("description", "Description"),
                    FieldSpec::text("availability", "Available").of_kind(FieldKind::Boolean),
                    FieldSpec::list("variant", "Variants"),
                    FieldSpec::list("components", "Components"),
                    FieldSpec::list("recipe", "Recipe"),
                    FieldSpec::list("useForm", "Usage"),
                    FieldSpec::text("idProductCategory", "Category")
                        .of_kind(FieldKind::Reference(Resource::ProductCategories))
                        .required(),
                    FieldSpec::text("idCollection", "Collection")
                        .of_kind(FieldKind::Reference(Resource::Collections))
                        .required(),
                ],
                vec!["name", "availability", "idProductCategory", "idCollection"],
                &["createdAt", "updatedAt", "__v"],
            ),
            Resource::SalesOrders => (Vec::new(), vec!["createdAt", "total", "status"], &[]),
            Resource::Customers => (Vec::new(), vec!["name", "email"], &[]),
            Resource::Cart => (Vec::new(), vec!["idProduct", "quantity"], &[]),
        };

    ResourceSchema {
        resource,
        fields,
        columns,
        strip_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mutable_resource_has_fields() {
        for resource in Resource::ALL {
            let schema = schema_for(resource);
            assert_eq!(schema.resource, resource);
            assert!(!schema.columns.is_empty());
            assert_eq!(resource.is_mutable(), !schema.fields.is_empty(), "{}", resource);
        }
    }

    #[test]
    fn test_choice_field_gets_one_of_rule() {
        let schema = schema_for(Resource::RawMaterials);
        let unit = schema.field("unit").unwrap();
        assert!(unit.rules.contains(&Rule::OneOf(MATERIAL_UNITS)));
        assert!(unit.is_required());
    }

    #[test]
    fn test_product_lists_are_editable() {
        let schema = schema_for(Resource::Products);
        for key in ["variant", "components", "recipe", "useForm"] {
            assert_eq!(schema.field(key).unwrap().kind, FieldKind::JsonArray, "{}", key);
        }
    }

    #[test]
    fn test_password_is_secret() {
        let schema = schema_for(Resource::Employees);
        assert!(schema.field("password").unwrap().secret);
        assert!(!schema.field("user").unwrap().secret);
    }
}
