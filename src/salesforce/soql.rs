//! Minimal SOQL builder.
//!
//! Predicates are kept structured (field, literal) instead of interpolated, and
//! text literals are escaped on rendering, so payload values such as SKUs cannot
//! change the shape of a query.

use std::fmt;

use super::SObject;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Bool(bool),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

/// Storefront ids are stored in text fields, so numbers render as quoted text.
impl From<u64> for Literal {
    fn from(n: u64) -> Self {
        Literal::Text(n.to_string())
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "'{}'", escape(s)),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// `field = literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Soql {
    object: SObject,
    fields: Vec<&'static str>,
    conditions: Vec<Condition>,
    limit: Option<u32>,
}

impl Soql {
    pub fn select(object: SObject, fields: &[&'static str]) -> Self {
        Self {
            object,
            fields: fields.to_vec(),
            conditions: Vec::new(),
            limit: None,
        }
    }

    /// Add an equality predicate, ANDed with the others.
    pub fn where_eq(mut self, field: &'static str, value: impl Into<Literal>) -> Self {
        self.conditions.push(Condition {
            field,
            value: value.into(),
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn object(&self) -> SObject {
        self.object
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn limit_value(&self) -> Option<u32> {
        self.limit
    }
}

impl fmt::Display for Soql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.fields.join(", "), self.object)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {} {} = {}", keyword, condition.field, condition.value)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

/// Escape a value for use inside a single-quoted SOQL string literal.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_select_with_predicates_and_limit() {
        let soql = Soql::select(SObject::Pricebook2, &["Id", "Name", "IsActive"])
            .where_eq("Name", "Shopify Price Book")
            .where_eq("IsActive", true)
            .limit(1);

        assert_eq!(
            soql.to_string(),
            "SELECT Id, Name, IsActive FROM Pricebook2 WHERE Name = 'Shopify Price Book' AND IsActive = true LIMIT 1"
        );
    }

    #[test]
    fn numeric_ids_render_as_text() {
        let soql = Soql::select(SObject::Account, &["Id"])
            .where_eq("OMSQS_Shopify_Customer_Id__c", 7_208_000_123_u64);
        assert_eq!(
            soql.to_string(),
            "SELECT Id FROM Account WHERE OMSQS_Shopify_Customer_Id__c = '7208000123'"
        );
    }

    #[test]
    fn quotes_in_values_cannot_break_out() {
        let soql = Soql::select(SObject::Product2, &["Id"])
            .where_eq("StockKeepingUnit", "x' OR Name != '");
        assert_eq!(
            soql.to_string(),
            "SELECT Id FROM Product2 WHERE StockKeepingUnit = 'x\\' OR Name != \\''"
        );
    }

    #[test]
    fn escape_handles_control_characters() {
        assert_eq!(escape("a\\b"), "a\\\\b");
        assert_eq!(escape("line\nbreak\t"), "line\\nbreak\\t");
        assert_eq!(escape("plain-SKU_01"), "plain-SKU_01");
    }
}
