//! Per-category extraction rule tables.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::document::{DocumentCategory, FieldValue};

use super::patterns::*;

/// How a rule turns regex matches into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Capture group `n` of the first match, trimmed.
    Capture(usize),
    /// Every non-overlapping match, one row of all capture groups each.
    FindAll,
}

/// One field of a category's extraction recipe.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub pattern: &'static Regex,
    pub mode: ExtractionMode,
}

impl FieldRule {
    const fn first(name: &'static str, pattern: &'static Regex) -> Self {
        Self::group(name, pattern, 1)
    }

    const fn group(name: &'static str, pattern: &'static Regex, group: usize) -> Self {
        Self {
            name,
            pattern,
            mode: ExtractionMode::Capture(group),
        }
    }

    const fn find_all(name: &'static str, pattern: &'static Regex) -> Self {
        Self {
            name,
            pattern,
            mode: ExtractionMode::FindAll,
        }
    }

    /// Apply the rule. `None` means the pattern did not match.
    pub fn apply(&self, text: &str) -> Option<FieldValue> {
        match self.mode {
            ExtractionMode::Capture(group) => self
                .pattern
                .captures(text)
                .and_then(|caps| caps.get(group))
                .map(|m| FieldValue::Text(m.as_str().trim().to_string())),
            ExtractionMode::FindAll => {
                let rows = self
                    .pattern
                    .captures_iter(text)
                    .map(|caps| {
                        caps.iter()
                            .skip(1)
                            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                Some(FieldValue::Rows(rows))
            }
        }
    }
}

lazy_static! {
    static ref INVOICE_RULES: Vec<FieldRule> = vec![
        FieldRule::first("Order Date", &ORDER_DATE),
        FieldRule::first("Contact Name", &CONTACT_NAME),
        FieldRule::first("Address", &ADDRESS),
        FieldRule::find_all("Products", &INVOICE_PRODUCT),
    ];

    // The header fields share one positional match; a layout that does not
    // lead with "<id> <yyyy-mm-dd> <name>" leaves all three empty.
    static ref PURCHASE_ORDER_RULES: Vec<FieldRule> = vec![
        FieldRule::group("Order ID", &PURCHASE_ORDER_HEADER, 1),
        FieldRule::group("Order Date", &PURCHASE_ORDER_HEADER, 2),
        FieldRule::group("Customer Name", &PURCHASE_ORDER_HEADER, 3),
        FieldRule::find_all("Products", &PURCHASE_ORDER_PRODUCT),
    ];

    static ref REPORT_RULES: Vec<FieldRule> = vec![
        FieldRule::first("Period", &REPORT_PERIOD),
        FieldRule::first("Category", &REPORT_CATEGORY),
        FieldRule::find_all("Products", &REPORT_PRODUCT),
    ];

    static ref SHIPPING_ORDER_RULES: Vec<FieldRule> = vec![
        FieldRule::first("Order ID", &ORDER_ID),
        FieldRule::first("Order Date", &ORDER_DATE),
        FieldRule::first("Shipped Date", &SHIPPED_DATE),
        FieldRule::first("Ship Name", &SHIP_NAME),
        FieldRule::first("Ship Address", &SHIP_ADDRESS),
        FieldRule::first("Ship City", &SHIP_CITY),
        FieldRule::first("Ship Region", &SHIP_REGION),
        FieldRule::first("Ship Postal Code", &SHIP_POSTAL_CODE),
        FieldRule::first("Ship Country", &SHIP_COUNTRY),
        FieldRule::find_all("Products", &SHIPPING_PRODUCT),
    ];
}

impl DocumentCategory {
    /// The extraction recipe for this category.
    pub fn rules(&self) -> &'static [FieldRule] {
        match self {
            DocumentCategory::Invoice => &INVOICE_RULES,
            DocumentCategory::PurchaseOrder => &PURCHASE_ORDER_RULES,
            DocumentCategory::Report => &REPORT_RULES,
            DocumentCategory::ShippingOrder => &SHIPPING_ORDER_RULES,
        }
    }
}
