//! Category-specific field extraction.
//!
//! Extraction is best-effort: every rule runs independently and a pattern
//! that does not match leaves its field empty. Nothing here can fail.

pub mod patterns;
mod rules;

pub use rules::{ExtractionMode, FieldRule};

use tracing::debug;

use crate::models::document::{DocumentCategory, ExtractedFields};

/// Extract fields for a predicted label.
///
/// The label is matched case- and whitespace-insensitively; a label that
/// is not one of the known categories yields an empty mapping.
pub fn extract_fields(category: &str, text: &str) -> ExtractedFields {
    match DocumentCategory::from_label(category) {
        Some(category) => extract_category_fields(category, text),
        None => {
            debug!("No extraction rules for category '{}'", category);
            ExtractedFields::new()
        }
    }
}

/// Apply a category's rule table to the raw document text.
pub fn extract_category_fields(category: DocumentCategory, text: &str) -> ExtractedFields {
    let mut fields = ExtractedFields::new();

    for rule in category.rules() {
        let value = rule.apply(text);
        if value.is_none() {
            debug!("{}: no match for '{}'", category, rule.name);
        }
        fields.insert(rule.name, value);
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::FieldValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invoice_fields() {
        let text = "INVOICE\nOrder Date: 2024-01-05\nContact Name: John Smith\n\
                    Address: 12 Rue de la Paix, Paris\n";

        let fields = extract_fields("invoice", text);

        assert_eq!(fields.text("Order Date"), Some("2024-01-05"));
        assert_eq!(fields.text("Contact Name"), Some("John Smith"));
        assert_eq!(fields.text("Address"), Some("12 Rue de la Paix, Paris"));
        assert!(fields.contains("Products"));
    }

    #[test]
    fn test_invoice_products_find_all() {
        let text = "Chai Tea 10 18.00";
        let fields = extract_fields("Invoice", text);
        let rows = fields.rows("Products").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], vec!["Chai", "Tea", "10", "18.00"]);
    }

    #[test]
    fn test_purchase_order_header_and_products() {
        let text = "10248 2016-07-04 Vins et alcools Chevalier\n\
                    11 Queso Cabrales 12 14.00\n";

        let fields = extract_fields("purchase order", text);

        assert_eq!(fields.text("Order ID"), Some("10248"));
        assert_eq!(fields.text("Order Date"), Some("2016-07-04"));
        assert_eq!(
            fields.text("Customer Name"),
            Some("Vins et alcools Chevalier")
        );
        let rows = fields.rows("Products").unwrap();
        assert!(rows.iter().any(|r| r == &vec!["11", "Queso Cabrales", "12", "14.00"]));
    }

    #[test]
    fn test_purchase_order_header_missing_leaves_fields_null() {
        let fields = extract_fields("purchase order", "Customer: nobody");
        assert!(fields.contains("Order ID"));
        assert_eq!(fields.get("Order ID"), None);
        assert_eq!(fields.get("Order Date"), None);
        assert_eq!(fields.get("Customer Name"), None);
    }

    #[test]
    fn test_report_fields() {
        let text = "Sales report 2023-11\nCategory: Beverages\nChai 39 12 18.00\n";

        let fields = extract_fields("report", text);

        assert_eq!(fields.text("Period"), Some("2023-11"));
        assert_eq!(fields.text("Category"), Some("Beverages"));
        let rows = fields.rows("Products").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1..], &["39", "12", "18.00"]);
    }

    #[test]
    fn test_shipping_order_fields() {
        let text = "Order ID: 10248\n\
                    Order Date: 2016-07-04\n\
                    Shipped Date: 2016-07-16\n\
                    Ship Name: Vins et alcools Chevalier\n\
                    Ship Address: 59 rue de l'Abbaye\n\
                    Ship City: Reims\n\
                    Ship Region: Western Europe\n\
                    Ship Postal Code: 51100\n\
                    Ship Country: France\n\
                    PRODUCT: Queso Cabrales\n\
                    QUANTITY: 12\n\
                    UNIT PRICE: 14.0\n\
                    TOTAL: 168.0\n\
                    Product: Singaporean Hokkien Fried Mee\n\
                    Quantity: 10\n\
                    Unit Price: 9.8\n\
                    Total: 98.0\n";

        let fields = extract_fields("shipping order", text);

        assert_eq!(fields.text("Order ID"), Some("10248"));
        assert_eq!(fields.text("Order Date"), Some("2016-07-04"));
        assert_eq!(fields.text("Shipped Date"), Some("2016-07-16"));
        assert_eq!(fields.text("Ship Name"), Some("Vins et alcools Chevalier"));
        assert_eq!(fields.text("Ship Address"), Some("59 rue de l'Abbaye"));
        assert_eq!(fields.text("Ship City"), Some("Reims"));
        assert_eq!(fields.text("Ship Region"), Some("Western Europe"));
        assert_eq!(fields.text("Ship Postal Code"), Some("51100"));
        assert_eq!(fields.text("Ship Country"), Some("France"));

        let rows = fields.rows("Products").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Queso Cabrales", "12", "14.0", "168.0"]);
        assert_eq!(rows[1], vec!["Singaporean Hokkien Fried Mee", "10", "9.8", "98.0"]);
    }

    #[test]
    fn test_shippingorder_label_without_space() {
        let fields = extract_fields("shippingorder", "Ship City: Lyon");
        assert_eq!(fields.text("Ship City"), Some("Lyon"));
    }

    #[test]
    fn test_unknown_category_is_empty() {
        let fields = extract_fields("receipt", "Order Date: 2024-01-05");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_no_matches_gives_absent_fields() {
        for category in DocumentCategory::ALL {
            let fields = extract_category_fields(category, "!!! ???");
            assert_eq!(fields.len(), category.rules().len());
            for (name, value) in fields.iter() {
                match value {
                    None => {}
                    Some(FieldValue::Rows(rows)) => assert!(rows.is_empty(), "{name}"),
                    Some(FieldValue::Text(text)) => panic!("{name} unexpectedly matched {text}"),
                }
            }
        }
    }
}
