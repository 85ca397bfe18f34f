//! Regex patterns for business-document field extraction.
//!
//! Labelled single-value patterns are case-insensitive. The repeating
//! product patterns keep the case sensitivity they were tuned with; only
//! the shipping-order block pattern ignores case and lets `.` cross lines.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Shared labelled fields
    pub static ref ORDER_DATE: Regex = Regex::new(
        r"(?i)Order Date[:\s]+([\d\-/]+)"
    ).unwrap();

    pub static ref ORDER_ID: Regex = Regex::new(
        r"(?i)Order ID[:\s]+(\d+)"
    ).unwrap();

    // Invoice
    /// Letters and blanks on the label's line; a name never runs into the
    /// label on the next line.
    pub static ref CONTACT_NAME: Regex = Regex::new(
        r"(?i)Contact Name[:\s]+([A-Za-z \t]+)"
    ).unwrap();

    pub static ref ADDRESS: Regex = Regex::new(
        r"(?i)Address[:\s]+(.+)"
    ).unwrap();

    /// Name, description, quantity, price.
    pub static ref INVOICE_PRODUCT: Regex = Regex::new(
        r"(\w+)\s+([\w\s]+)\s+(\d+)\s+([\d.]+)"
    ).unwrap();

    // Purchase order
    /// Unlabelled header: numeric ID, ISO date, customer name, in that order.
    pub static ref PURCHASE_ORDER_HEADER: Regex = Regex::new(
        r"(\d+)\s+(\d{4}-\d{2}-\d{2})\s+([A-Za-z\s]+)"
    ).unwrap();

    /// Product ID, name, quantity, unit price.
    pub static ref PURCHASE_ORDER_PRODUCT: Regex = Regex::new(
        r"(?m)(\d+)\s+([A-Za-z\s]+?)\s+(\d+)\s+([\d.]+)"
    ).unwrap();

    // Report
    pub static ref REPORT_PERIOD: Regex = Regex::new(
        r"(?i)(20\d{2}-\d{2})"
    ).unwrap();

    pub static ref REPORT_CATEGORY: Regex = Regex::new(
        r"(?i)Category\s*:\s*(.+)"
    ).unwrap();

    /// Name, two quantity-like columns, price.
    pub static ref REPORT_PRODUCT: Regex = Regex::new(
        r"([\w\s]+)\s+(\d+)\s+(\d+)\s+([\d.]+)"
    ).unwrap();

    // Shipping order
    pub static ref SHIPPED_DATE: Regex = Regex::new(
        r"(?i)Shipped Date[:\s]+([\d\-/]+)"
    ).unwrap();

    pub static ref SHIP_NAME: Regex = Regex::new(
        r"(?i)Ship Name[:\s]+(.+)"
    ).unwrap();

    pub static ref SHIP_ADDRESS: Regex = Regex::new(
        r"(?i)Ship Address[:\s]+(.+)"
    ).unwrap();

    pub static ref SHIP_CITY: Regex = Regex::new(
        r"(?i)Ship City[:\s]+(.+)"
    ).unwrap();

    pub static ref SHIP_REGION: Regex = Regex::new(
        r"(?i)Ship Region[:\s]+(.+)"
    ).unwrap();

    pub static ref SHIP_POSTAL_CODE: Regex = Regex::new(
        r"(?i)Ship Postal Code[:\s]+(.+)"
    ).unwrap();

    pub static ref SHIP_COUNTRY: Regex = Regex::new(
        r"(?i)Ship Country[:\s]+(.+)"
    ).unwrap();

    /// Product name, quantity, unit price, total; may span lines.
    pub static ref SHIPPING_PRODUCT: Regex = Regex::new(
        r"(?is)Product[:\s]*(.+?)\s*Quantity[:\s]*(\d+)\s*Unit Price[:\s]*([\d.]+)\s*Total[:\s]*([\d.]+)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_date_accepts_slashes_and_dashes() {
        let caps = ORDER_DATE.captures("order date: 05/01/2024").unwrap();
        assert_eq!(&caps[1], "05/01/2024");

        let caps = ORDER_DATE.captures("Order Date 2024-01-05").unwrap();
        assert_eq!(&caps[1], "2024-01-05");
    }

    #[test]
    fn test_address_stops_at_line_end() {
        let caps = ADDRESS.captures("Address: 12 Main St\nCity: Paris").unwrap();
        assert_eq!(&caps[1], "12 Main St");
    }

    #[test]
    fn test_contact_name_single_line() {
        let caps = CONTACT_NAME
            .captures("Contact Name: John Smith\nAddress: 1 Rue Royale")
            .unwrap();
        assert_eq!(caps[1].trim(), "John Smith");
    }

    #[test]
    fn test_purchase_order_header_positional() {
        let caps = PURCHASE_ORDER_HEADER
            .captures("10248 2016-07-04 Vins et alcools Chevalier")
            .unwrap();
        assert_eq!(&caps[1], "10248");
        assert_eq!(&caps[2], "2016-07-04");
        assert_eq!(caps[3].trim(), "Vins et alcools Chevalier");
    }

    #[test]
    fn test_shipping_product_spans_lines() {
        let text = "product: Chai\nquantity: 10\nunit price: 18.0\ntotal: 180.0";
        let caps = SHIPPING_PRODUCT.captures(text).unwrap();
        assert_eq!(&caps[1], "Chai");
        assert_eq!(&caps[2], "10");
        assert_eq!(&caps[3], "18.0");
        assert_eq!(&caps[4], "180.0");
    }
}
