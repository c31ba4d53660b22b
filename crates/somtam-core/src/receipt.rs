//! Printable receipt data for a paid order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settings::ShopSettings;
use crate::types::{Order, Payment, PaymentMethod};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    /// Unit price including add-ons.
    pub unit_price_cents: i64,
    pub addons: Vec<String>,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub shop_name: String,
    pub shop_address: Option<String>,
    pub shop_phone: Option<String>,
    pub order_number: String,
    pub table_number: Option<String>,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    /// Rate in basis points, as configured when the receipt was built.
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub method: PaymentMethod,
    pub received_cents: i64,
    pub change_cents: i64,
    pub footer: String,
}

impl Receipt {
    /// Builds a receipt from an order and the payment that settled it.
    pub fn build(order: &Order, payment: &Payment, settings: &ShopSettings) -> CoreResult<Self> {
        if payment.order_id != order.id {
            return Err(CoreError::not_found("Payment", format!("{} for order {}", payment.id, order.id)));
        }

        let lines = order
            .lines
            .iter()
            .map(|line| ReceiptLine {
                name: line.name_snapshot.clone(),
                quantity: line.quantity,
                unit_price_cents: (line.unit_price() + line.addons_price()).cents(),
                addons: line.addons.iter().map(|a| a.name.clone()).collect(),
                total_cents: line.total_price_cents,
            })
            .collect();

        Ok(Receipt {
            shop_name: settings.shop_name.clone(),
            shop_address: settings.shop_address.clone(),
            shop_phone: settings.shop_phone.clone(),
            order_number: order.order_number.clone(),
            table_number: order.table_number.clone(),
            issued_at: payment.created_at,
            lines,
            subtotal_cents: order.subtotal_cents,
            tax_rate_bps: settings.tax_rate.bps(),
            tax_cents: order.tax_cents,
            discount_cents: order.discount_cents,
            total_cents: payment.amount_cents,
            method: payment.method,
            received_cents: payment.received_cents.unwrap_or(payment.amount_cents),
            change_cents: payment.change_cents,
            footer: settings.receipt_footer.clone(),
        })
    }

    /// Plain-text rendering for a thermal printer.
    pub fn render_text(&self, symbol: &str) -> String {
        let money = |cents: i64| Money::from_cents(cents).format_with(symbol);
        let mut out = Vec::new();

        out.push(self.shop_name.clone());
        out.extend(self.shop_address.clone());
        out.extend(self.shop_phone.clone());
        out.push(format!("Order: {}", self.order_number));
        if let Some(table) = &self.table_number {
            out.push(format!("Table: {}", table));
        }
        out.push(self.issued_at.format("%Y-%m-%d %H:%M").to_string());
        out.push(String::new());

        for line in &self.lines {
            out.push(format!("{} x{}  {}", line.name, line.quantity, money(line.total_cents)));
            for addon in &line.addons {
                out.push(format!("  + {}", addon));
            }
        }

        out.push(String::new());
        out.push(format!("Subtotal  {}", money(self.subtotal_cents)));
        if self.discount_cents != 0 {
            out.push(format!("Discount  -{}", money(self.discount_cents)));
        }
        out.push(format!(
            "VAT {}.{:02}%  {}",
            self.tax_rate_bps / 100,
            self.tax_rate_bps % 100,
            money(self.tax_cents)
        ));
        out.push(format!("Total  {}", money(self.total_cents)));
        out.push(format!("Paid ({})  {}", self.method, money(self.received_cents)));
        if self.method == PaymentMethod::Cash {
            out.push(format!("Change  {}", money(self.change_cents)));
        }
        out.push(String::new());
        out.push(self.footer.clone());

        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::fixtures::*;
    use crate::order::testing::place;
    use crate::pricing::LineRequest;
    use crate::settlement::{settle, PaymentRequest};

    #[test]
    fn test_build_and_render() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap();
        let mut order = place(
            vec![LineRequest::new(SOM_TAM, 1).with_addons([SALTED_EGG])],
            now,
        );
        order.table_number = Some("T2".to_string());
        let payment = settle(&mut order, &PaymentRequest::cash(10000), "p1".into(), now).unwrap();

        let receipt = Receipt::build(&order, &payment, &ShopSettings::default()).unwrap();
        assert_eq!(receipt.lines[0].unit_price_cents, 5500);
        assert_eq!(receipt.lines[0].addons, vec!["Salted Egg".to_string()]);
        assert_eq!(receipt.total_cents, 5885);
        assert_eq!(receipt.change_cents, 10000 - 5885);

        let text = receipt.render_text("฿");
        assert!(text.contains("Table: T2"));
        assert!(text.contains("Total  ฿58.85"));
        assert!(text.contains("Change  ฿41.15"));
        assert!(text.ends_with("Thank you!"));
    }

    #[test]
    fn test_mismatched_payment() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap();
        let mut order = place(vec![LineRequest::new(LARB, 1)], now);
        let other = place(vec![LineRequest::new(LARB, 1)], now);
        let payment = settle(&mut order, &PaymentRequest::cash(10000), "p1".into(), now).unwrap();

        assert!(Receipt::build(&other, &payment, &ShopSettings::default()).is_err());
    }
}
