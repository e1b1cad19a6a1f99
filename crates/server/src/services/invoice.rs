//! Invoice rendering.
//!
//! An invoice is a transient projection of one order plus the buyer's
//! display name. The askama template produces the markup; a headless
//! Chromium instance converts it to a print-ready A5 PDF. The conversion is
//! the heaviest, most failure-prone operation in the service, so it runs on
//! the blocking pool behind a bounded semaphore with a timeout, and every
//! failure is retryable by the caller. Rendered bytes are never persisted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use pixelpress_core::Order;

use crate::config::{InvoiceConfig, PageSettings};
use crate::filters;

/// Sentinel buyer name used when no profile exists for the purchaser.
pub const UNKNOWN_BUYER: &str = "N/A";

/// Invoice conversion failure. All variants are retryable.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The invoice template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// The conversion engine failed (launch, navigation, or PDF printing).
    #[error("conversion engine error: {0}")]
    Engine(String),

    /// The conversion did not finish within the configured timeout.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    /// The render worker terminated abnormally.
    #[error("render worker terminated")]
    Worker,
}

/// One invoice line for the template.
#[derive(Debug, Clone)]
struct LineView {
    name: String,
    quantity: u32,
    photo_count: u32,
    unit_price: Decimal,
    line_total: Decimal,
}

/// One payment row for the template.
#[derive(Debug, Clone)]
struct PaymentView {
    method: String,
    reference: String,
    amount: Decimal,
}

/// Invoice document template.
#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoiceTemplate {
    order_id: String,
    issued_on: String,
    buyer: String,
    lines: Vec<LineView>,
    sub_total: Decimal,
    discounted_amount: Decimal,
    final_price: Decimal,
    payments: Vec<PaymentView>,
}

impl InvoiceTemplate {
    fn from_order(order: &Order, buyer: &str) -> Self {
        let lines = order
            .lines
            .iter()
            .map(|line| LineView {
                name: line.name.clone(),
                quantity: line.quantity,
                photo_count: line.photo_count,
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect();

        let payments = order
            .payments
            .iter()
            .map(|payment| PaymentView {
                method: payment.method.clone(),
                reference: payment
                    .transaction_ref
                    .clone()
                    .or_else(|| payment.account_number.clone())
                    .unwrap_or_else(|| "-".to_string()),
                amount: payment.amount,
            })
            .collect();

        Self {
            order_id: order.id.to_string(),
            issued_on: order.created_at.format("%d %b %Y").to_string(),
            buyer: buyer.to_string(),
            lines,
            sub_total: order.sub_total,
            discounted_amount: order.discounted_amount,
            final_price: order.final_price,
            payments,
        }
    }
}

/// Bounded invoice renderer.
#[derive(Debug)]
pub struct InvoiceRenderer {
    chrome_path: Option<PathBuf>,
    page: PageSettings,
    render_timeout: Duration,
    semaphore: Arc<Semaphore>,
}

impl InvoiceRenderer {
    /// Build a renderer from configuration.
    #[must_use]
    pub fn new(config: InvoiceConfig) -> Self {
        Self {
            chrome_path: config.chrome_path,
            page: config.page,
            render_timeout: config.render_timeout,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_renders)),
        }
    }

    /// Render an order into PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the template or the conversion engine
    /// fails, or the render exceeds its timeout. All failures are safe to
    /// retry.
    pub async fn render(&self, order: &Order, buyer: &str) -> Result<Vec<u8>, RenderError> {
        let html = InvoiceTemplate::from_order(order, buyer).render()?;

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| RenderError::Worker)?;

        let chrome_path = self.chrome_path.clone();
        let page = self.page;
        let worker = tokio::task::spawn_blocking(move || {
            // Hold the permit on the blocking thread so the pool bound
            // tracks actual engine usage, including renders that outlive
            // a caller-side timeout.
            let _permit = permit;
            convert_to_pdf(&html, chrome_path, page)
        });

        match tokio::time::timeout(self.render_timeout, worker).await {
            Err(_) => Err(RenderError::Timeout(self.render_timeout)),
            Ok(Err(_)) => Err(RenderError::Worker),
            Ok(Ok(result)) => result,
        }
    }
}

/// Drive the headless engine: load the markup via a data URL and print it
/// to an A5 (by default) PDF. Blocking; runs on the blocking pool.
fn convert_to_pdf(
    html: &str,
    chrome_path: Option<PathBuf>,
    page: PageSettings,
) -> Result<Vec<u8>, RenderError> {
    let mut builder = LaunchOptions::default_builder();
    builder.headless(true).sandbox(false);
    if let Some(path) = chrome_path {
        builder.path(Some(path));
    }
    let launch_options = builder
        .build()
        .map_err(|e| RenderError::Engine(e.to_string()))?;

    let browser = Browser::new(launch_options).map_err(|e| RenderError::Engine(e.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|e| RenderError::Engine(e.to_string()))?;

    let data_url = format!("data:text/html;base64,{}", STANDARD.encode(html));
    tab.navigate_to(&data_url)
        .map_err(|e| RenderError::Engine(e.to_string()))?
        .wait_until_navigated()
        .map_err(|e| RenderError::Engine(e.to_string()))?;

    let pdf_options = PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(true),
        paper_width: Some(page.width_in()),
        paper_height: Some(page.height_in()),
        margin_top: Some(page.margin_vertical_in()),
        margin_bottom: Some(page.margin_vertical_in()),
        margin_left: Some(page.margin_horizontal_in()),
        margin_right: Some(page.margin_horizontal_in()),
        prefer_css_page_size: Some(false),
        ..PrintToPdfOptions::default()
    };

    tab.print_to_pdf(Some(pdf_options))
        .map_err(|e| RenderError::Engine(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pixelpress_core::{OrderId, OrderLine, OrderStatus, PaymentDeclaration, ProductId, UserId};

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    fn accepted_order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            lines: vec![OrderLine {
                product_id: ProductId::generate(),
                name: "Canvas Print 20x30".to_string(),
                unit_price: dec("100"),
                quantity: 10,
                photo_count: 5,
                line_total: dec("1000"),
            }],
            sub_total: dec("1000"),
            discounted_amount: dec("150"),
            final_price: dec("850"),
            status: OrderStatus::Accepted,
            payments: vec![PaymentDeclaration {
                method: "bkash".to_string(),
                transaction_ref: Some("TRX-1234".to_string()),
                account_number: None,
                amount: dec("850"),
            }],
            policy_version: 1,
            created_by: UserId::generate(),
            updated_by: Some(UserId::generate()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn template_renders_order_details() {
        let order = accepted_order();
        let html = InvoiceTemplate::from_order(&order, "Jordan Rahman")
            .render()
            .expect("template renders");

        assert!(html.contains("Jordan Rahman"));
        assert!(html.contains("Canvas Print 20x30"));
        assert!(html.contains("TRX-1234"));
        assert!(html.contains("1000.00"));
        assert!(html.contains("150.00"));
        assert!(html.contains("850.00"));
        assert!(html.contains(&order.id.to_string()));
    }

    #[test]
    fn template_falls_back_to_sentinel_buyer() {
        let order = accepted_order();
        let html = InvoiceTemplate::from_order(&order, UNKNOWN_BUYER)
            .render()
            .expect("template renders");
        assert!(html.contains("N/A"));
    }

    #[test]
    fn payment_reference_prefers_transaction_then_account() {
        let mut order = accepted_order();
        order.payments = vec![
            PaymentDeclaration {
                method: "bank".to_string(),
                transaction_ref: None,
                account_number: Some("AC-9".to_string()),
                amount: dec("850"),
            },
            PaymentDeclaration {
                method: "cash".to_string(),
                transaction_ref: None,
                account_number: None,
                amount: dec("0"),
            },
        ];
        let html = InvoiceTemplate::from_order(&order, "X")
            .render()
            .expect("template renders");
        assert!(html.contains("AC-9"));
    }
}
