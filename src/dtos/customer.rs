use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::ledger::LedgerRow;
use crate::models::customer::Customer;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            address: customer.address,
            created_at: customer.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomerSearchQuery {
    /// Name or phone fragment.
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerSearchRow {
    pub customer_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub pending_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct CustomerSummaryResponse {
    pub customer_id: i64,
    pub name: String,
    pub pending_amount: f64,
    pub last_bill_id: Option<i64>,
    pub last_bill_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct UdharOutstandingRow {
    pub customer_id: i64,
    pub customer_name: String,
    pub phone: Option<String>,
    pub total_udhar: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct CustomerOutstandingResponse {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_udhar: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub customer_id: i64,
    pub customer_name: String,
    pub ledger: Vec<LedgerRow>,
    pub closing_balance: f64,
}
