//! Fixed seed data.
//!
//! The default set is embedded from `data/placeholder.json`; tests build
//! their own with [`SeedData::from_json`] or by constructing the struct.

use std::collections::HashSet;

use db::models::{Customer, Invoice, Revenue, User};
use serde::{Deserialize, Serialize};

use crate::SeedError;

const PLACEHOLDER: &str = include_str!("../data/placeholder.json");

/// The four ordered record lists the pipeline inserts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub revenue: Vec<Revenue>,
}

impl SeedData {
    /// The dashboard's placeholder data set.
    pub fn placeholder() -> Result<Self, SeedError> {
        Self::from_json(PLACEHOLDER)
    }

    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Invoices whose `customer_id` is not among this set's customers.
    pub fn orphan_invoices(&self) -> Vec<&Invoice> {
        let customers: HashSet<_> = self.customers.iter().map(|c| c.id).collect();
        self.invoices
            .iter()
            .filter(|i| !customers.contains(&i.customer_id))
            .collect()
    }
}
