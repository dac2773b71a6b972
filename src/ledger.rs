use std::collections::{hash_map, HashMap};

use tracing::info;

use crate::{error::Error, reader::RawRow};

/// A single occurrence of a product: how many were sold and at what price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub amount: i64,
    pub price: f64,
}

impl Entry {
    fn parse(row: &RawRow) -> Result<Self, Error> {
        let amount = row
            .amount
            .parse::<i64>()
            .map_err(|e| Error::InvalidAmount {
                product: row.name.clone(),
                token: row.amount.clone(),
                reason: e.to_string(),
            })?;
        let price = row.price.parse::<f64>().map_err(|e| Error::InvalidPrice {
            product: row.name.clone(),
            token: row.price.clone(),
            reason: e.to_string(),
        })?;
        Ok(Entry { amount, price })
    }
}

/// Entries grouped by product name.
/// Products are kept in the order they first appear in the input and
/// each product's entries are kept in file order, so the position of an
/// entry is the product's occurrence rank.
#[derive(Debug, Default, PartialEq)]
pub struct ProductLedger {
    // Index into `products` for each name
    positions: HashMap<String, usize>,
    products: Vec<(String, Vec<Entry>)>,
}

impl ProductLedger {
    /// Build the ledger from every row. The first row that fails to parse
    /// aborts the whole build.
    pub fn from_rows<I>(rows: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut ledger = ProductLedger::default();
        for row in rows {
            let entry = Entry::parse(&row)?;
            ledger.push(row.name, entry);
        }
        info!(products = ledger.len(), "aggregated product ledger");
        Ok(ledger)
    }

    fn push(&mut self, name: String, entry: Entry) {
        match self.positions.entry(name) {
            hash_map::Entry::Occupied(pos) => self.products[*pos.get()].1.push(entry),
            hash_map::Entry::Vacant(slot) => {
                self.products.push((slot.key().clone(), vec![entry]));
                slot.insert(self.products.len() - 1);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&[Entry]> {
        self.positions
            .get(name)
            .map(|&pos| self.products[pos].1.as_slice())
    }

    /// Products with their entries, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.products
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|(name, _)| name.as_str())
    }
}
