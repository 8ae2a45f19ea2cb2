//! Demo number provider
//!
//! `LocalNumberPool` implements the `NumberProvider` trait without any
//! upstream carrier: it fabricates numbers in the country's dialing format
//! and, after a short delay, a verification code. Useful for development and
//! as the reference implementation of the provider contract.

use async_trait::async_trait;
use numio_core::{
    models::{Country, NumberRequest},
    traits::NumberProvider,
    AppResult,
};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::constants::SUBSCRIBER_DIGITS;

/// Locally backed number pool
///
/// Tracks handed-out numbers so the same number is never allocated twice
/// within one process lifetime.
pub struct LocalNumberPool {
    subscriber_digits: usize,
    allocated: Mutex<HashSet<String>>,
}

impl LocalNumberPool {
    /// Create an empty pool generating `subscriber_digits` national digits
    pub fn new(subscriber_digits: usize) -> Self {
        Self {
            subscriber_digits,
            allocated: Mutex::new(HashSet::new()),
        }
    }

    /// Generate one number in `+<phone_code><digits>` form
    ///
    /// The first subscriber digit is never zero, matching common national
    /// numbering plans.
    fn generate_number(&self, country: &Country) -> String {
        let mut rng = rand::thread_rng();
        let mut digits = String::with_capacity(self.subscriber_digits);
        digits.push(char::from(b'1' + rng.gen_range(0..9u8)));
        for _ in 1..self.subscriber_digits {
            digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
        }
        format!("+{}{}", country.phone_code, digits)
    }

    /// Generate a 4-digit verification code
    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        rng.gen_range(1000..10000u32).to_string()
    }
}

impl Default for LocalNumberPool {
    fn default() -> Self {
        Self::new(SUBSCRIBER_DIGITS)
    }
}

#[async_trait]
impl NumberProvider for LocalNumberPool {
    #[instrument(skip(self, country), fields(country = %country.code))]
    async fn allocate(&self, country: &Country) -> AppResult<String> {
        let mut allocated = self.allocated.lock();
        loop {
            let number = self.generate_number(country);
            if allocated.insert(number.clone()) {
                debug!("Allocated number {}", number);
                return Ok(number);
            }
        }
    }

    async fn availability(&self, _country_id: i32, _application_id: i32) -> AppResult<i64> {
        // The local pool is effectively unbounded; report a plausible estimate
        let mut rng = rand::thread_rng();
        Ok(rng.gen_range(1000..50000))
    }

    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    async fn fetch_sms(&self, request: &NumberRequest) -> AppResult<Option<String>> {
        let code = Self::generate_code();
        debug!("Fabricated verification code for {}", request.phone_number);
        Ok(Some(format!("Your verification code is {}", code)))
    }
}
