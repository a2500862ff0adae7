use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::Level;

use super::error::AppError;
use crate::client::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};
use crate::storage::{DEFAULT_CUSTOMER_IDS, DEFAULT_MAX_ORDERS_PER_CUSTOMER, OrderStoreConfig};
use crate::streaming::DEFAULT_CONCURRENCY;

/// Join every customer with its orders and print one JSON line per customer
#[derive(Parser, Debug)]
#[command(name = "crm-gateway")]
#[command(version, about, long_about = None)]
struct CliArgs {
    /// CSV customer body with an `id,name` header (built-in sample customers if omitted)
    #[arg(long, value_name = "FILE")]
    customers: Option<PathBuf>,

    /// Seed for the synthetic order store (entropy if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Highest customer id the order store is populated for
    #[arg(long, default_value_t = *DEFAULT_CUSTOMER_IDS.end())]
    max_customer_id: u32,

    /// Exclusive upper bound on orders per customer
    #[arg(long, default_value_t = DEFAULT_MAX_ORDERS_PER_CUSTOMER)]
    max_orders: u32,

    /// Maximum order fetches in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    concurrency: usize,

    /// Customer fetch retries after the first attempt
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    retries: usize,

    /// Delay before the first customer fetch retry, doubling after each
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_INITIAL_DELAY.as_millis() as u64)]
    initial_backoff_ms: u64,

    /// Emit a degraded record for a customer whose orders cannot be fetched instead of aborting
    #[arg(long)]
    isolate_failures: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Runtime settings for one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// CSV customer body; the built-in sample customers when `None`
    pub customers: Option<PathBuf>,
    pub seed: Option<u64>,
    pub max_customer_id: u32,
    pub max_orders: u32,
    pub concurrency: usize,
    pub retries: usize,
    pub initial_backoff: Duration,
    pub isolate_failures: bool,
    pub log_level: Level,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            customers: None,
            seed: None,
            max_customer_id: *DEFAULT_CUSTOMER_IDS.end(),
            max_orders: DEFAULT_MAX_ORDERS_PER_CUSTOMER,
            concurrency: DEFAULT_CONCURRENCY,
            retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_DELAY,
            isolate_failures: false,
            log_level: Level::WARN,
        }
    }
}

impl From<CliArgs> for GatewayConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            customers: args.customers,
            seed: args.seed,
            max_customer_id: args.max_customer_id,
            max_orders: args.max_orders,
            concurrency: args.concurrency,
            retries: args.retries,
            initial_backoff: Duration::from_millis(args.initial_backoff_ms),
            isolate_failures: args.isolate_failures,
            log_level: args.log_level,
        }
    }
}

impl GatewayConfig {
    /// Parse process arguments, program name first
    ///
    /// `--help` and `--version` print and exit the process.
    pub fn from_args<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = CliArgs::try_parse_from(args).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => AppError::InvalidArguments(e.to_string()),
        })?;
        Ok(args.into())
    }

    pub fn store_config(&self) -> OrderStoreConfig {
        OrderStoreConfig {
            customer_ids: *DEFAULT_CUSTOMER_IDS.start()..=self.max_customer_id,
            max_orders_per_customer: self.max_orders,
            seed: self.seed,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::backoff(self.retries, self.initial_backoff)
    }
}
