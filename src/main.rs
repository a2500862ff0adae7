use std::sync::Arc;

use crm_gateway::prelude::*;
use futures::StreamExt;
use tokio::io::AsyncWrite;
use tracing::info;

fn main() {
    CliApp::new("crm-gateway")
        .with_args(parse_args)
        .run(run_gateway);
}

/// Parse and validate command-line arguments
fn parse_args(args: Vec<String>) -> Result<GatewayConfig, AppError> {
    GatewayConfig::from_args(args)
}

/// Wire the order service, the customer source and the aggregator, then
/// stream joined records to stdout
async fn run_gateway(writers: Writers, config: GatewayConfig) -> Result<(), AppError> {
    init_logging(config.log_level);

    // Order service side: store behind the request-stream handler
    let store = Arc::new(config.store_config().build()?);
    let handler = Arc::new(OrderQueryHandler::new(store)?);
    let connection = Arc::new(MultiplexedConnection::connect(handler));
    let orders = OrderStreamClient::new(Arc::clone(&connection))?;

    let result = match &config.customers {
        Some(path) => {
            let reader = CustomerSourceReader::new(FileCustomerTransport::new(path))
                .with_retry_policy(config.retry_policy());
            aggregate(reader, orders, &config, writers).await
        }
        None => {
            let reader = CustomerSourceReader::new(InMemoryCustomerTransport::samples())
                .with_retry_policy(config.retry_policy());
            aggregate(reader, orders, &config, writers).await
        }
    };

    connection.close();
    let written = result?;
    info!(records = written, "Aggregation finished");
    Ok(())
}

async fn aggregate<C: CustomerFeed>(
    customers: C,
    orders: OrderStreamClient,
    config: &GatewayConfig,
    writers: Writers,
) -> Result<usize, AppError> {
    let aggregator = Aggregator::new(customers, orders).with_concurrency(config.concurrency);

    let joined = if config.isolate_failures {
        aggregator.with_failure_policy(IsolateErrors).joined_stream()
    } else {
        aggregator.joined_stream()
    };

    write_records(joined, writers.stdout).await
}

/// Write every joined record as a JSON line; records emitted before an
/// aborting error are still flushed
async fn write_records<W>(mut joined: JoinedStream, out: W) -> Result<usize, AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = JsonLinesWriter::new(out);

    let outcome = loop {
        match joined.next().await {
            Some(Ok(record)) => writer.write(&record).await?,
            Some(Err(e)) => break Err(e),
            None => break Ok(()),
        }
    };

    let written = writer.written();
    writer.finish().await?;
    outcome?;
    Ok(written)
}
