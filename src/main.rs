use rask_log_fanout::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::main().await
}
