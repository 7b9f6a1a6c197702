#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chartgen_server::start().await
}
