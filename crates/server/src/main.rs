#[tokio::main]
async fn main() -> anyhow::Result<()> {
    drivespot_server::start().await
}
