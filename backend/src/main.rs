#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crowdfund_server::start_server().await?;

    Ok(())
}
