#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bmsapi::run_server().await
}
