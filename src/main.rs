#[tokio::main]
async fn main() -> anyhow::Result<()> {
    apotheca::bootstrapper::run().await
}
