#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = edumon_submissions::run().await {
        eprintln!("edumon-submit fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
