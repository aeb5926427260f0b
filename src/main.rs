use anyhow::Context;
use stacks_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Stacks settings")?;
    stacks_app::app::serve(settings).await
}
