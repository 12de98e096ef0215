use anyhow::Result;
use doctor_voice_gen::utils::logging;
use doctor_voice_gen::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging, Some(&config.output_log_file))?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
