use anyhow::Result;
use math_feedback::app::App;
use math_feedback::config::Config;
use math_feedback::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并执行命令
    let args: Vec<String> = std::env::args().skip(1).collect();
    App::initialize(config).await?.run(&args).await?;

    Ok(())
}
