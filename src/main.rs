use clap::Parser;
use notequery::cli::{self, Cli, Commands};
use notequery::config::Config;

fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 初始化日志
    notequery::init(cli.verbose)?;

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 执行命令
    match cli.command {
        Commands::Query(args) => cli::commands::query(args, &config),
        Commands::Pages(args) => cli::commands::list_pages(args, &config),
        Commands::Sync(args) => cli::commands::sync(args, &config),
        Commands::Relatives(args) => cli::commands::relatives(args, &config),
        Commands::Titles(args) => cli::commands::titles(args, &config),
    }
}
