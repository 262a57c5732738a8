use clap::Parser;

use shorturls::cli::{Cli, Commands};
use shorturls::config::{StaticConfig, get_config, init_config_from};
use shorturls::runtime::modes::run_server;
use shorturls::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if let Some(Commands::GenerateConfig { path }) = cli.command {
        return generate_config(path.as_deref());
    }

    init_config_from(&cli.config);
    let config = get_config();

    // guard 必须存活到进程结束
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    run_server().await
}

fn generate_config(path: Option<&str>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            if let Err(e) = StaticConfig::default().save_to_file(path) {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            println!("Sample configuration written to {}", path);
        }
        None => print!("{}", StaticConfig::generate_sample_config()),
    }
    Ok(())
}
