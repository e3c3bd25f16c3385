use clap::Parser;
use flowforge_console::cli::{self, actions, incidents, slo, trace, watch, Cli, Commands};
use flowforge_console::client::ApiClient;
use flowforge_console::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => match cli::load_config(&args.connect) {
            Ok(config) => {
                logging::init(&config.logging);
                watch::run_watch(args, config).await
            }
            Err(e) => Err(e),
        },
        Commands::Incidents(args) => {
            let connect = args.connect.clone();
            run_one_shot(&connect, |client| async move {
                incidents::handle_incidents(&args, &client).await
            })
            .await
        }
        Commands::Slo(args) => {
            let connect = args.connect.clone();
            run_one_shot(&connect, |client| async move {
                slo::handle_slo(&args, &client).await
            })
            .await
        }
        Commands::Trace(args) => {
            let connect = args.connect.clone();
            run_one_shot(&connect, |client| async move {
                trace::handle_trace(&args, &client).await
            })
            .await
        }
        Commands::Kill(args) => {
            run_one_shot(&args.connect, |client| async move {
                actions::handle_kill(&client).await
            })
            .await
        }
        Commands::Restart(args) => {
            let connect = args.connect.clone();
            run_one_shot(&connect, |client| async move {
                actions::handle_restart(&args, &client).await
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Shared setup for the non-interactive commands: config, logging, client,
/// then print whatever the handler produced.
async fn run_one_shot<F, Fut>(connect: &cli::ConnectArgs, handler: F) -> anyhow::Result<()>
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<String>>,
{
    let config = cli::load_config(connect)?;
    logging::init(&config.logging);
    let client = ApiClient::new(&config)?;
    let output = handler(client).await?;
    println!("{output}");
    Ok(())
}
