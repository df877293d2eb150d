use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use featureflags_rs::{
    ClientConfig, Defaults, EvaluationContext, FeatureFlags, Variable, VariableType,
};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Feature flags server (overrides FEATUREFLAGS_URL)
    #[arg(long)]
    host: Option<String>,

    /// Project name (overrides FEATUREFLAGS_PROJECT)
    #[arg(short, long)]
    project: Option<String>,

    /// YAML file with flag and value defaults
    #[arg(short, long)]
    defaults: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a flag once
    Flag {
        name: String,

        /// Evaluation context as a JSON object
        #[arg(short, long, default_value = "{}")]
        context: String,
    },
    /// Evaluate a value once
    Value {
        name: String,

        /// Evaluation context as a JSON object
        #[arg(short, long, default_value = "{}")]
        context: String,
    },
    /// Keep evaluating a flag while background sync runs
    Watch {
        name: String,

        #[arg(short, long, default_value = "{}")]
        context: String,

        /// Seconds between evaluations
        #[arg(short, long, default_value_t = 5)]
        every: u64,
    },
}

fn build_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let base_url = args
        .host
        .clone()
        .or_else(|| std::env::var("FEATUREFLAGS_URL").ok())
        .unwrap_or_else(|| "https://flags.example.com".to_string());
    let project = args
        .project
        .clone()
        .or_else(|| std::env::var("FEATUREFLAGS_PROJECT").ok())
        .unwrap_or_else(|| "test.test".to_string());

    let config = ClientConfig::new(base_url, project)
        .with_env_intervals()?
        .with_variables(vec![Variable::new("user.id", VariableType::Number)]);
    Ok(config)
}

fn parse_context(raw: &str) -> anyhow::Result<EvaluationContext> {
    serde_json::from_str(raw).with_context(|| format!("invalid context JSON: {}", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let defaults = match &args.defaults {
        Some(path) => Defaults::load_yaml(path)?,
        None => Defaults::new().flag("some_flag", false),
    };

    log::info!(
        "Connecting to {} for project {}",
        config.base_url,
        config.project
    );
    let flags = FeatureFlags::connect(config, defaults).await?;

    match args.command {
        Commands::Flag { name, context } => {
            let ctx = parse_context(&context)?;
            println!("{}: {}", name, flags.get(&name, &ctx));
        }
        Commands::Value { name, context } => {
            let ctx = parse_context(&context)?;
            match flags.value(&name, &ctx) {
                Some(value) => println!("{}: {}", name, value),
                None => println!("{}: <not declared>", name),
            }
        }
        Commands::Watch {
            name,
            context,
            every,
        } => {
            let ctx = parse_context(&context)?;
            let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));
            loop {
                ticker.tick().await;
                println!(
                    "[v{}] {}: {}",
                    flags.version(),
                    name,
                    flags.get(&name, &ctx)
                );
            }
        }
    }

    Ok(())
}
