mod commands;
mod context;

use clap::{Parser, Subcommand};
use colored::Colorize;
use context::TemplateArgs;
use proxystack_cloud::assembly::DEFAULT_OUT_DIR;
use proxystack_cloud::stack::DEFAULT_STACK_NAME;
use proxystack_cloud::WaitConfig;
use proxystack_cloud_aws::CloudFormationDeployer;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "proxystack")]
#[command(about = "Tinyproxy フォワードプロキシを AWS に宣言・デプロイする", long_about = None)]
struct Cli {
    /// CloudFormation スタック名
    #[arg(
        long,
        global = true,
        env = "PROXYSTACK_STACK_NAME",
        default_value = DEFAULT_STACK_NAME
    )]
    stack_name: String,

    /// スタック操作の待機タイムアウト（分）
    #[arg(long, global = true, env = "PROXYSTACK_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// .env ファイルのパス（省略時は ./.env）
    #[arg(long, global = true, env = "PROXYSTACK_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// デバッグログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// テンプレートを生成して cdk.out に書き出す
    Synth {
        #[command(flatten)]
        template: TemplateArgs,
        /// 出力ディレクトリ
        #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
        out: PathBuf,
        /// テンプレートを標準出力にも表示
        #[arg(long)]
        print: bool,
    },
    /// デプロイ済みスタックとの差分を表示
    Diff {
        #[command(flatten)]
        template: TemplateArgs,
    },
    /// スタックをデプロイ
    Deploy {
        #[command(flatten)]
        template: TemplateArgs,
        /// synth 済みのアセンブリディレクトリからテンプレートを読み込む
        #[arg(long, value_name = "DIR")]
        app: Option<PathBuf>,
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// スタックの出力値を表示
    Outputs {
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// スタックを削除
    Destroy {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 設定とブートスクリプトを検証（AWS へは接続しない）
    Validate {
        #[command(flatten)]
        template: TemplateArgs,
    },
    /// バージョン情報を表示
    Version,
}

async fn connect(stack_name: &str, region: &str, timeout_minutes: u64) -> CloudFormationDeployer {
    let wait = WaitConfig::default().with_timeout(Duration::from_secs(timeout_minutes.saturating_mul(60)));
    CloudFormationDeployer::new(stack_name, region)
        .await
        .with_wait_config(wait)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("{}", "✗ エラー".red().bold());
        for (i, cause) in e.chain().enumerate() {
            if i == 0 {
                eprintln!("  {}", cause);
            } else {
                eprintln!("  原因: {}", cause);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Versionコマンドは設定不要
    if matches!(cli.command, Commands::Version) {
        println!("proxystack {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // 入力が揃っていなければ何も宣言せずに終了
    let inputs = context::load_inputs(cli.env_file.as_deref())?;

    match cli.command {
        Commands::Synth {
            template,
            out,
            print,
        } => {
            let built = context::build_template(&inputs, &template, &cli.stack_name).await?;
            commands::synth::handle(&inputs, &cli.stack_name, &built, &out, print)?;
        }
        Commands::Validate { template } => {
            let built = context::build_template(&inputs, &template, &cli.stack_name).await?;
            commands::validate::handle(&inputs, &built);
        }
        Commands::Diff { template } => {
            let built = context::build_template(&inputs, &template, &cli.stack_name).await?;
            let deployer = connect(&cli.stack_name, &inputs.region, cli.timeout).await;
            commands::diff::handle(&deployer, &built).await?;
        }
        Commands::Deploy { template, app, yes } => {
            let built = match app {
                Some(dir) => context::load_assembly(&dir, &cli.stack_name, &inputs)?,
                None => context::build_template(&inputs, &template, &cli.stack_name).await?,
            };
            let deployer = connect(&cli.stack_name, &inputs.region, cli.timeout).await;
            commands::deploy::handle(&deployer, &built, yes).await?;
        }
        Commands::Outputs { json } => {
            let deployer = connect(&cli.stack_name, &inputs.region, cli.timeout).await;
            commands::outputs::handle(&deployer, json).await?;
        }
        Commands::Destroy { yes } => {
            let deployer = connect(&cli.stack_name, &inputs.region, cli.timeout).await;
            commands::destroy::handle(&deployer, yes).await?;
        }
        // 上で処理済み
        Commands::Version => {}
    }

    Ok(())
}
