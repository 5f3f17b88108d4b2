use super::{print_outputs, print_plan};
use anyhow::Context;
use colored::Colorize;
use proxystack_cloud::{CloudError, StackDeployer, Template};

pub async fn handle(
    deployer: &dyn StackDeployer,
    template: &Template,
    yes: bool,
) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "デプロイを開始します...".blue().bold(),
        deployer.stack_name().cyan()
    );

    // 確認（--yesが指定されていない場合は変更内容だけ表示）
    if !yes {
        let plan = deployer.plan(template).await?;
        println!();
        print_plan(&plan);
        if plan.has_changes {
            println!();
            println!("実行するには --yes オプションを指定してください");
        }
        return Ok(());
    }

    let auth = deployer.check_auth().await?;
    if !auth.authenticated {
        return Err(CloudError::AuthenticationFailed(auth.error.unwrap_or_default()))
            .with_context(|| format!("{} の認証に失敗しました", deployer.name()));
    }

    let result = deployer.deploy(template).await?;

    println!();
    print_plan(&result.plan);
    println!();
    println!(
        "{} {} ({:.1}秒)",
        "✓ デプロイ完了:".green().bold(),
        result.status,
        result.duration_ms as f64 / 1000.0
    );
    println!();
    println!("出力:");
    print_outputs(&result.outputs);

    Ok(())
}
