use colored::Colorize;
use proxystack_cloud::StackDeployer;

pub async fn handle(deployer: &dyn StackDeployer, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!(
            "{} {}",
            "警告: スタックと全リソース（Elastic IP を含む）を削除します:".yellow(),
            deployer.stack_name().cyan()
        );
        println!("実行するには --yes オプションを指定してください");
        return Ok(());
    }

    println!(
        "{} {}",
        "スタックを削除中...".blue(),
        deployer.stack_name().cyan()
    );
    deployer.destroy().await?;
    println!("{}", "✓ スタックを削除しました".green().bold());

    Ok(())
}
