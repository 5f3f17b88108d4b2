use super::print_plan;
use colored::Colorize;
use proxystack_cloud::{StackDeployer, Template};

pub async fn handle(deployer: &dyn StackDeployer, template: &Template) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "差分を計算中...".blue(),
        deployer.stack_name().cyan()
    );

    let plan = deployer.plan(template).await?;
    println!();
    print_plan(&plan);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{MockDeployer, sample_plan};

    #[tokio::test]
    async fn test_diff_only_plans() {
        let deployer = MockDeployer::new(sample_plan());
        handle(&deployer, &Template::new(None)).await.unwrap();
        assert_eq!(deployer.calls(), vec!["plan"]);
    }
}
