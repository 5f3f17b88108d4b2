use super::print_outputs;
use proxystack_cloud::StackDeployer;

pub async fn handle(deployer: &dyn StackDeployer, json: bool) -> anyhow::Result<()> {
    let outputs = deployer.outputs().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        print_outputs(&outputs);
    }

    Ok(())
}
