use colored::Colorize;
use proxystack_cloud::{CloudAssembly, Template};
use proxystack_config::StackInputs;
use std::path::Path;

pub fn handle(
    inputs: &StackInputs,
    stack_name: &str,
    template: &Template,
    out: &Path,
    print: bool,
) -> anyhow::Result<()> {
    let assembly = CloudAssembly::new(out);
    let artifact = assembly.write(stack_name, &inputs.account_id, &inputs.region, template)?;

    if print {
        println!("{}", template.to_json_pretty()?);
    }

    eprintln!(
        "{} {}",
        "✓ テンプレートを生成しました:".green(),
        artifact.template_path.display().to_string().cyan()
    );
    eprintln!(
        "  リソース: {}個 / 出力: {}個 ({} / {})",
        template.resources.len(),
        template.outputs.len(),
        inputs.account_id,
        inputs.region
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxystack_cloud::{DeclareOptions, UserData, declare};
    use proxystack_config::IpAllowList;

    #[test]
    fn test_synth_writes_assembly() {
        let inputs = StackInputs {
            account_id: "123456789012".to_string(),
            region: "us-east-1".to_string(),
            proxy_username: "proxyuser".to_string(),
            proxy_password: "s3cr3t".to_string(),
            image_id: "ami-0abcd1234".to_string(),
            ip_list: IpAllowList::new("1.2.3.4"),
            instance_type: "t3.micro".to_string(),
        };
        let template = declare(
            &inputs,
            &DeclareOptions::new(UserData::from_text("#!/bin/bash\n")),
        )
        .unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        handle(&inputs, "AwsProxyServerStack", &template, temp_dir.path(), false).unwrap();

        let written = CloudAssembly::new(temp_dir.path())
            .load_template("AwsProxyServerStack")
            .unwrap();
        assert_eq!(written, template);
    }
}
