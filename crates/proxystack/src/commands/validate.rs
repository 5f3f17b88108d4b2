use colored::Colorize;
use proxystack_cloud::Template;
use proxystack_cloud::stack::{PARAMETER_NAMESPACE, PROXY_PORT, SSH_PORT};
use proxystack_config::StackInputs;

pub fn handle(inputs: &StackInputs, template: &Template) {
    println!("{}", "✓ 設定は正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  アカウント: {} ({})", inputs.account_id.cyan(), inputs.region);
    println!(
        "  インスタンス: {} ({})",
        inputs.instance_type.cyan(),
        inputs.image_id
    );
    println!("  許可ポート: {}, {}", PROXY_PORT, SSH_PORT);
    println!(
        "  許可 IP: {}個 ({})",
        inputs.ip_list.entries().len(),
        inputs.ip_list
    );
    println!("  パラメータ名前空間: {}", PARAMETER_NAMESPACE);
    println!("  リソース: {}個", template.resources.len());
    for (id, resource) in &template.resources {
        println!("    - {} ({})", id.cyan(), resource.resource_type);
    }
    println!("  出力: {}個", template.outputs.len());
    for id in template.outputs.keys() {
        println!("    - {}", id.cyan());
    }
}
