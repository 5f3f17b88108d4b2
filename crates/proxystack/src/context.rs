use anyhow::{Context, bail};
use clap::Args;
use proxystack_cloud::user_data::DEFAULT_USER_DATA_PATH;
use proxystack_cloud::{
    CloudAssembly, DeclareOptions, Template, UserData, UserDataMode, declare,
};
use proxystack_config::{EnvFile, StackInputs, find_env_file};
use std::path::{Path, PathBuf};

/// Options shared by every command that declares the stack
#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    /// ブートスクリプトのパス
    #[arg(long, default_value = DEFAULT_USER_DATA_PATH)]
    pub user_data: PathBuf,

    /// ブートスクリプトを Tera テンプレートとして扱い {{ ip_list }} を展開
    #[arg(long)]
    pub render_ip_list: bool,

    /// デフォルト VPC とサブネットを EC2 API で解決してテンプレートに固定
    #[arg(long)]
    pub lookup_vpc: bool,
}

impl TemplateArgs {
    fn mode(&self) -> UserDataMode {
        if self.render_ip_list {
            UserDataMode::RenderAllowList
        } else {
            UserDataMode::Literal
        }
    }
}

/// Read the input set from the process environment and the `.env` file
pub fn load_inputs(env_file: Option<&Path>) -> anyhow::Result<StackInputs> {
    let path = env_file.map(Path::to_path_buf).or_else(find_env_file);
    let env = EnvFile::load_optional(path.as_deref())?;
    tracing::debug!(env_file = ?env.path(), variables = env.len(), "Resolving stack inputs");
    Ok(StackInputs::from_env_with(&env)?)
}

/// Read the boot script and declare the stack
pub async fn build_template(
    inputs: &StackInputs,
    args: &TemplateArgs,
    stack_name: &str,
) -> anyhow::Result<Template> {
    let user_data = UserData::load(&args.user_data, args.mode(), &inputs.ip_list)?;
    tracing::debug!(source = ?user_data.source(), mode = ?args.mode(), "Boot script ready");

    let network = if args.lookup_vpc {
        let network = proxystack_cloud_aws::lookup_default_network(&inputs.region)
            .await
            .context("デフォルト VPC の解決に失敗しました")?;
        Some(network)
    } else {
        None
    };

    let options = DeclareOptions::new(user_data)
        .with_stack_name(stack_name)
        .with_network(network);

    Ok(declare(inputs, &options)?)
}

/// Read a template previously written by `synth`
///
/// The manifest must name the same stack, account and region as the
/// current inputs.
pub fn load_assembly(
    dir: &Path,
    stack_name: &str,
    inputs: &StackInputs,
) -> anyhow::Result<Template> {
    let assembly = CloudAssembly::new(dir);
    let manifest = assembly
        .load_manifest()
        .with_context(|| format!("アセンブリを読み込めません: {}", dir.display()))?;

    if manifest.stack_name != stack_name {
        bail!(
            "アセンブリのスタック名が一致しません: {} (指定: {})",
            manifest.stack_name,
            stack_name
        );
    }
    if manifest.account_id != inputs.account_id || manifest.region != inputs.region {
        bail!(
            "アセンブリのデプロイ先が一致しません: {}/{} (設定: {}/{})",
            manifest.account_id,
            manifest.region,
            inputs.account_id,
            inputs.region
        );
    }

    Ok(assembly.load_template(&manifest.stack_name)?)
}
