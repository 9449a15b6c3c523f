// ==========================================
// 学员管理后台 - 命令行入口
// ==========================================
// 子命令:
// - preview <entity> <file>   预览并打印映射与首页
// - import  <entity> <file>   预览 → 调整 → 确认导入
// - export                    导出学员 CSV
// ==========================================

use academy_console::app::{commands, AppState, ServiceMode};
use academy_console::config::{ConsoleConfig, JsonFileSettingsStore, SettingsStore};
use academy_console::{i18n, logging};
use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "academy-console")]
#[command(version, about = "Spreadsheet import console for academy records")]
struct Cli {
    /// Service mode: local (parse + SQLite) or remote (REST API)
    #[arg(long, global = true, default_value = "local")]
    mode: ServiceMode,

    /// JSON config file (overrides environment lookup)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Message language (en / zh-CN)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a file and print the column mapping and a page of rows
    Preview(PreviewArgs),
    /// Preview, adjust and commit a file
    Import(ImportArgs),
    /// Export participants to CSV
    Export(ExportArgs),
}

#[derive(Args)]
struct PreviewArgs {
    /// participant / program / module
    entity: String,
    file: String,
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(Args)]
struct ImportArgs {
    /// participant / program / module
    entity: String,
    file: String,
    /// Row index to leave out (0-based, repeatable)
    #[arg(long = "deselect")]
    deselect: Vec<usize>,
    /// Cell override as INDEX:FIELD=VALUE (repeatable)
    #[arg(long = "set")]
    set: Vec<String>,
    /// Header override as FIELD=HEADER, or FIELD= to unmap (repeatable)
    #[arg(long = "map")]
    map: Vec<String>,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, short, default_value = "participants_export.csv")]
    output: String,
}

/// 解析 INDEX:FIELD=VALUE
fn parse_cell_override(raw: &str) -> anyhow::Result<(usize, String, String)> {
    let (index, rest) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected INDEX:FIELD=VALUE, got {}", raw))?;
    let (field, value) = rest
        .split_once('=')
        .ok_or_else(|| anyhow!("expected INDEX:FIELD=VALUE, got {}", raw))?;
    let index = index
        .trim()
        .parse::<usize>()
        .with_context(|| format!("invalid row index in {}", raw))?;
    Ok((index, field.trim().to_string(), value.to_string()))
}

/// 解析 FIELD=HEADER
fn parse_mapping_override(raw: &str) -> anyhow::Result<(String, Option<String>)> {
    let (field, header) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected FIELD=HEADER, got {}", raw))?;
    let header = Some(header.trim().to_string()).filter(|h| !h.is_empty());
    Ok((field.trim().to_string(), header))
}

/// 预览并在失败时返回状态中的错误消息
async fn preview(state: &AppState, entity: &str, file: &str) -> anyhow::Result<()> {
    let raw = commands::preview_file(state, entity, file)
        .await
        .map_err(|e| anyhow!(e))?;
    let snapshot: serde_json::Value = serde_json::from_str(&raw)?;
    if let Some(error) = snapshot["status"]["error"].as_str() {
        bail!("{}", error);
    }
    Ok(())
}

fn print_json(raw: &str) -> anyhow::Result<()> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    if let Some(locale) = &cli.locale {
        i18n::set_locale(locale);
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", academy_console::APP_NAME, academy_console::VERSION);
    tracing::info!("==================================================");

    let config = match &cli.config {
        Some(path) => ConsoleConfig::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConsoleConfig::from_env()?,
    };
    let settings: Arc<dyn SettingsStore> =
        Arc::new(JsonFileSettingsStore::open(&config.settings_path)?);
    let state = AppState::new(config, settings, cli.mode).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Preview(args) => {
            preview(&state, &args.entity, &args.file).await?;
            let view = commands::go_to_page(&state, &args.entity, args.page).map_err(|e| anyhow!(e))?;
            print_json(&commands::get_import_snapshot(&state, &args.entity).map_err(|e| anyhow!(e))?)?;
            print_json(&view)?;
        }
        Commands::Import(args) => {
            preview(&state, &args.entity, &args.file).await?;

            for raw in &args.map {
                let (field, header) = parse_mapping_override(raw)?;
                commands::remap_field(&state, &args.entity, &field, header.as_deref())
                    .map_err(|e| anyhow!(e))?;
            }
            for index in &args.deselect {
                commands::toggle_row(&state, &args.entity, *index).map_err(|e| anyhow!(e))?;
            }
            for raw in &args.set {
                let (index, field, value) = parse_cell_override(raw)?;
                commands::edit_cell(&state, &args.entity, index, &field, &value)
                    .map_err(|e| anyhow!(e))?;
            }

            let raw = commands::confirm_import(&state, &args.entity, None)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&raw)?;

            let outcome: serde_json::Value = serde_json::from_str(&raw)?;
            if outcome["outcome"] != "COMMITTED" {
                bail!("import not committed");
            }
        }
        Commands::Export(args) => {
            let raw = commands::export_participants(&state, &args.output)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&raw)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        assert_eq!(
            parse_cell_override("3:email=a@b.com").unwrap(),
            (3, "email".to_string(), "a@b.com".to_string())
        );
        assert!(parse_cell_override("x:email=a").is_err());
        assert_eq!(
            parse_mapping_override("semester=").unwrap(),
            ("semester".to_string(), None)
        );
    }
}
