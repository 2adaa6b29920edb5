// ==========================================
// 车队碳排放报告系统 - 命令行入口
// ==========================================
// 子命令: generate（生成报告） / template（下载模板）
// 退出码: 0 成功，1 致命错误，2 等待人工确认车型
// ==========================================

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use fleet_carbon_report::api::{ApiError, ReportApi, ReportResponse};
use fleet_carbon_report::config::{config_keys, ConfigManager};
use fleet_carbon_report::domain::ReportOutput;
use fleet_carbon_report::exporter::TemplateKind;
use fleet_carbon_report::importer::CsvSource;
use fleet_carbon_report::logging;

/// 等待人工确认车型时的退出码
const EXIT_PAUSED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "fleet-carbon-report",
    version,
    about = "Reconcile trip logs with a vehicle registry and report carbon emissions"
)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Generate(GenerateArgs),
    Template(TemplateArgs),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// Trips CSV file
    #[arg(long)]
    trips: PathBuf,

    /// Vehicles CSV file
    #[arg(long)]
    vehicles: PathBuf,

    /// Manual vehicle category, e.g. --category V12=HGV
    #[arg(long = "category", value_name = "ID=CAT")]
    categories: Vec<String>,

    /// Report CSV output (stdout when omitted)
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    vehicle_summary_out: Option<PathBuf>,

    /// Print the full report as JSON instead of CSV
    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    locale: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct TemplateArgs {
    #[arg(long, value_enum)]
    kind: TemplateArg,

    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum TemplateArg {
    Trips,
    Vehicles,
}

impl From<TemplateArg> for TemplateKind {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Trips => TemplateKind::Trips,
            TemplateArg::Vehicles => TemplateKind::Vehicles,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let result = match cli.command {
        Commands::Generate(args) => generate(&args),
        Commands::Template(args) => template(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

// 配置: --config 优先，其次平台配置目录下的 config.json，否则默认值
fn load_config(path: Option<&Path>) -> Result<ConfigManager> {
    if let Some(path) = path {
        return ConfigManager::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    match ConfigManager::default_config_path() {
        Some(path) if path.exists() => ConfigManager::load_from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        _ => Ok(ConfigManager::new()),
    }
}

fn parse_category_args(args: &[String]) -> Result<HashMap<String, String>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(id, cat)| (id.trim().to_string(), cat.trim().to_string()))
                .filter(|(id, _)| !id.is_empty())
                .ok_or_else(|| anyhow!("invalid --category '{}', expected ID=CAT", arg))
        })
        .collect()
}

fn generate(args: &GenerateArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    if let Some(locale) = &args.locale {
        config.set_config_value(config_keys::LOCALE, locale)?;
    }
    let manual = parse_category_args(&args.categories)?;

    let mut api = ReportApi::new(Arc::new(config)).map_err(|e| user_error(None, e))?;
    api.upload_trips(CsvSource::path(&args.trips));
    api.upload_vehicles(CsvSource::path(&args.vehicles));

    let mut response = api.generate_report().map_err(|e| user_error(Some(&api), e))?;

    if let ReportResponse::Paused { vehicle_ids } = &response {
        if manual.is_empty() {
            print_ambiguous(vehicle_ids);
            return Ok(ExitCode::from(EXIT_PAUSED));
        }

        response = match api.supply_classifications(&manual) {
            Ok(response) => response,
            Err(ApiError::ClassificationIncomplete { vehicle_ids }) => {
                print_ambiguous(&vehicle_ids);
                return Ok(ExitCode::from(EXIT_PAUSED));
            }
            Err(e) => return Err(user_error(Some(&api), e)),
        };
    }

    let report = response
        .report()
        .ok_or_else(|| anyhow!("report generation did not complete"))?;
    info!(
        report_id = %report.report_id,
        rows = report.rows.len(),
        total_emissions_kg = report.summary.total_emissions_kg,
        "报告已生成"
    );
    for note in &report.notes {
        warn!(kind = ?note.kind, "{}", note.message);
    }

    write_outputs(&api, report, args)?;
    Ok(ExitCode::SUCCESS)
}

fn write_outputs(api: &ReportApi, report: &ReportOutput, args: &GenerateArgs) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(report)?;
        write_text(args.out.as_deref(), &json)?;
    } else {
        let csv = api
            .export_report_csv()
            .map_err(|e| user_error(Some(api), e))?;
        write_text(args.out.as_deref(), &csv)?;
    }

    if let Some(path) = &args.vehicle_summary_out {
        let csv = api
            .export_vehicle_summary_csv()
            .map_err(|e| user_error(Some(api), e))?;
        write_text(Some(path), &csv)?;
    }
    Ok(())
}

fn template(args: &TemplateArgs) -> Result<ExitCode> {
    let kind = TemplateKind::from(args.kind);
    let csv = fleet_carbon_report::exporter::template_csv(kind)?;
    write_text(args.out.as_deref(), &csv)?;
    Ok(ExitCode::SUCCESS)
}

fn write_text(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "已写出文件");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn print_ambiguous(vehicle_ids: &[String]) {
    eprintln!("Vehicle category required for:");
    for id in vehicle_ids {
        eprintln!("  {}", id);
    }
    eprintln!("Re-run with --category <ID>=<LGV|MGV|HGV|UNKNOWN> for each vehicle.");
}

// 错误文案按当前语言翻译
fn user_error(api: Option<&ReportApi>, err: ApiError) -> anyhow::Error {
    let locale = api.map(|a| a.locale()).unwrap_or("en");
    if err.is_user_error() {
        anyhow!(err.user_message(locale))
    } else {
        anyhow::Error::new(err).context("internal error")
    }
}
