use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use triage_core::vitals::fahrenheit_to_celsius;
use triage_core::{
    compute_triage, display_flags, score_breakdown, Patient, PatientStatus, TriageConfig,
    TriageLevel, TriageService, VitalSigns,
};
use triage_json::{parse_intake_str, parse_vitals_str, JsonFileRepository};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "triage-cli",
    about = "Quản lý hàng đợi phân loại cấp cứu trên một file JSON."
)]
struct Args {
    /// File cấu hình TOML (mặc định: ./triage.toml nếu có).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// File JSON chứa danh sách bệnh nhân.
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tính mức phân loại từ chỉ số nhập tay, không lưu.
    Score {
        #[arg(long)]
        heart_rate: Option<f64>,
        #[arg(long)]
        bp_sys: Option<f64>,
        #[arg(long)]
        bp_dia: Option<f64>,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long, value_enum, default_value_t = TemperatureUnit::C)]
        unit: TemperatureUnit,
        #[arg(long)]
        o2: Option<f64>,
        #[arg(long, default_value_t = 0)]
        pain: u8,
        #[arg(long)]
        emergency: bool,
    },
    /// Đăng ký bệnh nhân từ file JSON tiếp nhận.
    Register {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Ghi chỉ số sống từ file JSON và chấm điểm lại.
    Vitals {
        #[arg(long)]
        id: Uuid,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Điều dưỡng đặt mức phân loại thủ công.
    Triage {
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_parser = parse_level)]
        level: TriageLevel,
        #[arg(long)]
        priority: Option<u8>,
    },
    /// Chuyển trạng thái bệnh nhân.
    Status {
        #[arg(long)]
        id: Uuid,
        #[arg(long, value_parser = parse_status)]
        to: PatientStatus,
    },
    /// Ghim hoặc bỏ ghim bệnh nhân.
    Pin {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        off: bool,
    },
    /// Đặt thứ hạng thủ công; bỏ trống để xoá.
    Rank {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        rank: Option<u32>,
    },
    /// Xoá hồ sơ bệnh nhân.
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// In hai hàng đợi hiện tại.
    Queues {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TemperatureUnit {
    C,
    F,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Settings {
    store: Option<PathBuf>,
    triage: TriageConfig,
}

fn parse_level(value: &str) -> Result<TriageLevel, String> {
    TriageLevel::parse(value).ok_or_else(|| format!("mức phân loại không hợp lệ: {value}"))
}

fn parse_status(value: &str) -> Result<PatientStatus, String> {
    PatientStatus::parse(value).ok_or_else(|| format!("trạng thái không hợp lệ: {value}"))
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut builder = config::Config::builder();
    builder = match path {
        Some(path) => builder.add_source(config::File::from(path)),
        None => builder.add_source(config::File::with_name("triage").required(false)),
    };
    let settings = builder
        .add_source(
            config::Environment::with_prefix("TRIAGE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Không đọc được cấu hình")?;
    Ok(settings.try_deserialize()?)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;
    tracing::debug!(?settings, "settings loaded");

    let store_path = args
        .store
        .or(settings.store)
        .unwrap_or_else(|| PathBuf::from("patients.json"));
    let triage_config = settings.triage;
    let service = || -> anyhow::Result<TriageService<JsonFileRepository>> {
        let store = JsonFileRepository::open(&store_path)
            .with_context(|| format!("Không mở được kho {:?}", store_path))?;
        tracing::debug!(path = %store_path.display(), "patient store opened");
        Ok(TriageService::new(store, triage_config.clone()))
    };

    match args.command {
        Command::Score {
            heart_rate,
            bp_sys,
            bp_dia,
            temperature,
            unit,
            o2,
            pain,
            emergency,
        } => {
            let temperature = match unit {
                TemperatureUnit::C => temperature,
                TemperatureUnit::F => temperature.map(fahrenheit_to_celsius),
            };
            let vitals = VitalSigns {
                heart_rate,
                blood_pressure_sys: bp_sys,
                blood_pressure_dia: bp_dia,
                temperature,
                o2_saturation: o2,
                recorded_at: None,
            };
            print_score(&vitals, pain, emergency)?;
        }
        Command::Register { input } => {
            let payload = read_file(&input)?;
            let intake = parse_intake_str(&payload)?;
            let patient = service()?.register(intake)?;
            print_patient(&patient);
        }
        Command::Vitals { id, input } => {
            let payload = read_file(&input)?;
            let vitals = parse_vitals_str(&payload)?;
            let flags = display_flags(&vitals);
            if flags.any() {
                tracing::warn!(patient_id = %id, ?flags, "chỉ số bất thường");
            }
            let patient = service()?.record_vitals(id, vitals)?;
            print_patient(&patient);
        }
        Command::Triage {
            id,
            level,
            priority,
        } => {
            let patient = service()?.update_triage(id, level, priority)?;
            print_patient(&patient);
        }
        Command::Status { id, to } => {
            let patient = service()?.transition_status(id, to)?;
            print_patient(&patient);
        }
        Command::Pin { id, off } => {
            let patient = service()?.set_pinned(id, !off)?;
            print_patient(&patient);
        }
        Command::Rank { id, rank } => {
            let patient = service()?.set_manual_order(id, rank)?;
            print_patient(&patient);
        }
        Command::Delete { id } => {
            service()?.delete_patient(id)?;
            tracing::info!(patient_id = %id, "đã xoá hồ sơ");
        }
        Command::Queues { search, json } => {
            let queues = service()?.dashboard(search.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&queues)?);
                return Ok(());
            }
            let summary = queues.summary();
            println!(
                "Chưa phân loại: {} | Đã phân loại: {} | Cần xử lý ngay: {}",
                summary.unscheduled, summary.scheduled, summary.requires_immediate
            );
            println!("\n== Chưa phân loại ==");
            queues.unscheduled.iter().for_each(print_patient);
            println!("\n== Đã phân loại ==");
            queues.scheduled.iter().for_each(print_patient);
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Không đọc được file {:?}", path))
}

fn print_score(vitals: &VitalSigns, pain: u8, emergency: bool) -> anyhow::Result<()> {
    if pain > 10 {
        bail!("pain phải trong khoảng 0..=10");
    }
    vitals.validate()?;
    tracing::debug!(?vitals, pain, emergency, "scoring ad-hoc vitals");
    let level = compute_triage(Some(vitals), pain, emergency);
    println!("Mức phân loại: {level} (ưu tiên {})", level.default_priority());
    match score_breakdown(vitals, pain) {
        Some(breakdown) if !emergency => println!(
            "Điểm: {} (HR {}, HA {}, nhiệt {}, SpO2 {}, đau {})",
            breakdown.total(),
            breakdown.heart_rate,
            breakdown.blood_pressure_sys,
            breakdown.temperature,
            breakdown.o2_saturation,
            breakdown.pain
        ),
        Some(_) => println!("Cờ cấp cứu: bỏ qua chấm điểm"),
        None => println!("Chưa có chỉ số sống"),
    }
    Ok(())
}

fn print_patient(patient: &Patient) {
    let pin = if patient.is_pinned { "*" } else { " " };
    println!(
        "{pin} {} | {:<24} | {:<11} | P{} | {:<11} | {}",
        patient.id,
        patient.full_name,
        patient.triage_level.as_str(),
        patient.priority,
        patient.status.as_str(),
        patient.symptoms
    );
}
