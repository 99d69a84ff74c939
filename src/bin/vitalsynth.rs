//! Vitalsynth CLI - Command-line interface for Vitalsynth
//!
//! Commands:
//! - generate: Synthesize a bundle document from a stress preset
//! - transform: Re-date and perturb an existing bundle document
//! - stream: Emit live vitals ticks as stream packets
//! - inspect: Summarize and validate a bundle document
//! - doctor: Diagnose engine health and configuration
//! - schema: Print exchange format information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};

use vitalsynth::document;
use vitalsynth::generate::{generate, GenerationRequest, ManipulationPolicy};
use vitalsynth::packet::StreamPacket;
use vitalsynth::pattern::PatternKind;
use vitalsynth::presets::StressPreset;
use vitalsynth::rng::SeededRng;
use vitalsynth::scenario::StreamScenario;
use vitalsynth::stream::{StreamEngine, TickOutcome};
use vitalsynth::transform::{transform, transpose_to_now};
use vitalsynth::types::Bundle;
use vitalsynth::{PRODUCER_NAME, VITALSYNTH_VERSION};

/// Vitalsynth - On-device synthesis engine for portable biometric datasets
#[derive(Parser)]
#[command(name = "vitalsynth")]
#[command(author = "Vitalsynth Contributors")]
#[command(version = VITALSYNTH_VERSION)]
#[command(about = "Synthesize and transform portable biometric datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a bundle document from a stress preset
    Generate {
        /// Stress preset (lower_stress, normal, higher_stress, edge_cases)
        #[arg(long, default_value = "normal")]
        preset: StressPreset,

        /// Manipulation policy (keep_original, generate_missing, smooth_replace, accessibility_mode)
        #[arg(long, default_value = "smooth_replace")]
        policy: ManipulationPolicy,

        /// Range start (RFC 3339); must be paired with --end
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Range end (RFC 3339); must be paired with --start
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Days of data ending now, used when no explicit range is given
        #[arg(long, default_value = "7")]
        days: i64,

        /// Seed for the deterministic generator
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Synthesize menstrual cycle data
        #[arg(long)]
        include_menstrual: bool,

        /// Existing bundle document to merge with (use - for stdin)
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Re-date and perturb an existing bundle document
    Transform {
        /// Input bundle document (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Statistical pattern (similar, amplified, reduced, inverted, random)
        #[arg(long, default_value = "similar")]
        pattern: PatternKind,

        /// Target range start (RFC 3339)
        #[arg(long)]
        target_start: Option<DateTime<Utc>>,

        /// Target range end (RFC 3339)
        #[arg(long)]
        target_end: Option<DateTime<Utc>>,

        /// Shift the bundle so it ends now, keeping its duration
        #[arg(long)]
        to_now: bool,

        /// Seed for the deterministic generator
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Emit live vitals ticks as stream packets
    Stream {
        /// Stream scenario (normal, low_stress, stress, extreme, edge_cases, workout, sleep)
        #[arg(long, default_value = "normal")]
        scenario: StreamScenario,

        /// Seed for the deterministic generator
        #[arg(long, default_value = "1")]
        seed: u64,

        /// Number of ticks to run
        #[arg(long, default_value = "60")]
        ticks: u64,

        /// Simulated seconds between ticks
        #[arg(long, default_value = "1")]
        interval_secs: i64,

        /// Bundle document supplying the stream baselines (use - for stdin)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Write length-prefixed binary frames instead of NDJSON
        #[arg(long)]
        framed: bool,
    },

    /// Summarize and validate a bundle document
    Inspect {
        /// Input bundle document (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Check a bundle document file
        #[arg(long)]
        bundle: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print exchange format information
    Schema {
        /// Format to print (document or packet)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Bundle document (vitals.bundle.v1)
    Document,
    /// Length-prefixed stream packet
    Packet,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    match cli.command {
        Commands::Generate {
            preset,
            policy,
            start,
            end,
            days,
            seed,
            include_menstrual,
            existing,
            output,
        } => cmd_generate(
            preset,
            policy,
            start,
            end,
            days,
            seed,
            include_menstrual,
            existing.as_deref(),
            &output,
        ),

        Commands::Transform {
            input,
            pattern,
            target_start,
            target_end,
            to_now,
            seed,
            output,
        } => cmd_transform(&input, pattern, target_start, target_end, to_now, seed, &output),

        Commands::Stream {
            scenario,
            seed,
            ticks,
            interval_secs,
            source,
            framed,
        } => cmd_stream(scenario, seed, ticks, interval_secs, source.as_deref(), framed),

        Commands::Inspect { input, json } => cmd_inspect(&input, json),

        Commands::Doctor { bundle, json } => cmd_doctor(bundle.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    preset: StressPreset,
    policy: ManipulationPolicy,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    days: i64,
    seed: u64,
    include_menstrual: bool,
    existing: Option<&std::path::Path>,
    output: &PathBuf,
) -> Result<(), VitalsCliError> {
    let (start, end) = resolve_range(start, end, days)?;

    let existing = match existing {
        Some(path) => Some(document::decode(&read_input(path)?)?),
        None => None,
    };

    let request = GenerationRequest {
        preset,
        policy,
        start,
        end,
        seed,
        include_menstrual,
    };

    let bundle = generate(&request, existing.as_ref())?;
    let json = document::encode(&bundle)?;
    write_output(output, &json)
}

fn cmd_transform(
    input: &PathBuf,
    pattern: PatternKind,
    target_start: Option<DateTime<Utc>>,
    target_end: Option<DateTime<Utc>>,
    to_now: bool,
    seed: u64,
    output: &PathBuf,
) -> Result<(), VitalsCliError> {
    let source = document::decode(&read_input(input)?)?;

    let bundle = if to_now {
        transpose_to_now(&source, pattern, seed, Utc::now())?
    } else {
        match (target_start, target_end) {
            (Some(start), Some(end)) => transform(&source, start, end, pattern, seed)?,
            _ => {
                return Err(VitalsCliError::MissingRange(
                    "Provide both --target-start and --target-end, or use --to-now".to_string(),
                ))
            }
        }
    };

    let json = document::encode(&bundle)?;
    write_output(output, &json)
}

fn cmd_stream(
    scenario: StreamScenario,
    seed: u64,
    ticks: u64,
    interval_secs: i64,
    source: Option<&std::path::Path>,
    framed: bool,
) -> Result<(), VitalsCliError> {
    let mut engine = StreamEngine::new(scenario, seed);

    if let Some(path) = source {
        let bundle = document::decode(&read_input(path)?)?;
        engine = engine.with_baselines_from(&bundle);
    }

    // Simulated clock: ticks advance without sleeping, so the stream can be
    // captured as fast as it serializes
    let mut now = Utc::now();
    engine.start(now);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for _ in 0..ticks {
        now += Duration::seconds(interval_secs);
        match engine.tick(now) {
            TickOutcome::Emitted(point) => {
                let packet = StreamPacket::from_point(&point, engine.scenario());
                if framed {
                    out.write_all(&packet.encode()?)?;
                } else {
                    writeln!(out, "{}", serde_json::to_string(&packet)?)?;
                }
            }
            TickOutcome::HourlyLimitReached => continue,
            TickOutcome::TotalLimitReached => break,
            TickOutcome::Inactive => break,
        }
    }

    out.flush()?;
    Ok(())
}

fn cmd_inspect(input: &PathBuf, json: bool) -> Result<(), VitalsCliError> {
    let bundle = document::decode(&read_input(input)?)?;
    let report = InspectReport::from_bundle(&bundle);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Bundle Report");
        println!("=============");
        println!("Bundle ID:   {}", report.bundle_id);
        println!("Range:       {} .. {}", report.start_date, report.end_date);
        println!("Samples:     {}", report.total_samples);
        println!();
        println!("Series:");
        println!("  heart_rate:         {}", report.heart_rate);
        println!("  hrv:                {}", report.hrv);
        println!("  activity:           {}", report.activity);
        println!("  sleep:              {}", report.sleep);
        println!("  workouts:           {}", report.workouts);
        println!("  respiratory:        {}", report.respiratory);
        println!("  oxygen:             {}", report.oxygen);
        println!("  skin_temperature:   {}", report.skin_temperature);
        println!("  body_temperature:   {}", report.body_temperature);
        println!("  wheelchair:         {}", report.wheelchair);
        println!("  exercise_time:      {}", report.exercise_time);
        println!("  menstrual:          {}", report.menstrual);
        println!(
            "  resting_heart_rate: {}",
            if report.has_resting_heart_rate { 1 } else { 0 }
        );

        if let Some(mean) = report.mean_heart_rate {
            println!();
            println!("Mean heart rate: {:.1} bpm", mean);
        }
        if let Some(mean) = report.mean_hrv {
            println!("Mean HRV:        {:.1} ms", mean);
        }
    }

    Ok(())
}

fn cmd_doctor(bundle: Option<&std::path::Path>, json: bool) -> Result<(), VitalsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    // Check engine version
    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitalsynth version {}", VITALSYNTH_VERSION),
    });

    // Check document version
    checks.push(DoctorCheck {
        name: "document_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Bundle document: {}", document::DOCUMENT_VERSION),
    });

    // Check the deterministic generator against its known first draw
    let mut rng = SeededRng::new(1);
    let generator_check = if rng.next_u64() == 2862933558814942250 {
        DoctorCheck {
            name: "generator".to_string(),
            status: CheckStatus::Ok,
            message: "Deterministic generator healthy".to_string(),
        }
    } else {
        DoctorCheck {
            name: "generator".to_string(),
            status: CheckStatus::Error,
            message: "Deterministic generator produced unexpected output".to_string(),
        }
    };
    checks.push(generator_check);

    // Check bundle file if provided
    if let Some(bundle_path) = bundle {
        if bundle_path.exists() {
            match fs::read_to_string(bundle_path) {
                Ok(content) => match document::decode(&content) {
                    Ok(parsed) => {
                        let days = (parsed.end_date - parsed.start_date).num_days();
                        checks.push(DoctorCheck {
                            name: "bundle".to_string(),
                            status: CheckStatus::Ok,
                            message: format!(
                                "Bundle valid ({} samples over {} days)",
                                parsed.total_samples(),
                                days
                            ),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "bundle".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid bundle document: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "bundle".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read bundle file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "bundle".to_string(),
                status: CheckStatus::Warning,
                message: "Bundle file does not exist".to_string(),
            });
        }
    }

    // Check stdin is available (for piped documents)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (document input ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VITALSYNTH_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitalsynth Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), VitalsCliError> {
    match schema_type {
        SchemaType::Document => {
            if json_schema {
                println!("{}", get_document_json_schema());
            } else {
                println!("Document Schema: {}", document::DOCUMENT_VERSION);
                println!();
                println!("A bundle document is a pretty-printed JSON object with:");
                println!();
                println!("- document_version: Format tag ({})", document::DOCUMENT_VERSION);
                println!("- bundle_id: UUID of the dataset");
                println!("- created_at, start_date, end_date: RFC 3339 timestamps");
                println!("- Sample series (arrays, omitted when empty):");
                println!("  - heart_rate, hrv");
                println!("  - activity, sleep, workouts");
                println!("  - respiratory, oxygen");
                println!("  - skin_temperature, body_temperature");
                println!("  - wheelchair, exercise_time, menstrual");
                println!("- resting_heart_rate: Optional scalar summary");
                println!();
                println!("Every sample carries a timestamp (or start/end pair) and a");
                println!("source string recording its provenance.");
            }
        }
        SchemaType::Packet => {
            if json_schema {
                println!("{}", get_packet_json_schema());
            } else {
                println!("Stream Packet");
                println!();
                println!("A frame is a 4-byte big-endian length prefix followed by a");
                println!("JSON body of at most 1 MiB:");
                println!();
                println!("- timestamp: RFC 3339 emission time");
                println!("- heart_rate: Heart rate in bpm (optional)");
                println!("- hrv: SDNN in milliseconds (optional)");
                println!("- scenario: Active stream scenario");
                println!("- source: Provenance string (vitalsynth/stream)");
            }
        }
    }

    Ok(())
}

// Helper functions

fn resolve_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), VitalsCliError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        (None, None) => {
            let end = Utc::now();
            Ok((end - Duration::days(days), end))
        }
        _ => Err(VitalsCliError::MissingRange(
            "--start and --end must be given together".to_string(),
        )),
    }
}

fn read_input(input: &std::path::Path) -> Result<String, VitalsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &std::path::Path, data: &str) -> Result<(), VitalsCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn get_document_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://vitalsynth.dev/schemas/vitals.bundle.v1.json",
        "title": "vitals.bundle.v1",
        "description": "Vitalsynth portable biometric bundle document",
        "type": "object",
        "required": ["document_version", "bundle_id", "created_at", "start_date", "end_date"],
        "properties": {
            "document_version": {
                "type": "string",
                "const": "vitals.bundle.v1"
            },
            "bundle_id": { "type": "string", "format": "uuid" },
            "created_at": { "type": "string", "format": "date-time" },
            "start_date": { "type": "string", "format": "date-time" },
            "end_date": { "type": "string", "format": "date-time" },
            "heart_rate": { "type": "array", "items": { "type": "object" } },
            "hrv": { "type": "array", "items": { "type": "object" } },
            "activity": { "type": "array", "items": { "type": "object" } },
            "sleep": { "type": "array", "items": { "type": "object" } },
            "workouts": { "type": "array", "items": { "type": "object" } },
            "respiratory": { "type": "array", "items": { "type": "object" } },
            "oxygen": { "type": "array", "items": { "type": "object" } },
            "skin_temperature": { "type": "array", "items": { "type": "object" } },
            "body_temperature": { "type": "array", "items": { "type": "object" } },
            "wheelchair": { "type": "array", "items": { "type": "object" } },
            "exercise_time": { "type": "array", "items": { "type": "object" } },
            "menstrual": { "type": "array", "items": { "type": "object" } },
            "resting_heart_rate": { "type": "number" }
        }
    })
    .to_string()
}

fn get_packet_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://vitalsynth.dev/schemas/vitals.packet.v1.json",
        "title": "vitals.packet.v1",
        "description": "Vitalsynth stream packet body (framed with a 4-byte big-endian length prefix)",
        "type": "object",
        "required": ["timestamp", "scenario", "source"],
        "properties": {
            "timestamp": { "type": "string", "format": "date-time" },
            "heart_rate": { "type": "number" },
            "hrv": { "type": "number" },
            "scenario": {
                "type": "string",
                "enum": ["normal", "low_stress", "stress", "extreme", "edge_cases", "workout", "sleep"]
            },
            "source": { "type": "string" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Engine(vitalsynth::EngineError),
    Json(serde_json::Error),
    MissingRange(String),
    DoctorFailed,
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<vitalsynth::EngineError> for VitalsCliError {
    fn from(e: vitalsynth::EngineError) -> Self {
        VitalsCliError::Engine(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'vitalsynth inspect' on input documents for details".to_string()),
            },
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalsCliError::MissingRange(msg) => CliError {
                code: "MISSING_RANGE".to_string(),
                message: msg,
                hint: Some("Timestamps are RFC 3339, e.g. 2024-05-01T00:00:00Z".to_string()),
            },
            VitalsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct InspectReport {
    bundle_id: String,
    start_date: String,
    end_date: String,
    total_samples: usize,
    heart_rate: usize,
    hrv: usize,
    activity: usize,
    sleep: usize,
    workouts: usize,
    respiratory: usize,
    oxygen: usize,
    skin_temperature: usize,
    body_temperature: usize,
    wheelchair: usize,
    exercise_time: usize,
    menstrual: usize,
    has_resting_heart_rate: bool,
    mean_heart_rate: Option<f64>,
    mean_hrv: Option<f64>,
}

impl InspectReport {
    fn from_bundle(bundle: &Bundle) -> Self {
        InspectReport {
            bundle_id: bundle.bundle_id.clone(),
            start_date: bundle.start_date.to_rfc3339(),
            end_date: bundle.end_date.to_rfc3339(),
            total_samples: bundle.total_samples(),
            heart_rate: bundle.heart_rate.len(),
            hrv: bundle.hrv.len(),
            activity: bundle.activity.len(),
            sleep: bundle.sleep.len(),
            workouts: bundle.workouts.len(),
            respiratory: bundle.respiratory.len(),
            oxygen: bundle.oxygen.len(),
            skin_temperature: bundle.skin_temperature.len(),
            body_temperature: bundle.body_temperature.len(),
            wheelchair: bundle.wheelchair.len(),
            exercise_time: bundle.exercise_time.len(),
            menstrual: bundle.menstrual.len(),
            has_resting_heart_rate: bundle.resting_heart_rate.is_some(),
            mean_heart_rate: bundle.mean_heart_rate(),
            mean_hrv: bundle.mean_hrv(),
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
