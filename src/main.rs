use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use veriwipe::certificate::verifier::{CertificateVerifier, TrustStore};
use veriwipe::certificate::{CertificateBuilder, VerifyResult};
use veriwipe::config::AppConfig;
use veriwipe::crypto::{PublicVerifier, Signer};
use veriwipe::drives::DeviceProbe;
use veriwipe::executor::{Executor, RealBlockDevice, SystemSanitizeCommands, WipeOperation};
use veriwipe::log_chain::HashChainLog;
use veriwipe::selector;
use veriwipe::ui::ProgressRenderer;

#[derive(Parser)]
#[command(name = "veriwipe")]
#[command(about = "Secure block-device sanitization with signed, offline-verifiable certificates")]
#[command(version)]
struct Cli {
    /// Enumerate devices and print the selected strategy per device; exits 0.
    #[arg(long)]
    probe: bool,

    /// Offline-verify a certificate file; exits 0 on valid, 1 on invalid.
    #[arg(long, value_name = "PATH")]
    verify: Option<PathBuf>,

    /// With --verify, print the verification result as JSON.
    #[arg(long, requires = "verify")]
    json: bool,

    /// Dump host capability summary.
    #[arg(long)]
    info: bool,

    /// Sanitize a device by path, using the selected strategy. This is an
    /// operator-facing shortcut into the core; the full interactive shell
    /// is a separate client of this crate and is not part of this binary.
    #[arg(long, value_name = "DEVICE")]
    wipe: Option<PathBuf>,

    /// Where to write the signed certificate for --wipe.
    #[arg(long, value_name = "PATH")]
    cert_output: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    install_signal_handler();

    if let Some(path) = &cli.verify {
        return run_verify(path, cli.json).await;
    }
    if cli.probe {
        return run_probe().await;
    }
    if cli.info {
        return run_info().await;
    }
    if let Some(device) = &cli.wipe {
        return run_wipe(device, cli.cert_output.as_deref()).await;
    }

    println!(
        "veriwipe core: interactive shell is a separate client of this crate.\n\
         Use --probe, --wipe <device>, --verify <path>, or --info."
    );
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = match level {
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

/// Raw device I/O and vendor sanitize commands require root; fail fast
/// with `permission_denied` rather than partway through pre-flight.
#[cfg(unix)]
fn require_root() -> anyhow::Result<()> {
    if unsafe { libc::geteuid() } != 0 {
        anyhow::bail!(
            "{}",
            veriwipe::error::WipeErrorKind::PermissionDenied.diagnose()
        );
    }
    Ok(())
}

#[cfg(not(unix))]
fn require_root() -> anyhow::Result<()> {
    Ok(())
}

fn install_signal_handler() {
    if let Ok(mut signals) = signal_hook::iterator::Signals::new([signal_hook::consts::SIGINT]) {
        std::thread::spawn(move || {
            if signals.forever().next().is_some() {
                veriwipe::set_interrupted();
            }
        });
    }
}

async fn run_probe() -> anyhow::Result<()> {
    let facts = DeviceProbe::probe_all();
    if facts.is_empty() {
        println!("no disk-class block devices found");
        return Ok(());
    }
    for device in &facts {
        let strategy = selector::select(device);
        println!(
            "{}\tmodel={}\tmedia={:?}\tstrategy={}\tclassification={:?}",
            device.device_id,
            device.model,
            device.media_class,
            strategy,
            strategy.nist_classification()
        );
    }
    Ok(())
}

async fn run_info() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    println!("veriwipe {}", env!("CARGO_PKG_VERSION"));
    println!("keypair:     {}", config.private_key_path.display());
    println!("evidence log: {}", config.log_path.display());
    println!("certificates: {}", config.output_dir.display());
    let facts = DeviceProbe::probe_all();
    println!("devices probed: {}", facts.len());
    Ok(())
}

async fn run_wipe(device_path: &std::path::Path, cert_output: Option<&std::path::Path>) -> anyhow::Result<()> {
    require_root()?;

    let config = AppConfig::load()?;
    let device_path_str = device_path.to_string_lossy().to_string();

    let facts = DeviceProbe::probe_path(&device_path_str)?;
    if facts.capacity_bytes == 0 {
        anyhow::bail!("device {device_path_str} reports zero capacity");
    }

    let operation = WipeOperation::new(facts);
    println!("selected strategy: {}", operation.strategy);

    let mut log = HashChainLog::open(&config.log_path)?;
    if log.loaded_with_corruption() {
        tracing::error!("evidence log failed chain verification on load; continuing to append");
    }

    let device = Box::new(RealBlockDevice::open(
        &device_path_str,
        operation.device_facts.capacity_bytes,
    )?);
    let mut executor = Executor::new(device, Arc::new(SystemSanitizeCommands));

    let renderer = Arc::new(ProgressRenderer::new());
    executor.subscribe(renderer.callback());

    let result = executor.execute(operation, &mut log).await;

    let signer = Signer::open_or_generate_at(&config.key_paths())?;
    let certificate = CertificateBuilder::new(&signer).build(&result, &log)?;

    let output_path = cert_output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.output_dir.join(format!("{}.json", certificate.certificate_id)));
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, serde_json::to_string_pretty(&certificate)?)?;
    println!("certificate written to {}", output_path.display());

    if let (Some(started), Some(ended)) = (result.started_at, result.ended_at) {
        let elapsed = (ended - started).to_std().unwrap_or_default();
        println!("elapsed: {}", humantime::format_duration(elapsed));
    }

    if let Some(error) = result.error {
        println!(
            "{} {}",
            "wipe failed:".red().bold(),
            error.kind.diagnose()
        );
        anyhow::bail!("wipe ended in {:?}: {}", result.state, error.message);
    }
    println!("{}", "wipe completed".green().bold());
    Ok(())
}

async fn run_verify(path: &std::path::Path, as_json: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;

    let mut trust_store = TrustStore::new();
    if let Ok(config) = AppConfig::load() {
        if config.public_key_path.exists() {
            if let Ok(key) = PublicVerifier::load_pem(&config.public_key_path) {
                trust_store.insert(key);
            }
        }
    }

    let result = CertificateVerifier::new(&trust_store).verify(&bytes);
    print_result(&result, as_json);

    std::process::exit(if result.is_valid() { 0 } else { 1 });
}

fn print_result(result: &VerifyResult, as_json: bool) {
    if as_json {
        if let Ok(text) = serde_json::to_string_pretty(result) {
            println!("{text}");
        }
        return;
    }

    println!("structure_valid: {}", result.structure_valid);
    println!("signature_valid: {}", result.signature_valid);
    if let Some(cert) = &result.certificate {
        println!("certificate_id:  {}", cert.certificate_id);
        println!("issued_at:       {}", cert.issued_at);
        println!("device:          {}", cert.device_summary.model);
        println!("strategy:        {}", cert.operation_summary.strategy);
        println!("classification:  {:?}", cert.compliance.classification);
    }
    for error in &result.errors {
        println!("error: {error}");
    }
}
