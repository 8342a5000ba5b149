use clap::{Parser, Subcommand};
use labnum_core::{
    config::lock_timeout_from_env_value, CoreConfig, CounterService, LabNumberService,
    MedicalType, StoreKind,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "labnum")]
#[command(about = "Lab number issuance CLI")]
struct Cli {
    /// Directory holding counters.json
    #[arg(long, env = "LAB_DATA_DIR", default_value = labnum_core::DEFAULT_LAB_DATA_DIR)]
    data_dir: PathBuf,
    /// Counter lock timeout in milliseconds
    #[arg(long, env = "LAB_COUNTER_LOCK_TIMEOUT_MS")]
    lock_timeout_ms: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue the next lab number
    Generate {
        /// Medical type, e.g. SM-VDRL or NORMAL
        medical_type: String,
        /// Patient passport number
        passport_number: String,
    },
    /// Show the last value issued by a counter
    Current {
        /// Counter name, e.g. S_SERIES
        name: String,
    },
    /// List all counters
    List,
    /// Show which series a medical type is issued from, without issuing a number
    Classify {
        /// Medical type
        medical_type: String,
    },
}

fn open_service(
    data_dir: PathBuf,
    lock_timeout_ms: Option<String>,
) -> Result<LabNumberService, Box<dyn std::error::Error>> {
    let cfg = CoreConfig::new(
        data_dir,
        lock_timeout_from_env_value(lock_timeout_ms)?,
        StoreKind::File,
    )?;
    Ok(LabNumberService::new(CounterService::from_config(&cfg)?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run(Cli::parse())
}

/// Executes one command. Any failure is returned so the process exits non-zero.
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Some(Commands::Generate {
            medical_type,
            passport_number,
        }) => {
            let service = open_service(cli.data_dir, cli.lock_timeout_ms)?;
            let allocation = service.allocate(&medical_type, &passport_number)?;
            println!(
                "{} (series {}, sequence {})",
                allocation.lab_number, allocation.series, allocation.sequence_number
            );
        }
        Some(Commands::Current { name }) => {
            let service = open_service(cli.data_dir, cli.lock_timeout_ms)?;
            let value = service.counters().current(&name)?;
            println!("{}: {}", name.trim(), value);
        }
        Some(Commands::List) => {
            let service = open_service(cli.data_dir, cli.lock_timeout_ms)?;
            let counters = service.counters().snapshot()?;
            if counters.is_empty() {
                println!("No counters found.");
            }
            for counter in counters {
                println!("{}: {}", counter.name, counter.value);
            }
        }
        Some(Commands::Classify { medical_type }) => {
            let classified = MedicalType::parse(&medical_type);
            let series = classified.series();
            let note = if classified.is_recognised() {
                ""
            } else {
                " (unrecognised, fallback)"
            };
            println!(
                "{} -> series {} (counter {}){}",
                medical_type,
                series,
                series.counter_name(),
                note
            );
        }
        None => {
            println!("Use 'labnum --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(dir: &std::path::Path, args: &[&str]) -> Cli {
        let data_dir = dir.to_str().unwrap();
        let base = ["labnum", "--data-dir", data_dir, "--lock-timeout-ms", "20"];
        Cli::try_parse_from(base.iter().chain(args)).unwrap()
    }

    #[test]
    fn generate_succeeds_then_fails_while_lock_is_held() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(run(cli(dir.path(), &["generate", "SM-VDRL", "P1"])).is_ok());

        std::fs::write(dir.path().join("counters.lock"), "held").unwrap();
        assert!(run(cli(dir.path(), &["generate", "SM-VDRL", "P2"])).is_err());
    }

    #[test]
    fn current_rejects_blank_counter_name() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(run(cli(dir.path(), &["current", "S_SERIES"])).is_ok());
        assert!(run(cli(dir.path(), &["current", "  "])).is_err());
    }

    #[test]
    fn corrupt_counter_file_fails_the_command() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("counters.json"), "").unwrap();
        assert!(run(cli(dir.path(), &["generate", "NORMAL", "P1"])).is_err());
        assert!(run(cli(dir.path(), &["current", "F_SERIES"])).is_err());
        assert!(run(cli(dir.path(), &["list"])).is_err());
    }
}
