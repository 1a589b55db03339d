//! Time Vault entry point
//!
//! On the web the page drives a `WebVault`; this only sets up logging.
//! Natively it is a small terminal front-end: seal an image into a backup,
//! open a backup and sit out its countdown, inspect backups, preview spins.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
pub use time_vault::web::WebVault;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Time Vault ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::init();

    match cli::run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use clap::{Parser, Subcommand};

    use time_vault::backup::{self, BackupArtifact};
    use time_vault::countdown::format_cooldown;
    use time_vault::image::{ImageData, extension_for_mime, mime_for_file_name};
    use time_vault::vault::{DurationInput, VaultMode};
    use time_vault::wheel::{Lcg, SECTORS, WheelGame};
    use time_vault::{Result, Vault, VaultAction, VaultError, VaultNotice, VaultSettings, VaultStatus};

    #[derive(Parser)]
    #[command(name = "time-vault", version, about = "Lock an image behind a countdown")]
    struct Cli {
        /// Settings file (JSON)
        #[arg(long, global = true, default_value = "time_vault_settings.json")]
        settings: PathBuf,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Seal an image into a backup artifact
        Seal {
            image: PathBuf,
            #[arg(long)]
            hours: Option<u64>,
            #[arg(long)]
            minutes: Option<u64>,
            #[arg(long)]
            seconds: Option<u64>,
            /// Output directory (defaults to the settings' export_dir)
            #[arg(long)]
            out: Option<PathBuf>,
        },
        /// Open a backup and run its countdown until the image is revealed
        Open {
            backup: PathBuf,
            /// Output directory for the revealed image and saves
            #[arg(long)]
            out: Option<PathBuf>,
            /// Gamble on the fate wheel this many times
            #[arg(long, default_value_t = 0)]
            spin: u32,
            /// Write a mid-run save every N seconds
            #[arg(long)]
            checkpoint: Option<u64>,
        },
        /// Show what a backup contains (without the image)
        Inspect { backup: PathBuf },
        /// Show where the wheel would land for a seed
        SpinPreview {
            #[arg(long)]
            seed: i64,
            #[arg(long, default_value_t = 5)]
            count: u32,
        },
        /// Write the current settings (or defaults) to the settings file
        InitSettings,
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        let settings = VaultSettings::load_from(&cli.settings)?;

        match cli.command {
            Command::Seal {
                image,
                hours,
                minutes,
                seconds,
                out,
            } => {
                let out = out.unwrap_or_else(|| PathBuf::from(&settings.export_dir));
                let duration = if hours.is_none() && minutes.is_none() && seconds.is_none() {
                    None
                } else {
                    Some(DurationInput::new(
                        hours.unwrap_or(0),
                        minutes.unwrap_or(0),
                        seconds.unwrap_or(0),
                    ))
                };
                seal(settings, &image, duration, &out)
            }
            Command::Open {
                backup,
                out,
                spin,
                checkpoint,
            } => {
                let out = out.unwrap_or_else(|| PathBuf::from(&settings.export_dir));
                open(settings, &backup, &out, spin, checkpoint)
            }
            Command::Inspect { backup } => inspect(&backup),
            Command::SpinPreview { seed, count } => {
                spin_preview(seed, count);
                Ok(())
            }
            Command::InitSettings => settings.save_to(&cli.settings),
        }
    }

    fn seal(
        settings: VaultSettings,
        image_path: &Path,
        duration: Option<DurationInput>,
        out: &Path,
    ) -> Result<()> {
        let bytes = std::fs::read(image_path)?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image = ImageData::from_bytes(
            &bytes,
            mime_for_file_name(&file_name),
            settings.max_image_bytes,
        )?;

        let mut vault = Vault::new(settings);
        vault.dispatch(VaultAction::UploadImage { file_name, image })?;
        if let Some(duration) = duration {
            vault.dispatch(VaultAction::SetDuration(duration))?;
        }

        for notice in vault.dispatch(VaultAction::ExportBackup)? {
            if let VaultNotice::BackupReady(artifact) = notice {
                let path = write_artifact(&artifact, out)?;
                println!(
                    "Sealed for {} -> {}",
                    vault.settings().format_remaining(vault.session().duration_seconds().saturating_mul(1000)),
                    path.display()
                );
            }
        }
        Ok(())
    }

    fn open(
        settings: VaultSettings,
        backup_path: &Path,
        out: &Path,
        mut spins_left: u32,
        checkpoint_secs: Option<u64>,
    ) -> Result<()> {
        let bytes = std::fs::read(backup_path)?;
        let frame_interval = std::time::Duration::from_millis(settings.frame_interval_ms.max(1));

        let mut vault = Vault::new(settings);
        vault.dispatch(VaultAction::SelectMode(VaultMode::Restore))?;
        vault.dispatch(VaultAction::RestoreBackup { bytes })?;
        vault.dispatch(VaultAction::Start)?;
        println!("Vault '{}' locked", vault.session().file_name);

        let mut last_checkpoint = vault.now_ms();
        let mut stdout = std::io::stdout();

        while vault.has_active_loops() {
            if spins_left > 0 && vault.session().can_open_wheel() {
                match vault
                    .dispatch(VaultAction::OpenWheel)
                    .and_then(|_| vault.dispatch(VaultAction::SpinWheel))
                {
                    Ok(_) => spins_left -= 1,
                    Err(e) => {
                        println!("\nWheel unavailable: {}", e);
                        spins_left = 0;
                    }
                }
            }

            if let Some(secs) = checkpoint_secs {
                let now = vault.now_ms();
                if now.saturating_sub(last_checkpoint) >= secs.saturating_mul(1000) {
                    last_checkpoint = now;
                    for notice in vault.dispatch(VaultAction::ExportMidRun)? {
                        if let VaultNotice::BackupReady(artifact) = notice {
                            let path = write_artifact(&artifact, out)?;
                            println!("\nCheckpoint saved -> {}", path.display());
                        }
                    }
                }
            }

            for notice in vault.frame() {
                report(&vault, &notice);
            }

            if vault.session().status == VaultStatus::Running {
                let session = vault.session();
                let mut line = format!(
                    "\r{}  attempts {}/{}",
                    vault.settings().format_remaining(session.time_left_ms),
                    session.game.attempts_remaining,
                    time_vault::consts::MAX_ATTEMPTS
                );
                if session.game.is_cooling_down() {
                    let left = session.game.cooldown_remaining_ms(vault.now_ms());
                    line.push_str(&format!("  cooldown {}", format_cooldown(left)));
                }
                if let Some(wheel) = &session.wheel {
                    line.push_str(&format!("  wheel {:7.1}°", wheel.rotation));
                }
                let _ = write!(stdout, "{:<72}", line);
                let _ = stdout.flush();
            }

            std::thread::sleep(frame_interval);
        }

        if vault.session().status == VaultStatus::Revealed {
            reveal(&vault, out)?;
        }
        Ok(())
    }

    fn report<C: time_vault::platform::Clock>(vault: &Vault<C>, notice: &VaultNotice) {
        match notice {
            VaultNotice::SpinLanded { sector } => {
                println!("\nWheel stopped on {}", SECTORS[*sector].label);
            }
            VaultNotice::SpinSettled {
                delta_ms,
                attempts_remaining,
                ..
            } => {
                let verb = if *delta_ms > 0 { "added" } else { "removed" };
                println!(
                    "{} {} min, {} attempts left",
                    verb,
                    delta_ms.unsigned_abs() / 60_000,
                    attempts_remaining
                );
            }
            VaultNotice::CooldownStarted { until_ms } => {
                let left = until_ms.saturating_sub(vault.now_ms());
                println!("Wheel cooling down for {}", format_cooldown(left));
            }
            VaultNotice::CooldownCleared => println!("\nWheel attempts restored"),
            VaultNotice::Revealed => println!("\nTime is up"),
            _ => {}
        }
    }

    fn reveal<C: time_vault::platform::Clock>(vault: &Vault<C>, out: &Path) -> Result<()> {
        let session = vault.session();
        let image = session.image.as_ref().ok_or(VaultError::NoImage)?;
        let bytes = image.decode_bytes().ok_or(VaultError::NoImage)?;

        let name = if session.file_name.contains('.') {
            format!("revealed_{}", session.file_name)
        } else {
            let ext = extension_for_mime(image.mime().unwrap_or_default());
            format!("revealed_{}.{}", session.file_name, ext)
        };
        std::fs::create_dir_all(out)?;
        let path = out.join(name);
        std::fs::write(&path, bytes)?;
        println!("Revealed -> {}", path.display());
        Ok(())
    }

    fn inspect(path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let payload = backup::decode(&bytes)?;
        let image = ImageData::from_encoded(payload.image_data.as_str());
        let settings = VaultSettings::default();

        println!("file       {}", payload.file_name);
        println!("version    {}", payload.version);
        println!(
            "duration   {}",
            settings.format_remaining(payload.duration_seconds.saturating_mul(1000))
        );
        println!(
            "image      {} ({} bytes encoded)",
            image.mime().unwrap_or("unknown"),
            image.len()
        );
        match payload.game {
            Some(game) => {
                if let Some(attempts) = game.attempts {
                    println!("attempts   {}", attempts);
                }
                if let Some(cd) = game.cooldown_end.filter(|cd| *cd > 0) {
                    println!("cooldown   until {} (epoch ms)", cd);
                }
                if let Some(seed) = game.seed {
                    println!("seed       {}", seed);
                    println!("next spin  {}", SECTORS[land(seed)].label);
                }
            }
            None => println!("game       (none, defaults apply)"),
        }
        Ok(())
    }

    fn spin_preview(mut seed: i64, count: u32) {
        for i in 1..=count {
            println!("{:>2}. seed {:>10} -> {}", i, seed, SECTORS[land(seed)].label);
            seed = Lcg::advance_seed(seed);
        }
    }

    /// Sector a freshly opened wheel lands on for `seed`
    fn land(seed: i64) -> usize {
        let mut wheel = WheelGame::new();
        match wheel.spin(seed, 0) {
            Ok(spin) => time_vault::wheel::sector_for_rotation(spin.target_rotation),
            Err(_) => 0,
        }
    }

    fn write_artifact(artifact: &BackupArtifact, out: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(out)?;
        let path = out.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes)?;
        log::info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
        Ok(path)
    }
}
