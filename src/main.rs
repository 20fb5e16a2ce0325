use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod args;

use args::{Args, SourceKind};
use doomscroll_sentinel::donation::SimulatedDonationSink;
use doomscroll_sentinel::feedback::{Feedback, SessionStatus, ToastKind};
use doomscroll_sentinel::perception::{ReplayPerception, SimulatedPerception};
use doomscroll_sentinel::settings::JsonSettingsStore;
use doomscroll_sentinel::video::BlankSource;
use doomscroll_sentinel::{
    logging, AppConfig, Charity, DetectionSession, LiveSettings, PerceptionProvider, VideoSource,
};

fn create_source(args: &Args) -> Result<(Box<dyn PerceptionProvider>, Box<dyn VideoSource>)> {
    match args.source {
        SourceKind::Simulated => Ok((Box::new(SimulatedPerception::new()), Box::new(BlankSource::new(640, 480)))),
        SourceKind::Replay => {
            let path = args.replay.as_ref().context("--source replay needs --replay <FILE>")?;
            Ok((
                Box::new(ReplayPerception::new(path.clone(), args.loop_replay)),
                Box::new(BlankSource::new(640, 480)),
            ))
        }
        SourceKind::Camera => create_camera_source(args.cam_index),
    }
}

#[cfg(feature = "camera")]
fn create_camera_source(index: u32) -> Result<(Box<dyn PerceptionProvider>, Box<dyn VideoSource>)> {
    use doomscroll_sentinel::camera::CameraSource;
    tracing::warn!("No perception model is bundled; live frames are paired with simulated perception");
    Ok((Box::new(SimulatedPerception::new()), Box::new(CameraSource::new(index))))
}

#[cfg(not(feature = "camera"))]
fn create_camera_source(_index: u32) -> Result<(Box<dyn PerceptionProvider>, Box<dyn VideoSource>)> {
    bail!("this build has no camera support; rebuild with `--features camera`")
}

fn print_list() -> Result<()> {
    println!("Charities:");
    println!("{:<8} | {:<30}", "Id", "Name");
    println!("{}", "-".repeat(40));
    for charity in Charity::ALL {
        println!("{:<8} | {:<30}", charity.id(), charity.label());
    }

    #[cfg(feature = "camera")]
    {
        println!();
        println!("Available Cameras:");
        println!("{:<5} | {:<30}", "Index", "Name");
        println!("{}", "-".repeat(40));
        for (index, name) in doomscroll_sentinel::camera::list_cameras()? {
            println!("{:<5} | {:<30}", index, name);
        }
    }
    Ok(())
}

fn status_line(fb: &Feedback) -> String {
    let pill = |on: bool, label: &str| if on { label.green().bold() } else { label.dimmed() };
    let state = if fb.confirmed {
        "DOOMSCROLLING".red().bold()
    } else {
        format!("{:>2}", fb.counter).normal()
    };
    let pitch = fb.pitch.map(|p| format!("{:+.1}°", p)).unwrap_or_else(|| "--".to_string());
    format!(
        "[{}] {} {} {} {} | pitch {} | {} | donations {} | cooldown {}s",
        fb.status,
        pill(fb.signals.grip, "GRIP"),
        pill(fb.signals.gaze_down, "GAZE"),
        pill(fb.signals.iris_down, "IRIS"),
        pill(fb.signals.phone_in_frame, "PHONE"),
        pitch,
        state,
        fb.donation_count,
        fb.cooldown_secs_remaining
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        return print_list();
    }

    // Up before the config loads so its warnings are seen.
    let log = logging::init(args.log_level.as_deref().unwrap_or("info"));
    let config = AppConfig::load(&args.config)?;
    if let (Some(log), None) = (&log, &args.log_level) {
        log.set_level(&config.logging.level);
    }
    info!("Using config {}", args.config.display());

    // Settings
    let store = Arc::new(JsonSettingsStore::new(args.settings.clone()));
    let live = LiveSettings::new(store);
    if let Some(id) = &args.charity {
        let Some(charity) = Charity::parse(id) else {
            bail!("Unknown charity '{}'. Run with --list to see the options.", id);
        };
        live.select(charity)?;
    }
    println!("{}", format!("Donating to {}", live.charity()).cyan());

    // Session
    let (provider, video) = create_source(&args)?;
    let mut sink = SimulatedDonationSink::new(args.amount_cents);
    if let Some(n) = args.fail_every {
        sink = sink.failing_every(n);
    }

    let mut session = DetectionSession::new(config, provider, video, Arc::new(sink), live);
    let handle = session.handle();
    let mut updates = session.subscribe();

    // Status printer: one line whenever something the user cares about changes.
    let printer = tokio::spawn(async move {
        let mut last_key = None;
        let mut last_toast = None;
        while updates.changed().await.is_ok() {
            let fb = updates.borrow_and_update().clone();
            if fb.toast != last_toast {
                if let Some(toast) = &fb.toast {
                    match toast.kind {
                        ToastKind::Success => println!("{}", toast.message.yellow().bold()),
                        ToastKind::Error => println!("{}", toast.message.red()),
                    }
                }
                last_toast = fb.toast.clone();
            }
            let key = Some((fb.status.clone(), fb.signals, fb.confirmed, fb.donation_count));
            if key != last_key {
                let line = status_line(&fb);
                match &fb.status {
                    SessionStatus::Error(_) => println!("{}", line.red()),
                    _ => println!("{}", line),
                }
                last_key = key;
            }
            if fb.status.is_terminal() {
                break;
            }
        }
    });

    // Stop on Ctrl-C or after the requested duration.
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("{}", "Stopping...".yellow());
                handle.stop();
            }
        });
    }
    if let Some(secs) = args.duration_secs {
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            handle.stop();
        });
    }

    if let Err(e) = session.start().await {
        println!("{}", format!("Could not start: {}", e).red().bold());
        drop(session);
        let _ = printer.await;
        return Err(e.into());
    }
    println!("{}", "Watching for doomscrolling. Press Ctrl-C to stop.".green());

    session.run().await?;
    let _ = printer.await;

    let fb = session.feedback();
    println!(
        "Session ended with {} donation(s). Donations still pending at shutdown are not counted.",
        fb.donation_count
    );
    Ok(())
}
