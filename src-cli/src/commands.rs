//! CLI command implementations.

use crate::client::{ServiceClient, ServiceError};
use crate::colors;
use crate::exit_codes::ExitCode;

/// Show service health and camera status.
pub async fn status(client: ServiceClient, json: bool) -> ExitCode {
    if let Err(e) = client.connect_or_spawn().await {
        if json {
            println!(r#"{{"status": "service_unavailable", "error": "{}"}}"#, e);
        } else {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return e.to_exit_code();
    }

    let health = match client.health().await {
        Ok(health) => health,
        Err(e) => {
            if json {
                println!(r#"{{"error": "{}"}}"#, e);
            } else {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            return e.to_exit_code();
        }
    };

    match client.camera_info().await {
        Ok(info) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&info).unwrap());
            } else {
                let state_str = if info.recording { "active" } else { "idle" };
                println!("{} {}", colors::bold("Service:"), colors::state(&health.status));
                println!("{} {}", colors::bold("Checked:"), health.timestamp);
                println!(
                    "{} {}x{} @ {} fps",
                    colors::bold("Camera: "),
                    info.resolution[0],
                    info.resolution[1],
                    info.fps
                );
                println!("{} {}", colors::bold("State:  "), colors::state(state_str));
                if let Some(file) = &info.current_file {
                    println!("{} {}", colors::bold("File:   "), colors::path(file));
                }
            }
            ExitCode::Success
        }
        Err(ServiceError::Unauthorized(_)) => {
            // No session token; the health probe alone still succeeds
            if json {
                println!(
                    r#"{{"status": "{}", "timestamp": "{}"}}"#,
                    health.status, health.timestamp
                );
            } else {
                println!("{} {}", colors::bold("Service:"), colors::state(&health.status));
                println!("{} {}", colors::bold("Checked:"), health.timestamp);
                eprintln!(
                    "{}",
                    colors::warning("No session token; run 'picast login' for camera details.")
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            if json {
                println!(r#"{{"error": "{}"}}"#, e);
            } else {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            e.to_exit_code()
        }
    }
}

/// Log in and print a session token.
pub async fn login(
    client: ServiceClient,
    username: String,
    password: Option<String>,
    json: bool,
    quiet: bool,
) -> ExitCode {
    let password = match password.or_else(|| std::env::var("PICAST_PASSWORD").ok()) {
        Some(p) if !p.is_empty() => p,
        _ => {
            if !quiet {
                eprintln!(
                    "{}",
                    colors::error("No password given. Use --password or set PICAST_PASSWORD.")
                );
            }
            return ExitCode::InvalidArguments;
        }
    };

    if let Err(e) = client.connect_or_spawn().await {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return e.to_exit_code();
    }

    match client.login(&username, &password).await {
        Ok(response) => {
            if json {
                println!(r#"{{"token": "{}"}}"#, response.token);
            } else if quiet {
                // Bare token for command substitution
                println!("{}", response.token);
            } else {
                println!("{} {}", colors::success("Token:"), response.token);
                println!(
                    "{}",
                    colors::dim("Pass it with --token or export PICAST_TOKEN.")
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            e.to_exit_code()
        }
    }
}

/// Start a recording.
pub async fn record_start(client: ServiceClient, json: bool, quiet: bool) -> ExitCode {
    if let Err(e) = client.connect_or_spawn().await {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return e.to_exit_code();
    }

    match client.start_recording().await {
        Ok(control) => {
            if json {
                println!(
                    r#"{{"status": "recording_started", "filename": "{}"}}"#,
                    control.filename
                );
            } else if !quiet {
                println!(
                    "{} {}",
                    colors::success("Recording started:"),
                    colors::path(&control.filename)
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&format!("Error starting recording: {}", e)));
            }
            match e {
                ServiceError::Unauthorized(_) | ServiceError::Forbidden(_) => e.to_exit_code(),
                _ => ExitCode::RecordingFailed,
            }
        }
    }
}

/// Stop the current recording.
pub async fn record_stop(
    client: ServiceClient,
    fps: Option<u32>,
    json: bool,
    quiet: bool,
) -> ExitCode {
    if let Err(e) = client.connect_or_spawn().await {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return e.to_exit_code();
    }

    match client.stop_recording(fps).await {
        Ok(control) => {
            if json {
                println!(
                    r#"{{"status": "recording_stopped", "filename": "{}"}}"#,
                    control.filename
                );
            } else if !quiet {
                println!(
                    "{} {}",
                    colors::success("Recording stopped:"),
                    colors::path(&control.filename)
                );
                println!("{}", colors::dim("Transcoding to MP4 in the background."));
            }
            ExitCode::Success
        }
        Err(ServiceError::RemoteError { message, .. }) if message == "No active recording" => {
            if json {
                println!(r#"{{"status": "not_recording"}}"#);
            } else if !quiet {
                println!("{}", colors::dim("No recording in progress."));
            }
            ExitCode::Success
        }
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&format!("Error stopping recording: {}", e)));
            }
            match e {
                ServiceError::Unauthorized(_) | ServiceError::Forbidden(_) => e.to_exit_code(),
                _ => ExitCode::RecordingFailed,
            }
        }
    }
}

/// List recordings available for download.
pub async fn list(client: ServiceClient, json: bool, quiet: bool) -> ExitCode {
    if let Err(e) = client.connect_or_spawn().await {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return e.to_exit_code();
    }

    match client.recordings().await {
        Ok(listing) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&listing.recordings).unwrap()
                );
            } else if listing.recordings.is_empty() {
                if !quiet {
                    println!("{}", colors::dim("No recordings found."));
                }
            } else {
                // Calculate column widths
                let name_width = listing
                    .recordings
                    .iter()
                    .map(|r| r.filename.len())
                    .max()
                    .unwrap_or(8)
                    .max(8);
                let size_width = listing
                    .recordings
                    .iter()
                    .map(|r| r.size_mb.len() + 3)
                    .max()
                    .unwrap_or(7)
                    .max(7);

                println!(
                    "{}  {}  {}",
                    colors::pad_left("FILENAME", name_width, colors::header),
                    colors::pad_left("SIZE", size_width, colors::header),
                    colors::header("URL")
                );
                println!(
                    "{}  {}  {}",
                    "-".repeat(name_width),
                    "-".repeat(size_width),
                    "-".repeat(3)
                );

                for entry in &listing.recordings {
                    let size = format!("{} MB", entry.size_mb);
                    println!(
                        "{}  {}  {}",
                        colors::pad_left(&entry.filename, name_width, colors::path),
                        colors::pad_left(&size, size_width, colors::number),
                        entry.download_url
                    );
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            e.to_exit_code()
        }
    }
}

/// Download a recording to a local file.
pub async fn fetch(
    client: ServiceClient,
    filename: String,
    output: Option<String>,
    json: bool,
    quiet: bool,
    verbose: bool,
) -> ExitCode {
    if let Err(e) = client.connect_or_spawn().await {
        if !quiet {
            eprintln!("{}", colors::error(&e.to_string()));
        }
        return e.to_exit_code();
    }

    if verbose && !quiet {
        eprintln!("{}", colors::info(&format!("Fetching {}...", filename)));
    }

    let body = match client.download(&filename).await {
        Ok(body) => body,
        Err(e) => {
            if !quiet {
                eprintln!("{}", colors::error(&e.to_string()));
            }
            return e.to_exit_code();
        }
    };

    let dest = output.unwrap_or_else(|| filename.clone());
    if let Err(e) = tokio::fs::write(&dest, &body).await {
        if !quiet {
            eprintln!("{}", colors::error(&format!("Failed to write {}: {}", dest, e)));
        }
        return ExitCode::GeneralError;
    }

    if json {
        println!(
            r#"{{"status": "saved", "path": "{}", "bytes": {}}}"#,
            dest.replace('\\', "\\\\").replace('"', "\\\""),
            body.len()
        );
    } else if !quiet {
        println!(
            "{} {} ({} bytes)",
            colors::success("Saved:"),
            colors::path(&dest),
            body.len()
        );
    }
    ExitCode::Success
}

/// Show version information.
pub fn version(json: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        println!(r#"{{"version": "{}"}}"#, version);
    } else {
        println!("{} {}", colors::bold("picast"), version);
    }
}
