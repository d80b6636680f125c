//! Output formatting for CLI responses

use anyhow::{Error, Result};
use colored::*;
use f1_telemetry_packet::{DecodeError, PacketDecoder, ReadOptions, TelemetrySummary};
use serde::Serialize;
use serde_json::json;

use crate::error::CliError;

/// One emitted snapshot as printed by `listen --json`.
#[derive(Debug, Serialize)]
pub struct TickLine {
    pub connected: bool,
    #[serde(flatten)]
    pub summary: TelemetrySummary,
}

/// Result of decoding a captured datagram, as printed by `decode --json`.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    pub len: usize,
    pub valid: bool,
    pub error: Option<String>,
    pub summary: TelemetrySummary,
}

impl DecodeReport {
    pub fn new(packet: &PacketDecoder, validation: Result<(), DecodeError>) -> Self {
        Self {
            len: packet.len(),
            valid: validation.is_ok(),
            error: validation.err().map(|e| e.to_string()),
            summary: packet.summary(),
        }
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::Ingest(_)) => "ingest",
        Some(CliError::MalformedPacket(_)) => "malformed_packet",
        Some(CliError::IoError(_)) => "io",
        Some(CliError::JsonError(_)) => "json",
        None => "other",
    }
}

/// Print one emitted snapshot.
///
/// `connected` is the ingestor's liveness at the tick, which can differ from
/// `packet.has_data()` (a live zero-length datagram binds nothing). Human
/// output is the single speed line legacy dashboards expect.
pub fn print_tick(packet: &PacketDecoder, connected: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", tick_line_json(packet, connected)?);
    } else {
        println!("Speed: {}Km/h", packet.kmh_speed(ReadOptions::default()));
    }
    Ok(())
}

fn tick_line_json(packet: &PacketDecoder, connected: bool) -> Result<String> {
    let line = TickLine {
        connected,
        summary: packet.summary(),
    };
    Ok(serde_json::to_string(&line).map_err(CliError::from)?)
}

/// Print the outcome of decoding a captured datagram.
pub fn print_decode_report(report: &DecodeReport, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(report).map_err(CliError::from)?;
        println!("{output}");
        return Ok(());
    }

    let status = if report.valid {
        "valid".green()
    } else {
        "malformed".red()
    };
    println!("{} {} bytes ({})", "Packet:".bold(), report.len, status);
    if let Some(error) = &report.error {
        println!("  {} {}", "Warning:".yellow(), error);
    }
    print_summary_human(&report.summary);
    Ok(())
}

fn print_summary_human(summary: &TelemetrySummary) {
    println!(
        "  Speed:       {} m/s ({} km/h)",
        summary.speed, summary.kmh_speed
    );
    println!("  RPM:         {}", summary.rpm);
    println!("  Gear:        {}", format_gear(summary.gear));
    println!("  Throttle:    {:.1}%", summary.throttle);
    println!("  Brake:       {:.1}%", summary.brake);
    println!("  Position:    {}", summary.position);
    println!("  Fuel:        {:.2}", summary.fuel);
    println!("  Lap:         {}", format_lap_ms(summary.lap_time_ms));
    println!("  Last lap:    {}", format_lap_ms(summary.last_lap_time_ms));
    println!("  Best lap:    {}", format_lap_ms(summary.best_lap_time_ms));
    println!(
        "  DRS:         {} (allowed: {})",
        yes_no(summary.drs),
        yes_no(summary.drs_allowed)
    );
    println!(
        "  Flag:        {}",
        summary
            .race_flag()
            .map_or_else(|| format!("unknown ({})", summary.flag), |f| f.as_str().to_string())
    );
    println!("  In pits:     {}", yes_no(summary.pits));
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `R`, `N` or the forward gear number.
fn format_gear(gear: f64) -> String {
    if gear < -0.5 {
        "R".to_string()
    } else if gear < 0.5 {
        "N".to_string()
    } else {
        format!("{gear}")
    }
}

/// `m:ss.mmm`, or `-` for a zero time.
fn format_lap_ms(ms: f64) -> String {
    let Some(total_ms) = whole_millis(ms) else {
        return "-".to_string();
    };
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}

/// Upper bound for a displayable lap time: one day.
const MAX_LAP_MS: f64 = 86_400_000.0;

/// Whole milliseconds in `1..=MAX_LAP_MS`, `None` for anything else.
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "range checked to 1..=MAX_LAP_MS before the cast"
)]
fn whole_millis(ms: f64) -> Option<u64> {
    if !(1.0..=MAX_LAP_MS).contains(&ms) {
        return None;
    }
    Some(ms.floor() as u64)
}
