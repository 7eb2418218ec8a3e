use std::env;
use std::time::Duration;

use ngbs_icon::{Credentials, DeviceRecord, ModeEncoding, NgbsClient};

const DEFAULT_SCAN_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> ngbs_icon::Result<()> {
    tracing_subscriber::fmt::init();

    let var = |name: &str| env::var(name).unwrap_or_else(|_| panic!("{name} must be set"));
    let credentials = Credentials::new(var("NGBS_USERNAME"), var("NGBS_PASSWORD"), var("NGBS_ICON_ID"));

    let args: Vec<String> = env::args().collect();
    let interval = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS);
    // manual_auto_eco or run_off_eco; check which one the installation uses first
    let encoding: ModeEncoding = serde_json::from_value(var("NGBS_MODE_ENCODING").into())?;

    let client = NgbsClient::builder(credentials, encoding).build()?;

    println!("Logging in to installation {}...", client.installation_id());
    if !client.login().await {
        eprintln!("Login failed, will retry on first poll");
    }

    let mut last: Vec<DeviceRecord> = Vec::new();
    loop {
        let devices = client.fetch().await;
        if devices.is_empty() {
            eprintln!("No data this round, keeping {} last-known thermostats", last.len());
        } else {
            last = devices;
        }

        for device in &last {
            let state = client.derive_state(device);
            let fmt_temp = |t: Option<ngbs_icon::Temperature>| {
                t.map_or_else(|| "--".to_string(), |t| t.to_string())
            };
            println!(
                "[{}] {} -> {} | mode: {} | action: {} | preset: {} | RH: {}",
                device.name(),
                fmt_temp(state.current_temperature),
                fmt_temp(state.target_temperature),
                state.hvac_mode.as_str(),
                state.hvac_action.as_str(),
                state.preset.as_str(),
                state.humidity.map_or_else(|| "--".to_string(), |h| format!("{h:.0}%")),
            );
        }

        tokio::time::sleep(Duration::from_secs(interval)).await;
    }
}
