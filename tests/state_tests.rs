use ngbs_icon::{
    DeviceRecord, HvacAction, HvacMode, ModeEncoding, Preset, Temperature, derive_state,
};
use serde_json::json;

fn record(out: i64, ce: i64, rh: serde_json::Value, is_winter: bool) -> DeviceRecord {
    let mut rec: DeviceRecord = serde_json::from_value(json!({
        "ID": "t1",
        "title": "Nappali",
        "room_temp": 21.0,
        "target_temp": 22.5,
        "RH": rh,
        "OUT": out,
        "CE": ce,
    }))
    .unwrap();
    rec.is_winter = is_winter;
    rec
}

#[test]
fn manual_heating_in_winter() {
    let state = derive_state(&record(1, 0, json!(40), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.hvac_mode, HvacMode::Heat);
    assert_eq!(state.hvac_action, HvacAction::Heating);
    assert_eq!(state.preset, Preset::None);
    assert_eq!(state.humidity, Some(40.0));
    assert_eq!(state.current_temperature, Some(Temperature::from_celsius(21.0)));
    assert_eq!(state.target_temperature, Some(Temperature::from_celsius(22.5)));
}

#[test]
fn manual_cooling_in_summer() {
    let state = derive_state(&record(1, 0, json!(40), false), ModeEncoding::ManualAutoEco);
    assert_eq!(state.hvac_mode, HvacMode::Cool);
    assert_eq!(state.hvac_action, HvacAction::Cooling);
}

#[test]
fn relay_off_is_idle() {
    let state = derive_state(&record(0, 0, json!(40), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.hvac_mode, HvacMode::Heat);
    assert_eq!(state.hvac_action, HvacAction::Idle);
}

#[test]
fn auto_is_comfort_preset() {
    let state = derive_state(&record(0, 1, json!(40), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.hvac_mode, HvacMode::Auto);
    assert_eq!(state.preset, Preset::Comfort);
}

#[test]
fn eco_preset_independent_of_relay() {
    for out in [0, 1] {
        let state = derive_state(&record(out, 2, json!(40), true), ModeEncoding::ManualAutoEco);
        assert_eq!(state.preset, Preset::Eco);
        assert_eq!(state.hvac_mode, HvacMode::Heat);
    }
}

#[test]
fn code_one_is_off_under_run_off_eco() {
    let state = derive_state(&record(0, 1, json!(40), true), ModeEncoding::RunOffEco);
    assert_eq!(state.hvac_mode, HvacMode::Off);
    assert_eq!(state.hvac_action, HvacAction::Off);
    assert_eq!(state.preset, Preset::None);

    let state = derive_state(&record(0, 0, json!(40), true), ModeEncoding::RunOffEco);
    assert_eq!(state.hvac_mode, HvacMode::Heat);
    assert_eq!(state.hvac_action, HvacAction::Idle);
}

#[test]
fn unknown_code_falls_back_to_season_mode() {
    let state = derive_state(&record(0, 9, json!(40), false), ModeEncoding::ManualAutoEco);
    assert_eq!(state.hvac_mode, HvacMode::Cool);
    assert_eq!(state.preset, Preset::None);
}

#[test]
fn out_of_range_humidity_is_unknown() {
    let state = derive_state(&record(0, 0, json!(150), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.humidity, None);
    let state = derive_state(&record(0, 0, json!(-3), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.humidity, None);
    let state = derive_state(&record(0, 0, json!("wet"), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.humidity, None);
    let state = derive_state(&record(0, 0, json!(null), true), ModeEncoding::ManualAutoEco);
    assert_eq!(state.humidity, None);
}

#[test]
fn derivation_is_deterministic_and_leaves_input_untouched() {
    let rec = record(1, 2, json!(55), true);
    let snapshot = rec.clone();
    let first = derive_state(&rec, ModeEncoding::ManualAutoEco);
    let second = derive_state(&rec, ModeEncoding::ManualAutoEco);
    assert_eq!(first, second);
    assert_eq!(rec, snapshot);
}

#[test]
fn portal_rounding() {
    assert_eq!(Temperature::from_celsius(22.3).to_portal_celsius(), 22.5);
    assert_eq!(Temperature::from_celsius(22.1).to_portal_celsius(), 22.0);
    assert_eq!(Temperature::from_celsius(22.25).to_portal_celsius(), 22.5);
    assert_eq!(Temperature::from_celsius(21.74).to_portal_celsius(), 21.5);
}

#[test]
fn display() {
    let t = Temperature::from_celsius(22.5);
    assert_eq!(format!("{t}"), "22.5\u{00b0}C");
}

#[test]
fn mode_names_roundtrip() {
    for mode in [HvacMode::Off, HvacMode::Heat, HvacMode::Cool, HvacMode::Auto] {
        assert_eq!(HvacMode::from_name(mode.as_str()), Some(mode));
    }
    for preset in [Preset::None, Preset::Comfort, Preset::Eco] {
        assert_eq!(Preset::from_name(preset.as_str()), Some(preset));
    }
    assert_eq!(HvacMode::from_name("heat and cool"), None);
}
