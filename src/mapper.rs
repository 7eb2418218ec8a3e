use crate::types::*;

/// Presentation state of a thermostat record. Pure: same input, same output.
///
/// The mode code picks the kind of mode; a running thermostat heats or cools
/// according to the installation's season flag.
///
/// | code  | mode                  | preset  |
/// |-------|-----------------------|---------|
/// | Run   | Heat / Cool by season | None    |
/// | Auto  | Auto                  | Comfort |
/// | Eco   | Heat / Cool by season | Eco     |
/// | Off   | Off                   | None    |
/// | other | Heat / Cool by season | None    |
pub fn derive_state(record: &DeviceRecord, encoding: ModeEncoding) -> DerivedState {
    let code = encoding.decode(record.mode_code);
    let hvac_mode = hvac_mode(code, record.is_winter);

    DerivedState {
        hvac_mode,
        hvac_action: hvac_action(record.output, record.is_winter, hvac_mode),
        preset: preset(code),
        humidity: valid_humidity(record.humidity),
        current_temperature: record.current_temperature.map(Temperature::from_celsius),
        target_temperature: record.target_temperature.map(Temperature::from_celsius),
    }
}

/// Relative humidity if it is physically possible, otherwise unknown.
pub fn valid_humidity(raw: Option<f64>) -> Option<f64> {
    raw.filter(|rh| (0.0..=100.0).contains(rh))
}

fn season_mode(is_winter: bool) -> HvacMode {
    if is_winter { HvacMode::Heat } else { HvacMode::Cool }
}

fn hvac_mode(code: ModeCode, is_winter: bool) -> HvacMode {
    match code {
        ModeCode::Auto => HvacMode::Auto,
        ModeCode::Off => HvacMode::Off,
        ModeCode::Run | ModeCode::Eco | ModeCode::Unknown(_) => season_mode(is_winter),
    }
}

fn hvac_action(output: bool, is_winter: bool, mode: HvacMode) -> HvacAction {
    match (output, mode) {
        (true, _) if is_winter => HvacAction::Heating,
        (true, _) => HvacAction::Cooling,
        (false, HvacMode::Off) => HvacAction::Off,
        (false, _) => HvacAction::Idle,
    }
}

fn preset(code: ModeCode) -> Preset {
    match code {
        ModeCode::Auto => Preset::Comfort,
        ModeCode::Eco => Preset::Eco,
        ModeCode::Run | ModeCode::Off | ModeCode::Unknown(_) => Preset::None,
    }
}

/// Mode code that selects `mode`. Heat and cool share one code; the season decides.
pub(crate) fn mode_code_for(mode: HvacMode) -> ModeCode {
    match mode {
        HvacMode::Heat | HvacMode::Cool => ModeCode::Run,
        HvacMode::Auto => ModeCode::Auto,
        HvacMode::Off => ModeCode::Off,
    }
}

pub(crate) fn mode_code_for_preset(preset: Preset) -> ModeCode {
    match preset {
        Preset::None => ModeCode::Run,
        Preset::Comfort => ModeCode::Auto,
        Preset::Eco => ModeCode::Eco,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humidity_range() {
        assert_eq!(valid_humidity(Some(0.0)), Some(0.0));
        assert_eq!(valid_humidity(Some(100.0)), Some(100.0));
        assert_eq!(valid_humidity(Some(150.0)), None);
        assert_eq!(valid_humidity(Some(-1.0)), None);
        assert_eq!(valid_humidity(None), None);
    }

    #[test]
    fn action_follows_output_and_season() {
        assert_eq!(hvac_action(true, true, HvacMode::Heat), HvacAction::Heating);
        assert_eq!(hvac_action(true, false, HvacMode::Cool), HvacAction::Cooling);
        assert_eq!(hvac_action(false, true, HvacMode::Heat), HvacAction::Idle);
        assert_eq!(hvac_action(false, true, HvacMode::Off), HvacAction::Off);
    }

    #[test]
    fn writes_map_back_to_same_mode() {
        for encoding in [ModeEncoding::ManualAutoEco, ModeEncoding::RunOffEco] {
            for &mode in encoding.supported_hvac_modes() {
                let code = encoding.encode(mode_code_for(mode)).unwrap();
                let decoded = hvac_mode(encoding.decode(code), mode != HvacMode::Cool);
                assert_eq!(decoded, mode, "{encoding:?} {mode:?}");
            }
            for &p in encoding.supported_presets() {
                let code = encoding.encode(mode_code_for_preset(p)).unwrap();
                assert_eq!(preset(encoding.decode(code)), p, "{encoding:?} {p:?}");
            }
        }
    }
}
