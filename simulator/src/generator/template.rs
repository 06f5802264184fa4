use crate::generator::profile::{Phase, ScenarioConfig};

pub const PRESETS: &[&str] = &[
    "straight_glide",
    "single_thermal",
    "local_soaring",
    "midnight_crossing",
    "no_barograph",
];

fn straight(seconds: f64, speed_kmh: f64, climb_ms: f64) -> Phase {
    Phase::Straight {
        seconds,
        speed_kmh,
        climb_ms,
    }
}

fn circle(seconds: f64, turn_rate_deg_s: f64, climb_ms: f64) -> Phase {
    Phase::Circle {
        seconds,
        speed_kmh: 85.0,
        turn_rate_deg_s,
        climb_ms,
    }
}

fn ground(seconds: f64) -> Phase {
    Phase::Ground { seconds }
}

/// A cross-country style flight: tow, climbs, glides, landing.
fn local_soaring() -> Vec<Phase> {
    vec![
        ground(120.0),
        straight(300.0, 110.0, 2.0),
        circle(420.0, 12.0, 2.2),
        straight(600.0, 130.0, -1.1),
        circle(300.0, -14.0, 1.6),
        straight(900.0, 120.0, -1.0),
        circle(240.0, 11.0, 2.5),
        straight(780.0, 110.0, -1.3),
        ground(180.0),
    ]
}

/// Built-in scenario profiles, selectable with `--preset`.
pub fn preset(name: &str) -> Option<ScenarioConfig> {
    let base = ScenarioConfig {
        name: name.to_string(),
        ..Default::default()
    };
    let config = match name {
        "straight_glide" => ScenarioConfig {
            phases: vec![ground(60.0), straight(300.0, 40.0, -1.0), ground(60.0)],
            ..base
        },
        "single_thermal" => ScenarioConfig {
            phases: vec![
                ground(60.0),
                straight(90.0, 40.0, -1.0),
                Phase::Circle {
                    seconds: 120.0,
                    speed_kmh: 40.0,
                    turn_rate_deg_s: 10.0,
                    climb_ms: 1.5,
                },
                straight(90.0, 40.0, -1.0),
                ground(60.0),
            ],
            ..base
        },
        "local_soaring" => ScenarioConfig {
            position_jitter_m: 2.0,
            altitude_jitter_m: 0.5,
            seed: 1,
            phases: local_soaring(),
            ..base
        },
        "midnight_crossing" => ScenarioConfig {
            start_time: 85_000.0,
            position_jitter_m: 2.0,
            altitude_jitter_m: 0.5,
            seed: 2,
            phases: local_soaring(),
            ..base
        },
        "no_barograph" => ScenarioConfig {
            pressure_available: false,
            altitude_jitter_m: 0.5,
            seed: 3,
            phases: local_soaring(),
            ..base
        },
        _ => return None,
    };
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_fixes;

    #[test]
    fn every_listed_preset_builds() {
        for name in PRESETS {
            let config = preset(name).unwrap();
            assert_eq!(config.name, *name);
            assert!(build_fixes(&config).unwrap().len() > 100);
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(preset("aerobatics").is_none());
    }
}
