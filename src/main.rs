//! `trailnote <points.json>` or `trailnote --init-config`
//!
//! Reads a GeoJSON LineString (bare geometry or feature) or a JSON array of
//! `[lat, lng]` pairs, simplifies it with the configured tolerance and prints
//! the result as a GeoJSON feature with its distance. `--init-config`
//! writes the current settings to the default config path.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use trailnote::AppConfig;

    let config = AppConfig::load_from_default_path().unwrap_or_default();
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: trailnote <points.json> | --init-config");
        return std::process::ExitCode::from(2);
    };

    if path == "--init-config" {
        return match config.save_to_default_path() {
            Ok(written) => {
                println!("{}", written.display());
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("trailnote: {e}");
                std::process::ExitCode::FAILURE
            }
        };
    }

    match cli::run(&path, &config) {
        Ok(output) => {
            println!("{output}");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("trailnote: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use geojson::{GeoJson, Geometry};
    use serde_json::Value;
    use thiserror::Error;
    use trailnote::geometry::{path_distance, path_from_geometry, route_geometry, simplify_with};
    use trailnote::measure::format_distance;
    use trailnote::model::LatLng;
    use trailnote::{AppConfig, TrailError};

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("cannot read input: {0}")]
        Io(#[from] std::io::Error),

        #[error("invalid JSON: {0}")]
        Json(#[from] serde_json::Error),

        #[error("invalid GeoJSON: {0}")]
        GeoJson(#[from] geojson::Error),

        #[error(transparent)]
        Geometry(#[from] TrailError),
    }

    pub fn run(path: &str, config: &AppConfig) -> Result<String, CliError> {
        let input: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let raw = read_path(input)?;
        let simplified = simplify_with(&raw, config.capture.simplify_options());
        let distance = path_distance(&simplified);
        log::info!(
            "{} -> {} points, {}",
            raw.len(),
            simplified.len(),
            format_distance(distance)
        );

        let mut feature = geojson::Feature::from(route_geometry(&simplified));
        feature.set_property("distance", distance);
        feature.set_property("distance_label", format_distance(distance));
        feature.set_property("raw_points", raw.len());
        Ok(serde_json::to_string_pretty(&feature)?)
    }

    fn read_path(input: Value) -> Result<Vec<LatLng>, CliError> {
        if input.is_array() {
            let pairs: Vec<(f64, f64)> = serde_json::from_value(input)?;
            return pairs
                .into_iter()
                .map(|(lat, lng)| {
                    LatLng::checked(lat, lng).ok_or_else(|| {
                        TrailError::invalid_geometry(format!("invalid point [{lat}, {lng}]")).into()
                    })
                })
                .collect();
        }

        let geometry: Geometry = match GeoJson::from_json_value(input)? {
            GeoJson::Geometry(geometry) => geometry,
            GeoJson::Feature(feature) => feature
                .geometry
                .ok_or_else(|| TrailError::invalid_geometry("feature has no geometry"))?,
            GeoJson::FeatureCollection(_) => {
                return Err(TrailError::invalid_geometry("expected a single LineString").into());
            }
        };
        Ok(path_from_geometry(&geometry)?)
    }
}
