// Drives a controller through a day of changing conditions using the
// headless scene and audio backends.

use glam::Vec3;
use squall_engine::audio::{AudioBackend, MemoryAudio};
use squall_engine::render::{Encoder, HEADER_FLOATS, LAYER_FLOATS, POINTS_FLOATS};
use squall_engine::rng::Xorshift32;
use squall_engine::scene::RenderableKind;
use squall_engine::{Camera, MemoryScene, PrecipitationType, WeatherConfig, WeatherController};

const FRAME: f32 = 1.0 / 60.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(weather: &mut WeatherController<MemoryAudio>, frames: usize) {
    let camera = Camera::at(Vec3::new(0.0, 0.0, 50.0));
    for _ in 0..frames {
        weather.update(FRAME, &camera);
    }
}

#[test]
fn auto_weather_follows_a_cold_front() {
    init_logging();
    let config = WeatherConfig::from_json(
        r#"{"precipitationType":"auto","temperature":-8,"humidity":70,"rainCount":1500,"snowCount":600}"#,
    )
    .unwrap();
    let mut scene = MemoryScene::new();
    let mut weather = WeatherController::new(config, MemoryAudio::new(), Box::new(Xorshift32::new(7)), &mut scene);

    assert_eq!(weather.active_type(), PrecipitationType::Snow);
    assert_eq!(weather.snow().map(|s| s.len()), Some(600));
    run(&mut weather, 30);

    weather.set_temperature(1.0, &mut scene);
    assert_eq!(weather.active_type(), PrecipitationType::Mixed);
    assert_eq!(weather.rain().map(|r| r.len()), Some(1500));
    assert_eq!(scene.count_kind(RenderableKind::Points), 2);
    run(&mut weather, 30);

    weather.set_temperature(25.0, &mut scene);
    assert_eq!(weather.active_type(), PrecipitationType::Rain);
    assert!(weather.snow().is_none());
    run(&mut weather, 30);

    weather.set_humidity(20.0, &mut scene);
    assert_eq!(weather.active_type(), PrecipitationType::None);
    assert_eq!(scene.count_kind(RenderableKind::Points), 0);
    assert_eq!(weather.requested_type(), PrecipitationType::Auto);
}

#[test]
fn particles_stay_inside_the_sky_box() {
    init_logging();
    let config = WeatherConfig {
        rain_count: 500,
        snow_count: 500,
        precipitation_type: PrecipitationType::Mixed,
        ..Default::default()
    };
    let mut scene = MemoryScene::new();
    let mut weather = WeatherController::new(config, MemoryAudio::new(), Box::new(Xorshift32::new(11)), &mut scene);
    weather.set_wind_strength(2.0);
    run(&mut weather, 600);

    let rain = weather.rain().unwrap();
    let bounds = rain.bounds();
    for p in rain.positions().chunks_exact(3) {
        let v = Vec3::new(p[0], p[1], p[2]);
        assert!(v.cmpge(bounds.min - Vec3::splat(1.0)).all(), "{v:?} below {:?}", bounds.min);
        assert!(v.cmple(bounds.max + Vec3::splat(1.0)).all(), "{v:?} above {:?}", bounds.max);
    }
    assert!(weather.snow().unwrap().positions().iter().all(|v| v.is_finite()));
}

#[test]
fn frame_buffer_tracks_the_aurora() {
    init_logging();
    let mut scene = MemoryScene::new();
    let mut weather = WeatherController::new(
        WeatherConfig::default(),
        MemoryAudio::new(),
        Box::new(Xorshift32::new(5)),
        &mut scene,
    );
    weather.activate_aurora();
    weather.trigger_aurora_storm();
    run(&mut weather, 10);

    let mut encoder = Encoder::new();
    encoder.encode(&weather);
    let layers = weather.aurora().layer_count();
    assert!(layers > 0);
    assert_eq!(encoder.len(), HEADER_FLOATS + 2 * POINTS_FLOATS + layers * LAYER_FLOATS);
    assert!(encoder.as_slice().iter().all(|v| v.is_finite()));
}

#[test]
fn audio_toggles_and_shuts_down_with_the_controller() {
    init_logging();
    let mut scene = MemoryScene::new();
    let mut weather = WeatherController::new(
        WeatherConfig::default(),
        MemoryAudio::new(),
        Box::new(Xorshift32::new(9)),
        &mut scene,
    );
    assert!(!weather.audio().is_started());

    weather.toggle_audio();
    assert!(weather.audio().is_started());
    assert!(!weather.audio().is_muted());
    assert!(weather.audio().backend().node_count() > 0);

    weather.toggle_audio();
    assert!(weather.audio().is_muted());

    weather.dispose(&mut scene);
    assert!(scene.is_empty());
    assert!(!weather.audio().is_started());
    assert!(!weather.audio().backend().is_open());
}
