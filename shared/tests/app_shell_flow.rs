mod common;

use common::*;
use crux_core::testing::AppTester;
use crux_core::App as _;
use shared::capabilities::HttpError;
use shared::{App, AppConfig, Effect, Event, Language, Model, WeatherState};

const WEATHER: &str = r#"{
    "timestamp": "2024-06-01T06:30:00Z", "fetch_time": 1717223400,
    "temp": 27.5, "feels_like": 29.49, "temp_min": 25.2, "temp_max": 30.8,
    "pressure": 1010, "humidity": 78, "wind_speed": 3.6, "wind_direction": 200,
    "weather_main": "Rain", "weather_description": "light rain",
    "clouds": 75, "city": "Mysuru", "rain_chance": 60
}"#;

#[test]
fn test_weather_fetched_on_mount() {
    let (app, mut model) = configured();

    let update = app.update(Event::WeatherScreenMounted, &mut model);
    let requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].operation.method, "GET");
    assert_eq!(
        requests[0].operation.url,
        "http://10.0.2.2:8000/fetch-current-weather-data"
    );
    assert!(shared::App.view(&model).weather.is_loading);

    respond_weather(&app, &mut model, response(200, WEATHER));

    let card = shared::App
        .view(&model)
        .weather
        .report
        .expect("weather is shown");
    assert_eq!(card.city, "Mysuru");
    assert_eq!(card.temperature, "28°C");
    assert_eq!(card.feels_like, "29°C");
    assert_eq!(card.rain_chance, "60%");
}

#[test]
fn test_weather_failure_message() {
    let (app, mut model) = configured();
    app.update(Event::WeatherScreenMounted, &mut model);

    let failure = Err(HttpError::Transport {
        message: "offline".into(),
    });
    respond_weather(&app, &mut model, failure);

    assert_eq!(
        shared::App.view(&model).weather.error_text.as_deref(),
        Some("Failed to fetch weather data. Check network or CORS settings.")
    );
}

#[test]
fn test_weather_without_server_fails_immediately() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::WeatherScreenMounted, &mut model);
    assert!(http_requests(update.effects).is_empty());
    assert!(matches!(model.weather, WeatherState::Failed(_)));
}

#[test]
fn test_language_switch_changes_labels_only() {
    let (app, mut model) = configured();
    app.update(Event::ScreenMounted(shared::Endpoint::PestQuery), &mut model);
    app.update(
        Event::QueryChanged {
            endpoint: shared::Endpoint::PestQuery,
            text: "aphid".into(),
        },
        &mut model,
    );
    let pipeline_before = model.pest_lookup.pipeline.state().clone();

    let update = app.update(Event::LanguageSelected(Language::Ta), &mut model);
    assert!(renders(&update.effects) > 0);

    let view = shared::App.view(&model);
    assert_eq!(view.app_title, "பண்ணை உதவியாளர்");
    assert_eq!(view.nav.close, "மூடு");
    assert_eq!(view.language, "ta");
    // Untranslated keys fall back to English.
    assert_eq!(view.pest_image.title, "Pest Checkup");
    assert_eq!(model.pest_lookup.pipeline.state(), &pipeline_before);
    assert_eq!(model.pest_lookup.pipeline.query(), "aphid");
}

#[test]
fn test_configure_sets_language_and_server() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let config = AppConfig::from_json(
        r#"{"server_url":"https://agri.example.org/api","default_language":"kn"}"#,
    )
    .unwrap();
    app.update(Event::Configure(config), &mut model);

    assert_eq!(model.language, Language::Kn);
    assert_eq!(shared::App.view(&model).app_title, "ಕೃಷಿ ಸಹಾಯಕ");

    let update = app.update(Event::WeatherScreenMounted, &mut model);
    let requests = http_requests(update.effects);
    assert_eq!(
        requests[0].operation.url,
        "https://agri.example.org/api/fetch-current-weather-data"
    );
}
