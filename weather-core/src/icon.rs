use crate::model::IconKey;

/// Map an upstream condition label to an icon.
///
/// Matching is exact; anything unknown (including other casings) falls back to
/// [`IconKey::Cloud`].
pub fn map_condition_to_icon(condition: &str) -> IconKey {
    match condition {
        "Clear" => IconKey::Sun,
        "Clouds" => IconKey::Cloud,
        "Rain" | "Drizzle" => IconKey::CloudRain,
        "Thunderstorm" => IconKey::CloudLightning,
        "Snow" => IconKey::CloudSnow,
        "Mist" | "Fog" | "Haze" => IconKey::Cloud,
        _ => IconKey::Cloud,
    }
}
