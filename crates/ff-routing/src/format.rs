use crate::{DirectionsRequest, Itinerary};

/// Public maps URL that opens the same route in a browser or phone app.
const DIRECTIONS_LINK_BASE: &str = "https://www.google.com/maps/dir/";

/// Remove markup from a provider instruction.
///
/// Block tags (`<div>`, `<br>`) become a separator so trailing notes such as
/// "Destination will be on the right" do not run into the previous word.
pub fn strip_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in s.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "div" | "br" | "p") {
                    out.push(' ');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "850 m", "1.2 km".
pub fn format_distance(meters: u64) -> String {
    if meters < 1000 {
        format!("{meters} m")
    } else {
        format!("{:.1} km", meters as f64 / 1000.0)
    }
}

/// "45 s", "7 min", "1 h 05 min". Minutes are rounded to the nearest.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds} s");
    }
    let minutes = (seconds + 30) / 60;
    if minutes < 60 {
        format!("{minutes} min")
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}

/// Driver-facing text: one block per leg with numbered steps, then a total.
pub fn format_itinerary(it: &Itinerary) -> String {
    let mut out = String::new();
    for (i, leg) in it.legs.iter().enumerate() {
        out.push_str(&format!(
            "Leg {}: {} -> {} ({}, {})\n",
            i + 1,
            leg.start_address,
            leg.end_address,
            format_distance(leg.distance_m),
            format_duration(leg.duration_s),
        ));
        for (n, step) in leg.steps.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} ({})\n",
                n + 1,
                step.instruction,
                format_distance(step.distance_m),
            ));
        }
    }
    out.push_str(&format!(
        "Total: {}, {}\n",
        format_distance(it.total_distance_m()),
        format_duration(it.total_duration_s()),
    ));
    out
}

/// Shareable directions link for `req`.
pub fn directions_url(req: &DirectionsRequest) -> String {
    let mut params: Vec<(&str, String)> = vec![
        ("api", "1".to_string()),
        ("origin", req.origin.clone()),
        ("destination", req.destination.clone()),
        ("travelmode", req.mode.as_str().to_string()),
    ];
    if !req.waypoints.is_empty() {
        params.push(("waypoints", req.waypoints.join("|")));
    }
    match reqwest::Url::parse_with_params(DIRECTIONS_LINK_BASE, &params) {
        Ok(url) => url.to_string(),
        // The base is a constant valid URL.
        Err(_) => DIRECTIONS_LINK_BASE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Leg, Step, TravelMode};

    #[test]
    fn strip_html_handles_google_markup() {
        assert_eq!(
            strip_html("Turn <b>left</b> onto <b>Rue de Nantes</b>"),
            "Turn left onto Rue de Nantes"
        );
        assert_eq!(
            strip_html(
                "Turn right<div style=\"font-size:0.9em\">Destination will be on the left</div>"
            ),
            "Turn right Destination will be on the left"
        );
        assert_eq!(strip_html("Caf&eacute; &amp; bar&nbsp;ahead"), "Caf&eacute; & bar ahead");
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn distance_and_duration_rendering() {
        assert_eq!(format_distance(850), "850 m");
        assert_eq!(format_distance(1240), "1.2 km");
        assert_eq!(format_duration(45), "45 s");
        assert_eq!(format_duration(89), "1 min");
        assert_eq!(format_duration(90), "2 min");
        assert_eq!(format_duration(3900), "1 h 05 min");
    }

    #[test]
    fn itinerary_text_numbers_steps_and_totals() {
        let it = Itinerary {
            legs: vec![Leg {
                start_address: "Kitchen".to_string(),
                end_address: "Customer".to_string(),
                distance_m: 2300,
                duration_s: 420,
                steps: vec![
                    Step {
                        instruction: "Head north".to_string(),
                        distance_m: 300,
                        duration_s: 60,
                    },
                    Step {
                        instruction: "Turn left".to_string(),
                        distance_m: 2000,
                        duration_s: 360,
                    },
                ],
            }],
        };
        let text = format_itinerary(&it);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Leg 1: Kitchen -> Customer (2.3 km, 7 min)");
        assert_eq!(lines[1], "  1. Head north (300 m)");
        assert_eq!(lines[2], "  2. Turn left (2.0 km)");
        assert_eq!(lines[3], "Total: 2.3 km, 7 min");
    }

    #[test]
    fn directions_url_encodes_addresses() {
        let url = directions_url(&DirectionsRequest {
            origin: "51 Rue Blaise Pascal, 35170 Bruz".to_string(),
            destination: "3 Place des Lices, 35000 Rennes".to_string(),
            waypoints: vec![],
            mode: TravelMode::Bicycling,
        });
        assert!(url.starts_with("https://www.google.com/maps/dir/?api=1&origin=51+Rue+Blaise+Pascal"));
        assert!(url.contains("travelmode=bicycling"));
        assert!(!url.contains("waypoints"));
        assert!(!url.contains(' '));
    }
}
