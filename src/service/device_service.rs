use axum::http::HeaderMap;
use serde::Serialize;

/// Best-effort metadata about the requesting client. Used for multi-device
/// bookkeeping and diagnostics only, never for authorization decisions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub device_brand: String,
    pub device_model: String,
    pub os: String,
    pub os_version: String,
    pub client_name: String,
    pub client_type: String,
    pub client_version: String,
}

pub struct DeviceService;

impl DeviceService {
    /// Extract a device descriptor from request headers. Missing or
    /// unparseable input yields empty fields, never an error.
    pub fn extract(headers: &HeaderMap) -> DeviceDescriptor {
        headers
            .get("user-agent")
            .and_then(|ua| ua.to_str().ok())
            .map(Self::parse_user_agent)
            .unwrap_or_default()
    }

    /// Pure user-agent parse into the device fields.
    pub fn parse_user_agent(user_agent: &str) -> DeviceDescriptor {
        let mut descriptor = DeviceDescriptor::default();
        if user_agent.trim().is_empty() {
            return descriptor;
        }

        parse_os(user_agent, &mut descriptor);
        parse_client(user_agent, &mut descriptor);
        descriptor
    }
}

fn parse_os(user_agent: &str, descriptor: &mut DeviceDescriptor) {
    if let Some(version) = token_after(user_agent, "Windows NT ") {
        descriptor.os = "Windows".to_string();
        descriptor.os_version = version;
    } else if user_agent.contains("iPhone") {
        descriptor.os = "iOS".to_string();
        descriptor.device_brand = "Apple".to_string();
        descriptor.device_model = "iPhone".to_string();
        if let Some(version) = token_after(user_agent, "OS ") {
            descriptor.os_version = version.replace('_', ".");
        }
    } else if user_agent.contains("iPad") {
        descriptor.os = "iOS".to_string();
        descriptor.device_brand = "Apple".to_string();
        descriptor.device_model = "iPad".to_string();
        if let Some(version) = token_after(user_agent, "OS ") {
            descriptor.os_version = version.replace('_', ".");
        }
    } else if user_agent.contains("Android") {
        descriptor.os = "Android".to_string();
        if let Some(version) = token_after(user_agent, "Android ") {
            descriptor.os_version = version.trim_end_matches(';').to_string();
        }
        // "...; Pixel 7 Build/..." carries the model between the last
        // semicolon and the Build token.
        if let Some(build_idx) = user_agent.find(" Build/") {
            let head = &user_agent[..build_idx];
            if let Some(model) = head.rsplit(';').next() {
                descriptor.device_model = model.trim().to_string();
            }
        }
    } else if user_agent.contains("Mac OS X") {
        descriptor.os = "macOS".to_string();
        descriptor.device_brand = "Apple".to_string();
        descriptor.device_model = "Mac".to_string();
        if let Some(version) = token_after(user_agent, "Mac OS X ") {
            descriptor.os_version = version.trim_end_matches(')').replace('_', ".");
        }
    } else if user_agent.contains("Linux") {
        descriptor.os = "Linux".to_string();
    }
}

fn parse_client(user_agent: &str, descriptor: &mut DeviceDescriptor) {
    // Order matters: Edge and Chrome both advertise "Chrome/", Chrome and
    // Safari both advertise "Safari/".
    let candidates: &[(&str, &str)] = &[
        ("Edg/", "Edge"),
        ("Firefox/", "Firefox"),
        ("Chrome/", "Chrome"),
        ("Version/", "Safari"),
    ];

    for (marker, name) in candidates {
        if let Some(version) = token_after(user_agent, marker) {
            if *name == "Safari" && !user_agent.contains("Safari/") {
                continue;
            }
            descriptor.client_name = name.to_string();
            descriptor.client_type = "browser".to_string();
            descriptor.client_version = version;
            return;
        }
    }

    // Fall back to the first product token, e.g. "curl/8.4.0".
    if let Some(first) = user_agent.split_whitespace().next() {
        if let Some((name, version)) = first.split_once('/') {
            descriptor.client_name = name.to_string();
            descriptor.client_version = version.to_string();
        } else {
            descriptor.client_name = first.to_string();
        }
    }
}

/// The whitespace-or-delimiter-bounded token following `marker`.
fn token_after(haystack: &str, marker: &str) -> Option<String> {
    let start = haystack.find(marker)? + marker.len();
    let rest = &haystack[start..];
    let token: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != ';' && *c != ')')
        .collect();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
