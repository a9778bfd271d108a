//! Product QR codes. The code is stored as a deep link to the product's scan
//! page and the picture is rendered by an external QR image service.

use chrono::Utc;
use rand::Rng;

pub const QR_PREFIX: &str = "SHC";
const QR_MAX_LEN: usize = 20;
const QR_IMAGE_API: &str = "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=";

#[derive(Debug, Clone, PartialEq)]
pub struct QrCode {
    pub number: String,
    pub url: String,
    pub image_url: String,
}

pub fn generate_number() -> String {
    let random: u32 = rand::thread_rng().gen_range(0..10_000);
    let mut number = format!("{QR_PREFIX}{}{random}", Utc::now().timestamp_millis());
    number.truncate(QR_MAX_LEN);
    number
}

pub fn for_number(base_url: &str, number: &str) -> QrCode {
    let url = format!("{}/products/qrcode/{number}", base_url.trim_end_matches('/'));
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    QrCode {
        number: number.to_string(),
        image_url: format!("{QR_IMAGE_API}{encoded}"),
        url,
    }
}

pub fn generate(base_url: &str) -> QrCode {
    for_number(base_url, &generate_number())
}

/// The bare code from a stored value, which is either the code itself or a
/// `/qrcode/{code}` link.
pub fn extract_number(stored: &str) -> Option<String> {
    if stored.is_empty() {
        return None;
    }
    if stored.starts_with(QR_PREFIX) {
        return Some(stored.to_string());
    }
    let number = stored
        .split_once("/qrcode/")
        .map(|(_, rest)| rest.split(['/', '?', '#']).next().unwrap_or(rest))
        .filter(|code| !code.is_empty())
        .unwrap_or(stored);
    Some(number.to_string())
}

/// Codes arrive in a URL path; anything but ASCII letters and digits is a typo.
pub fn is_valid_number(code: &str) -> bool {
    !code.is_empty() && code.len() <= 64 && code.chars().all(|c| c.is_ascii_alphanumeric())
}
