//! Input shape checks shared by the services. Nothing here touches the database.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid slug regex"));
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("valid separator regex"));

pub const MIN_PASSWORD_LEN: usize = 6;
const PHONE_DIGITS: usize = 10;
const PINCODE_DIGITS: usize = 6;
const PHONE_PREFIX: &str = "+91";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Reduce a phone number to its digits and prefix the country code.
/// Returns `None` unless exactly ten digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits.len() == PHONE_DIGITS).then(|| format!("{PHONE_PREFIX}{digits}"))
}

pub fn is_valid_pincode(raw: &str) -> bool {
    let raw = raw.trim();
    raw.len() == PINCODE_DIGITS && raw.chars().all(|c| c.is_ascii_digit())
}

/// URL slug for a category name: `"Kids' Wear!!"` becomes `kids-wear`.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = NON_WORD_RE.replace_all(&lowered, "");
    let collapsed = SEPARATOR_RE.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Discount shown next to the price. An original price above the selling price
/// wins over a supplied percentage.
pub fn discount_percentage(price: i64, original_price: Option<i64>, supplied: Option<i32>) -> i32 {
    match original_price {
        Some(original) if original > price && original > 0 => {
            (((original - price) as f64 / original as f64) * 100.0).round() as i32
        }
        _ => supplied.unwrap_or(0).clamp(0, 100),
    }
}

/// Raw product fields as submitted by the admin form.
#[derive(Debug, Default, Clone)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub category: String,
}

pub fn validate_product(input: &ProductInput) -> Vec<String> {
    let mut errors = Vec::new();

    if input.title.trim().chars().count() < 3 {
        errors.push("Title must be at least 3 characters".to_string());
    }
    if input.description.trim().chars().count() < 10 {
        errors.push("Description must be at least 10 characters".to_string());
    }
    if !matches!(input.price, Some(price) if price > 0) {
        errors.push("Price must be a positive number".to_string());
    }
    if !matches!(input.stock, Some(stock) if stock >= 0) {
        errors.push("Stock must be a non-negative number".to_string());
    }
    if input.category.trim().is_empty() {
        errors.push("Category is required".to_string());
    }

    errors
}

#[derive(Debug, Default, Clone)]
pub struct RegistrationInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

pub fn validate_registration(input: &RegistrationInput<'_>) -> Vec<String> {
    let mut errors = Vec::new();

    if input.name.trim().chars().count() < 2 {
        errors.push("Name must be at least 2 characters".to_string());
    }
    if !is_valid_email(input.email) {
        errors.push("Valid email is required".to_string());
    }
    if !is_valid_password(input.password) {
        errors.push("Password must be at least 6 characters".to_string());
    }
    if input.password != input.confirm_password {
        errors.push("Passwords do not match".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_punctuation_and_collapses_separators() {
        assert_eq!(slugify("Kids' Wear!!"), "kids-wear");
        assert_eq!(slugify("  Silk  Sarees "), "silk-sarees");
        assert_eq!(slugify("T_Shirts -- Men"), "t-shirts-men");
        assert_eq!(slugify("--Festive--"), "festive");
    }

    #[test]
    fn phone_keeps_exactly_ten_digits() {
        assert_eq!(normalize_phone("98765-43210").as_deref(), Some("+919876543210"));
        assert_eq!(normalize_phone("(987) 654 3210").as_deref(), Some("+919876543210"));
        assert_eq!(normalize_phone("987654321"), None);
        assert_eq!(normalize_phone("+91 98765 43210"), None);
        assert_eq!(normalize_phone(""), None);
    }

    #[test]
    fn pincode_must_be_six_digits() {
        assert!(is_valid_pincode("560001"));
        assert!(is_valid_pincode(" 560001 "));
        assert!(!is_valid_pincode("56001"));
        assert!(!is_valid_pincode("56000a"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("buyer@example.com"));
        assert!(!is_valid_email("buyer@example"));
        assert!(!is_valid_email("buyer example.com"));
    }

    #[test]
    fn discount_prefers_original_price() {
        assert_eq!(discount_percentage(750, Some(1000), Some(10)), 25);
        assert_eq!(discount_percentage(1000, Some(1000), Some(10)), 10);
        assert_eq!(discount_percentage(1000, None, None), 0);
        assert_eq!(discount_percentage(2000, Some(3000), None), 33);
    }

    #[test]
    fn product_validation_reports_each_problem() {
        let errors = validate_product(&ProductInput::default());
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], "Title must be at least 3 characters");

        let ok = ProductInput {
            title: "Silk Saree".into(),
            description: "Handwoven silk with zari border".into(),
            price: Some(15000),
            stock: Some(0),
            category: "Silk".into(),
        };
        assert!(validate_product(&ok).is_empty());
    }

    #[test]
    fn registration_checks_password_confirmation() {
        let input = RegistrationInput {
            name: "Asha",
            email: "asha@example.com",
            password: "secret1",
            confirm_password: "secret2",
        };
        assert_eq!(validate_registration(&input), vec!["Passwords do not match"]);
    }
}
