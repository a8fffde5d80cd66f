use regex::Regex;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::sync::OnceLock;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(range(min = 100000, max = 999999, message = "OTP must be a 6-digit number"))]
    pub otp: u32,
    pub address: String,
}

// 接口统一的响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self {
            message: "Validation error(s)".to_string(),
            errors,
        }
    }
}

fn address_regex() -> &'static Regex {
    static ADDRESS: OnceLock<Regex> = OnceLock::new();
    ADDRESS.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap())
}

/// 0x + 40 位十六进制；大小写混合时按 EIP-55 校验
pub fn is_valid_address(address: &str) -> bool {
    if !address_regex().is_match(address) {
        return false;
    }
    let hex = &address[2..];
    if hex == hex.to_lowercase() || hex == hex.to_uppercase() {
        return true;
    }
    has_valid_checksum(hex)
}

fn has_valid_checksum(hex: &str) -> bool {
    let hash = Keccak256::digest(hex.to_lowercase().as_bytes());
    hex.chars().enumerate().all(|(i, c)| {
        if !c.is_ascii_alphabetic() {
            return true;
        }
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        (nibble >= 8) == c.is_ascii_uppercase()
    })
}

fn check_domain(email: &str, allowed_domain: &str, errors: &mut Vec<String>) {
    if !email.trim().to_lowercase().ends_with(allowed_domain) {
        errors.push(format!("email - Email must end with {}", allowed_domain));
    }
}

/// 把 validator 的错误展开成 "字段 - 信息" 列表
fn flatten(result: Result<(), ValidationErrors>) -> Vec<String> {
    let Err(errors) = result else {
        return Vec::new();
    };

    let mut lines: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{} - {}", field, message)
            })
        })
        .collect();
    lines.sort();
    lines
}

impl SendOtpRequest {
    pub fn check(&self, allowed_domain: &str) -> Vec<String> {
        let mut errors = flatten(self.validate());
        check_domain(&self.email, allowed_domain, &mut errors);
        errors
    }
}

impl VerifyOtpRequest {
    pub fn check(&self, allowed_domain: &str) -> Vec<String> {
        let mut errors = flatten(self.validate());
        check_domain(&self.email, allowed_domain, &mut errors);
        if !is_valid_address(self.address.trim()) {
            errors.push("address - Invalid address".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_checks_syntax_and_domain() {
        let ok = SendOtpRequest {
            email: "alice@pse.dev".to_string(),
        };
        assert!(ok.check("@pse.dev").is_empty());

        let wrong_domain = SendOtpRequest {
            email: "alice@example.com".to_string(),
        };
        assert_eq!(
            wrong_domain.check("@pse.dev"),
            vec!["email - Email must end with @pse.dev".to_string()]
        );

        let malformed = SendOtpRequest {
            email: "not-an-email".to_string(),
        };
        let errors = malformed.check("@pse.dev");
        assert!(errors.contains(&"email - Invalid email".to_string()));
    }

    #[test]
    fn verify_request_checks_every_field() {
        let ok = VerifyOtpRequest {
            email: "alice@pse.dev".to_string(),
            otp: 123456,
            address: "0x52908400098527886E0F7030069857D2E4169EE7".to_string(),
        };
        assert!(ok.check("@pse.dev").is_empty());

        let bad = VerifyOtpRequest {
            email: "alice@pse.dev".to_string(),
            otp: 12345,
            address: "0x1234".to_string(),
        };
        let errors = bad.check("@pse.dev");
        assert_eq!(
            errors,
            vec![
                "otp - OTP must be a 6-digit number".to_string(),
                "address - Invalid address".to_string(),
            ]
        );
    }

    #[test]
    fn address_format() {
        assert!(is_valid_address("0x0000000000000000000000000000000000000000"));
        assert!(!is_valid_address("0000000000000000000000000000000000000000"));
        assert!(!is_valid_address("0x000000000000000000000000000000000000000g"));
        assert!(!is_valid_address("0x00000000000000000000000000000000000000000"));
    }

    #[test]
    fn mixed_case_addresses_need_a_valid_checksum() {
        for address in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
            "0x52908400098527886E0F7030069857D2E4169EE7",
        ] {
            assert!(is_valid_address(address), "{}", address);
        }

        // 单个字母大小写翻转
        assert!(!is_valid_address("0x52908400098527886e0F7030069857D2E4169EE7"));
        assert!(!is_valid_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"));

        // 全小写、全大写不做校验
        assert!(is_valid_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(is_valid_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"));
    }
}
