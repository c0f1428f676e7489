//! OWASP-style password strength test.
//!
//! Required tests (length bounds, no triple repeats) always apply. Optional
//! tests (lowercase, uppercase, digit, special character) are skipped for
//! passphrases: secrets at least `min_phrase_length` long.

use serde::{Deserialize, Serialize};

/// Strength policy settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub min_phrase_length: usize,
    /// Optional tests a non-passphrase must pass (out of 4).
    pub min_optional_tests: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 128,
            min_phrase_length: 20,
            min_optional_tests: 4,
        }
    }
}

/// Outcome of [`PasswordPolicy::test`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StrengthReport {
    /// Failed required tests.
    pub required_failures: Vec<String>,
    /// Failed optional tests (empty for passphrases).
    pub optional_failures: Vec<String>,
    pub optional_passed: usize,
    pub is_passphrase: bool,
    pub strong: bool,
}

impl StrengthReport {
    /// Every failure message, required first.
    pub fn errors(&self) -> Vec<String> {
        if self.strong {
            return Vec::new();
        }
        self.required_failures
            .iter()
            .chain(self.optional_failures.iter())
            .cloned()
            .collect()
    }
}

impl PasswordPolicy {
    pub fn test(&self, password: &str) -> StrengthReport {
        let chars: Vec<char> = password.chars().collect();
        let mut report = StrengthReport::default();

        if chars.len() < self.min_length {
            report.required_failures.push(format!(
                "The password must be at least {} characters long.",
                self.min_length
            ));
        }
        if chars.len() > self.max_length {
            report.required_failures.push(format!(
                "The password must be fewer than {} characters.",
                self.max_length
            ));
        }
        if chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2]) {
            report.required_failures.push(
                "The password may not contain sequences of three or more repeated characters."
                    .into(),
            );
        }

        report.is_passphrase = chars.len() >= self.min_phrase_length;
        if !report.is_passphrase {
            let optional: [(bool, &str); 4] = [
                (
                    chars.iter().any(char::is_ascii_lowercase),
                    "The password must contain at least one lowercase letter.",
                ),
                (
                    chars.iter().any(char::is_ascii_uppercase),
                    "The password must contain at least one uppercase letter.",
                ),
                (
                    chars.iter().any(char::is_ascii_digit),
                    "The password must contain at least one number.",
                ),
                (
                    chars.iter().any(|c| !c.is_ascii_alphanumeric()),
                    "The password must contain at least one special character.",
                ),
            ];
            for (passed, message) in optional {
                if passed {
                    report.optional_passed += 1;
                } else {
                    report.optional_failures.push(message.to_string());
                }
            }
        }

        report.strong = report.required_failures.is_empty()
            && (report.is_passphrase || report.optional_passed >= self.min_optional_tests);
        report
    }

    /// Shorthand for `self.test(password).strong`.
    pub fn is_strong(&self, password: &str) -> bool {
        self.test(password).strong
    }

    /// Human-readable hint shown when a password is rejected.
    pub fn requirement_hint(&self) -> String {
        format!(
            "Please enter a passphrase or password with {} or more characters, numbers, lowercase, uppercase, and special characters.",
            self.min_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passphrase::generate_passphrase;

    #[test]
    fn complex_password_is_strong() {
        let report = PasswordPolicy::default().test("Str0ng!Pass");
        assert!(report.strong, "{report:?}");
        assert!(!report.is_passphrase);
        assert_eq!(report.optional_passed, 4);
    }

    #[test]
    fn short_password_fails_required() {
        let report = PasswordPolicy::default().test("Ab1!");
        assert!(!report.strong);
        assert_eq!(report.required_failures.len(), 1);
        assert!(report.errors()[0].contains("at least 10"));
    }

    #[test]
    fn missing_classes_fail_optional() {
        let report = PasswordPolicy::default().test("lowercase12");
        assert!(!report.strong);
        assert_eq!(report.optional_passed, 2);
    }

    #[test]
    fn repeats_fail_even_for_passphrases() {
        let report = PasswordPolicy::default().test("correct horse batttery staple");
        assert!(report.is_passphrase);
        assert!(!report.strong);
    }

    #[test]
    fn passphrase_skips_optional_tests() {
        let report = PasswordPolicy::default().test("correct horse battery staple");
        assert!(report.strong);
        assert!(report.optional_failures.is_empty());
    }

    #[test]
    fn too_long_rejected() {
        let policy = PasswordPolicy {
            max_length: 30,
            ..PasswordPolicy::default()
        };
        assert!(!policy.is_strong(&"ab".repeat(20)));
    }

    #[test]
    fn relaxed_optional_count() {
        let policy = PasswordPolicy {
            min_optional_tests: 2,
            ..PasswordPolicy::default()
        };
        assert!(policy.is_strong("lowercase12"));
    }

    #[test]
    fn generated_passphrases_are_strong() {
        let policy = PasswordPolicy::default();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let p = generate_passphrase(&mut rng);
            assert!(policy.is_strong(&p), "{p}");
        }
    }
}
