//! ACL bootstrap output parsing
//!
//! `consul acl bootstrap` prints a human-readable block; the management
//! token is the `SecretID` line. Consul also logs a known line once the
//! anonymous token from the seeded configuration is applied, which the
//! pipeline uses as readiness evidence before bootstrapping.

use regex::Regex;

/// Log line Consul emits once the seeded ACL configuration is live.
pub const ANONYMOUS_TOKEN_EVIDENCE: &str = "Created ACL anonymous token from configuration";

/// Extract the management token from `consul acl bootstrap` output.
pub fn parse_bootstrap_secret(output: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^\s*SecretID:\s*(\S+)").unwrap();
    re.captures(output).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOTSTRAP_OUTPUT: &str = "\
AccessorID:       a1b2c3d4-1111-2222-3333-444455556666
SecretID:         527347d3-9653-07dc-adc0-598b8f2b0f4d
Description:      Bootstrap Token (Global Management)
Local:            false
Create Time:      2025-08-25 12:00:00.000000 +0000 UTC
Policies:
   00000000-0000-0000-0000-000000000001 - global-management
";

    #[test]
    fn extracts_secret_id() {
        assert_eq!(
            parse_bootstrap_secret(BOOTSTRAP_OUTPUT).as_deref(),
            Some("527347d3-9653-07dc-adc0-598b8f2b0f4d")
        );
    }

    #[test]
    fn output_without_secret_is_none() {
        assert_eq!(
            parse_bootstrap_secret("Failed: ACL bootstrap no longer allowed"),
            None
        );
        assert_eq!(parse_bootstrap_secret(""), None);
    }

    #[test]
    fn indented_secret_line_still_matches() {
        assert_eq!(
            parse_bootstrap_secret("  SecretID:   abc-def\n"),
            Some("abc-def".to_string())
        );
    }
}
