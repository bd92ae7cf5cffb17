//! Structural validation of definitions before upload

use once_cell::sync::Lazy;
use regex::Regex;

use crate::definition::{ApiView, ApplicationView, Definition, DefinitionKind};
use crate::error::{ImportError, Result, ValidationRule};

static ILLEGAL_NAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[~!@#;:%^*()+={}|\\<>"',&/$]"#).expect("name pattern is valid")
});

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Check an API or API Product view; the first broken rule is reported
pub fn validate_api(view: &ApiView, kind: DefinitionKind) -> Result<()> {
    let name = view.name(kind);
    let rule = if name.trim().is_empty() {
        Some(ValidationRule::NameRequired)
    } else if ILLEGAL_NAME_CHARS.is_match(name) {
        Some(ValidationRule::NameIllegalCharacters)
    } else if view.version().trim().is_empty() {
        Some(ValidationRule::VersionRequired)
    } else if blank(view.context.as_deref()) {
        Some(ValidationRule::ContextRequired)
    } else if blank(view.context_template.as_deref()) {
        Some(ValidationRule::ContextTemplateRequired)
    } else if !view.context.as_deref().unwrap_or_default().starts_with('/') {
        Some(ValidationRule::ContextLeadingSlash)
    } else if !view
        .context_template
        .as_deref()
        .unwrap_or_default()
        .starts_with('/')
    {
        Some(ValidationRule::ContextTemplateLeadingSlash)
    } else {
        None
    };

    match rule {
        Some(rule) => Err(ImportError::ValidationFailed(rule)),
        None => Ok(()),
    }
}

/// Applications only need a name
pub fn validate_application(view: &ApplicationView) -> Result<()> {
    if blank(view.name.as_deref()) {
        return Err(ImportError::ValidationFailed(ValidationRule::NameRequired));
    }
    Ok(())
}

/// Validate the in-memory tree of `definition`
pub fn validate(definition: &Definition) -> Result<()> {
    match definition.kind() {
        DefinitionKind::Application => validate_application(&definition.view()?),
        kind => validate_api(&definition.view()?, kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ApiIdentifier;

    fn view(name: &str, version: &str, context: &str, template: &str) -> ApiView {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ApiView {
            id: ApiIdentifier {
                api_name: opt(name),
                version: opt(version),
                ..Default::default()
            },
            context: opt(context),
            context_template: opt(template),
            ..Default::default()
        }
    }

    fn rule_of(v: &ApiView) -> Option<ValidationRule> {
        match validate_api(v, DefinitionKind::Api) {
            Ok(()) => None,
            Err(ImportError::ValidationFailed(rule)) => Some(rule),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accepts_a_complete_definition() {
        assert_eq!(rule_of(&view("PizzaAPI", "1.0.0", "/pizza/1.0.0", "/pizza/{version}")), None);
    }

    #[test]
    fn illegal_name_is_reported_before_missing_context() {
        assert_eq!(
            rule_of(&view("Pizza/API", "1.0.0", "", "")),
            Some(ValidationRule::NameIllegalCharacters)
        );
    }

    #[test]
    fn rules_fire_in_order() {
        assert_eq!(rule_of(&view(" ", "1", "/a", "/a")), Some(ValidationRule::NameRequired));
        assert_eq!(rule_of(&view("a", "", "/a", "/a")), Some(ValidationRule::VersionRequired));
        assert_eq!(rule_of(&view("a", "1", "", "/a")), Some(ValidationRule::ContextRequired));
        assert_eq!(
            rule_of(&view("a", "1", "/a", "")),
            Some(ValidationRule::ContextTemplateRequired)
        );
        assert_eq!(rule_of(&view("a", "1", "a", "a")), Some(ValidationRule::ContextLeadingSlash));
        assert_eq!(
            rule_of(&view("a", "1", "/a", "a")),
            Some(ValidationRule::ContextTemplateLeadingSlash)
        );
    }

    #[test]
    fn every_forbidden_character_is_rejected() {
        for c in r#"~!@#;:%^*()+={}|\<>"',&/$"#.chars() {
            let name = format!("Pizza{c}API");
            assert_eq!(
                rule_of(&view(&name, "1", "/a", "/a")),
                Some(ValidationRule::NameIllegalCharacters),
                "{c} should be rejected"
            );
        }
        assert_eq!(rule_of(&view("Pizza-API_v2.1", "1", "/a", "/a")), None);
    }
}
