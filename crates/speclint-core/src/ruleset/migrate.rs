//! Upgrades legacy ruleset spellings before loading.

use super::dto::{ExtendsDto, ExtendsEntryDto, RuleEntryDto, RulesetDto};
use super::loader::LoadError;

/// Legacy builtin names and what they map to.
const LEGACY_BUILTINS: &[(&str, &str)] = &[
    ("spectral:oas", "speclint:oas"),
    ("spectral:oas2", "speclint:oas"),
    ("spectral:oas3", "speclint:oas"),
];

/// Maps a legacy builtin name to its current spelling.
#[must_use]
pub fn builtin_alias(name: &str) -> Option<&'static str> {
    LEGACY_BUILTINS
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, current)| *current)
}

/// Rewrites legacy fields in place.
///
/// # Errors
///
/// Returns [`LoadError::CustomFunctions`] if the ruleset declares custom
/// function modules, which cannot be executed.
pub fn migrate(mut dto: RulesetDto) -> Result<RulesetDto, LoadError> {
    if !dto.functions.is_empty() || dto.functions_dir.is_some() {
        return Err(LoadError::CustomFunctions {
            names: dto.functions.clone(),
        });
    }

    if let Some(extends) = dto.extends.take() {
        let entries = extends
            .into_entries()
            .into_iter()
            .map(|entry| match builtin_alias(entry.reference()) {
                Some(current) => {
                    tracing::debug!(
                        from = entry.reference(),
                        to = current,
                        "Migrated extends entry"
                    );
                    match entry {
                        ExtendsEntryDto::Name(_) => ExtendsEntryDto::Name(current.to_string()),
                        ExtendsEntryDto::WithMode(_, mode) => {
                            ExtendsEntryDto::WithMode(current.to_string(), mode)
                        }
                    }
                }
                None => entry,
            })
            .collect();
        dto.extends = Some(ExtendsDto::Many(entries));
    }

    for (name, entry) in &mut dto.rules {
        if let RuleEntryDto::Definition(rule) = entry {
            if rule.description.is_none() {
                if let Some(summary) = rule.summary.take() {
                    tracing::debug!(rule = %name, "Migrated `summary` to `description`");
                    rule.description = Some(summary);
                }
            }
        }
    }

    Ok(dto)
}
