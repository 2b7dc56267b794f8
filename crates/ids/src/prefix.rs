//! Entity type → 3-letter prefix.

use std::borrow::Cow;

use eventdesk_core::EntityKind;

/// Prefix used for blank entity types.
pub const GENERIC_PREFIX: &str = "GEN";

/// Resolve the prefix for an entity type name.
///
/// Known types use the fixed table in [`EntityKind`]. Anything else gets a prefix
/// derived from its characters:
/// - blank: `GEN`
/// - 3+ chars: first, middle (`len / 2`) and last, uppercased
/// - 2 chars: both + `X`
/// - 1 char: it + `XX`
pub fn prefix_for(entity_type: &str) -> Cow<'static, str> {
    if let Some(kind) = EntityKind::from_type_name(entity_type) {
        return Cow::Borrowed(kind.prefix());
    }
    if entity_type.trim().is_empty() {
        return Cow::Borrowed(GENERIC_PREFIX);
    }

    let chars: Vec<char> = entity_type.chars().collect();
    let picked: Vec<char> = match chars.len() {
        1 => vec![chars[0], 'X', 'X'],
        2 => vec![chars[0], chars[1], 'X'],
        n => vec![chars[0], chars[n / 2], chars[n - 1]],
    };

    Cow::Owned(picked.into_iter().flat_map(char::to_uppercase).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_use_table() {
        assert_eq!(prefix_for("cliente"), "CLE");
        assert_eq!(prefix_for("reserva"), "REA");
        assert_eq!(prefix_for("pago"), "PGO");
        assert_eq!(prefix_for("tipoPago"), "TPG");
        assert_eq!(prefix_for("listaItems"), "LIT");
    }

    #[test]
    fn blank_types_are_generic() {
        assert_eq!(prefix_for(""), "GEN");
        assert_eq!(prefix_for("   "), "GEN");
    }

    #[test]
    fn short_types_are_padded_with_x() {
        assert_eq!(prefix_for("ab"), "ABX");
        assert_eq!(prefix_for("a"), "AXX");
    }

    #[test]
    fn long_types_take_first_middle_last() {
        assert_eq!(prefix_for("xyzzy"), "XZY");
        assert_eq!(prefix_for("Factura"), "FTA");
        assert_eq!(prefix_for("evento"), "ENO");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        // "Cliente" is not the table key, so it is derived: C, e (idx 3), e.
        assert_eq!(prefix_for("Cliente"), "CEE");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: derived prefixes are exactly three uppercase ASCII letters.
            #[test]
            fn derived_prefix_is_three_uppercase_letters(name in "[a-z][a-zA-Z]{0,30}") {
                let prefix = prefix_for(&name);
                prop_assert_eq!(prefix.chars().count(), 3);
                prop_assert!(prefix.chars().all(|c| c.is_ascii_uppercase()));
            }

            /// Property: the derived prefix starts with the first character.
            #[test]
            fn derived_prefix_keeps_first_char(name in "[a-z]{3,30}") {
                prop_assume!(EntityKind::from_type_name(&name).is_none());
                let prefix = prefix_for(&name);
                let first = name.chars().next().unwrap().to_ascii_uppercase();
                prop_assert_eq!(prefix.chars().next(), Some(first));
            }
        }
    }
}
