use kbo_types::EntityType;

/// Derive whether an entity number refers to an enterprise or an establishment (§3.1, §4.2).
///
/// Establishment numbers lead with exactly one digit followed by a non-digit separator, e.g.
/// `1.234.567.890`; enterprise numbers lead with more than one digit, e.g. `1234.567.890`.
pub fn entity_type_of(entity_number: &str) -> EntityType {
    let mut chars = entity_number.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_ascii_digit() && !second.is_ascii_digit() => {
            EntityType::Establishment
        }
        _ => EntityType::Enterprise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leading_digit_then_separator_is_establishment() {
        assert_eq!(entity_type_of("1.234.567.890"), EntityType::Establishment);
    }

    #[test]
    fn multiple_leading_digits_is_enterprise() {
        assert_eq!(entity_type_of("1234.567.890"), EntityType::Enterprise);
    }

    #[test]
    fn short_or_empty_input_defaults_to_enterprise() {
        assert_eq!(entity_type_of(""), EntityType::Enterprise);
        assert_eq!(entity_type_of("1"), EntityType::Enterprise);
    }
}
