//! Human-readable descriptions used in planning errors

use std::sync::Arc;

use crate::container::binding::Binding;
use crate::planning::target::Target;

/// List the bindings registered for an identifier, one per line.
///
/// Bindings without an implementation type are listed as `Object`; a
/// binding whose constraint was built from a tag shows that tag.
pub fn list_registered_bindings(bindings: &[Arc<Binding>]) -> String {
    if bindings.is_empty() {
        return String::new();
    }

    let mut listing = String::from("\nRegistered bindings:");
    for binding in bindings {
        let name = binding
            .implementation_type()
            .map(|key| key.short_name())
            .unwrap_or("Object");
        listing.push_str("\n ");
        listing.push_str(name);
        if let Some(tag) = binding.constraint().metadata() {
            listing.push_str(" - ");
            listing.push_str(&tag.to_string());
        }
    }
    listing
}

/// Describe the identifier requested by `target` together with its name
/// and custom tags
pub fn list_metadata_for_target(service_identifier: &str, target: &Target) -> String {
    if !target.is_tagged() && !target.is_named() {
        return format!(" {}", service_identifier);
    }

    let mut tags = String::new();
    if let Some(named) = target.get_named_tag() {
        tags.push_str(&named.to_string());
        tags.push('\n');
    }
    for tag in target.get_custom_tags() {
        tags.push_str(&tag.to_string());
        tags.push('\n');
    }
    format!(" {}\n {} - {}", service_identifier, service_identifier, tags)
}

/// Join an identifier chain as `A --> B --> C`
pub fn dependency_chain_to_string<I, S>(chain: I) -> String
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    chain
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(" --> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::constraints::Constraint;
    use crate::container::scope::BindingScope;
    use crate::planning::metadata::Tag;
    use crate::planning::target::TargetType;

    #[test]
    fn test_registered_binding_listing() {
        let plain = Arc::new(Binding::new("Weapon".into(), BindingScope::Transient));
        let named = Arc::new(Binding::new("Weapon".into(), BindingScope::Transient));
        named.set_constraint(Constraint::named("katana"));

        let listing = list_registered_bindings(&[plain, named]);

        assert_eq!(
            listing,
            "\nRegistered bindings:\n Object\n Object - {\"key\":\"named\",\"value\":\"katana\"}"
        );
        assert_eq!(list_registered_bindings(&[]), "");
    }

    #[test]
    fn test_target_metadata_listing() {
        let plain = Target::new(TargetType::Variable, "", "Weapon".into());
        assert_eq!(list_metadata_for_target("Weapon", &plain), " Weapon");

        let named = plain.clone().with_tag(Tag::named("katana"));
        assert_eq!(
            list_metadata_for_target("Weapon", &named),
            " Weapon\n Weapon - {\"key\":\"named\",\"value\":\"katana\"}\n"
        );
    }

    #[test]
    fn test_dependency_chain() {
        assert_eq!(dependency_chain_to_string(["A", "B", "A"]), "A --> B --> A");
    }
}
