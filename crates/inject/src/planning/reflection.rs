use crate::container::identifier::{ServiceIdentifier, TypeKey};
use crate::errors::{InjectError, Result};
use crate::planning::metadata::{Tag, TagKey, TagValue};
use crate::planning::metadata_reader::MetadataReader;
use crate::planning::target::{Target, TargetType};

/// Reserved tags of one injection point
#[derive(Default)]
struct FormattedMetadata<'a> {
    inject: Option<&'a ServiceIdentifier>,
    multi_inject: Option<&'a ServiceIdentifier>,
    target_name: Option<&'a str>,
    unmanaged: bool,
}

fn format_target_metadata(tags: &[Tag]) -> FormattedMetadata<'_> {
    let mut formatted = FormattedMetadata::default();
    for tag in tags {
        match (&tag.key, &tag.value) {
            (TagKey::Inject, TagValue::Id(id)) => formatted.inject = Some(id),
            (TagKey::MultiInject, TagValue::Id(id)) => formatted.multi_inject = Some(id),
            (TagKey::Name, TagValue::Str(name)) => formatted.target_name = Some(name),
            (TagKey::Unmanaged, TagValue::Bool(flag)) => formatted.unmanaged = *flag,
            _ => {}
        }
    }
    formatted
}

/// Injection targets of `key`: one per managed constructor parameter, then
/// one per injected property including those inherited from base types
pub fn get_dependencies(reader: &dyn MetadataReader, key: &TypeKey) -> Result<Vec<Target>> {
    get_targets(reader, key, false)
}

fn get_targets(reader: &dyn MetadataReader, key: &TypeKey, is_base_class: bool) -> Result<Vec<Target>> {
    let type_name = key.short_name();
    let metadata = reader.get_constructor_metadata(key)?;

    let Some(identifiers) = metadata.compiler_generated else {
        return Err(InjectError::MissingInjectableAnnotation {
            type_name: type_name.to_string(),
        });
    };

    let user_generated = metadata.user_generated;
    let iterations = if identifiers.is_empty() && !user_generated.is_empty() {
        user_generated.len()
    } else {
        identifiers.len()
    };

    let mut targets = Vec::with_capacity(iterations);
    for index in 0..iterations {
        let tags = user_generated.get(&index).cloned().unwrap_or_default();
        let formatted = format_target_metadata(&tags);
        if formatted.unmanaged {
            continue;
        }

        let declared = formatted.inject.or(formatted.multi_inject).cloned();
        let inferred = identifiers.get(index).cloned().flatten();
        let service_identifier = match declared.or(inferred) {
            Some(id) if !id.is_null() => id,
            _ if is_base_class => ServiceIdentifier::token(""),
            _ => {
                return Err(InjectError::MissingInjectAnnotation {
                    index,
                    type_name: type_name.to_string(),
                })
            }
        };

        let name = formatted.target_name.unwrap_or_default().to_string();
        targets.push(
            Target::new(TargetType::ConstructorArgument, name, service_identifier).with_metadata(tags),
        );
    }

    targets.extend(get_class_props_as_targets(reader, key)?);
    Ok(targets)
}

/// Fail when `next` was already seen on the base-type chain
fn check_base_chain(visited: &mut Vec<TypeKey>, next: TypeKey) -> Result<()> {
    if visited.contains(&next) {
        let chain = visited
            .iter()
            .chain(std::iter::once(&next))
            .map(|key| key.short_name())
            .collect::<Vec<_>>()
            .join(" --> ");
        return Err(InjectError::CircularDependency { chain });
    }
    visited.push(next);
    Ok(())
}

fn get_class_props_as_targets(reader: &dyn MetadataReader, key: &TypeKey) -> Result<Vec<Target>> {
    let mut targets = Vec::new();
    let mut visited = Vec::new();
    let mut current = Some(*key);

    while let Some(type_key) = current {
        check_base_chain(&mut visited, type_key)?;
        for (property, tags) in reader.get_properties_metadata(&type_key)? {
            let formatted = format_target_metadata(&tags);
            let name = formatted.target_name.unwrap_or(&property).to_string();
            let service_identifier = formatted
                .inject
                .or(formatted.multi_inject)
                .cloned()
                .ok_or_else(|| InjectError::MissingPropertyInjectAnnotation {
                    property: property.clone(),
                    type_name: type_key.short_name().to_string(),
                })?;
            targets.push(Target::new(TargetType::ClassProperty, name, service_identifier).with_metadata(tags));
        }
        current = reader.get_base_type(&type_key)?;
    }

    Ok(targets)
}

/// Number of dependencies the nearest base type with managed dependencies
/// expects, or zero when no base type declares any
pub fn get_base_class_dependency_count(reader: &dyn MetadataReader, key: &TypeKey) -> Result<usize> {
    let mut visited = vec![*key];
    let mut current = reader.get_base_type(key)?;

    while let Some(base) = current {
        check_base_chain(&mut visited, base)?;
        let targets = get_targets(reader, &base, true)?;
        let unmanaged = targets
            .iter()
            .flat_map(|target| target.metadata())
            .filter(|tag| tag.key == TagKey::Unmanaged)
            .count();
        let dependency_count = targets.len().saturating_sub(unmanaged);
        if dependency_count > 0 {
            return Ok(dependency_count);
        }
        current = reader.get_base_type(&base)?;
    }

    Ok(0)
}
