use std::rc::Rc;
use std::sync::Arc;

use tracing::{trace, warn};
use uuid::Uuid;

use crate::container::binding::{Binding, BindingKind};
use crate::container::identifier::ServiceIdentifier;
use crate::container::Container;
use crate::errors::{InjectError, Result};
use crate::planning::context::{Context, Plan};
use crate::planning::injectable::Newable;
use crate::planning::metadata::Tag;
use crate::planning::metadata_reader::MetadataReader;
use crate::planning::reflection::{get_base_class_dependency_count, get_dependencies};
use crate::planning::request::Request;
use crate::planning::serialization::{
    dependency_chain_to_string, list_metadata_for_target, list_registered_bindings,
};
use crate::planning::target::{Target, TargetType};

/// Parameters of one planning call
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub is_multi_inject: bool,
    pub target_type: TargetType,
    pub service_identifier: ServiceIdentifier,
    /// Extra tag required by tagged and named lookups
    pub tag: Option<Tag>,
    /// Keep every candidate binding regardless of its constraint
    pub avoid_constraints: bool,
}

/// Build the request tree for `options.service_identifier`
pub fn plan(reader: &dyn MetadataReader, container: &Container, options: PlanOptions) -> Result<Context> {
    let target = create_target(
        options.is_multi_inject,
        options.target_type,
        options.service_identifier.clone(),
        options.tag,
    );

    let mut planner = Planner {
        reader,
        container,
        resolving: Vec::new(),
    };
    let root = planner.create_sub_requests(
        options.avoid_constraints,
        options.service_identifier,
        None,
        target,
    )?;

    Ok(Context::new(container.clone(), Plan::new(root)))
}

fn create_target(
    is_multi_inject: bool,
    target_type: TargetType,
    service_identifier: ServiceIdentifier,
    tag: Option<Tag>,
) -> Target {
    let inject = if is_multi_inject {
        Tag::multi_inject(service_identifier.clone())
    } else {
        Tag::inject(service_identifier.clone())
    };
    let target = Target::new(target_type, "", service_identifier).with_tag(inject);
    match tag {
        Some(tag) => target.with_tag(tag),
        None => target,
    }
}

struct Planner<'a> {
    reader: &'a dyn MetadataReader,
    container: &'a Container,
    /// Instance bindings currently being expanded, outermost first
    resolving: Vec<(ServiceIdentifier, Uuid)>,
}

impl<'a> Planner<'a> {
    fn create_sub_requests(
        &mut self,
        avoid_constraints: bool,
        service_identifier: ServiceIdentifier,
        parent: Option<&Rc<Request>>,
        target: Target,
    ) -> Result<Rc<Request>> {
        let active = self.get_active_bindings(avoid_constraints, parent, &target)?;
        trace!(
            service = %service_identifier,
            candidates = active.len(),
            depth = self.resolving.len(),
            "planning dependency"
        );

        let request = match parent {
            None => Request::root(service_identifier, active.clone(), target),
            Some(parent) => parent.add_child_request(
                target.service_identifier().clone(),
                active.clone(),
                target,
            ),
        };

        let is_array = request.target().is_array();
        for binding in &active {
            let sub_request = if is_array {
                request.add_child_request(
                    binding.service_identifier().clone(),
                    vec![binding.clone()],
                    request.target().clone(),
                )
            } else if binding.is_cached() {
                continue;
            } else {
                request.clone()
            };

            if let BindingKind::Instance(newable) = binding.kind() {
                self.expand_instance(&sub_request, binding, &newable)?;
            }
        }

        Ok(request)
    }

    fn expand_instance(
        &mut self,
        request: &Rc<Request>,
        binding: &Arc<Binding>,
        newable: &Newable,
    ) -> Result<()> {
        if self.resolving.iter().any(|(_, id)| *id == binding.id()) {
            return Err(InjectError::CircularDependency {
                chain: self.chain_to(request.service_identifier()),
            });
        }
        if let Some(max_depth) = self.container.options().max_plan_depth {
            if self.resolving.len() >= max_depth {
                return Err(InjectError::MaxDepthExceeded {
                    depth: max_depth,
                    chain: self.chain_to(request.service_identifier()),
                });
            }
        }

        let type_key = newable.type_key();
        let dependencies = get_dependencies(self.reader, &type_key)?;

        if !self.container.options().skip_base_class_checks {
            let base_count = get_base_class_dependency_count(self.reader, &type_key)?;
            if dependencies.len() < base_count {
                return Err(InjectError::ArgumentsLengthMismatch {
                    type_name: newable.name().to_string(),
                });
            }
        }

        self.resolving
            .push((request.service_identifier().clone(), binding.id()));
        let result = dependencies.into_iter().try_for_each(|dependency| {
            let service_identifier = dependency.service_identifier().clone();
            self.create_sub_requests(false, service_identifier, Some(request), dependency)
                .map(|_| ())
        });
        self.resolving.pop();
        result
    }

    fn chain_to(&self, last: &ServiceIdentifier) -> String {
        dependency_chain_to_string(
            self.resolving
                .iter()
                .map(|(id, _)| id)
                .chain(std::iter::once(last)),
        )
    }

    fn get_active_bindings(
        &self,
        avoid_constraints: bool,
        parent: Option<&Rc<Request>>,
        target: &Target,
    ) -> Result<Vec<Arc<Binding>>> {
        let service_identifier = target.service_identifier();
        let mut bindings = self.container.get_bindings(service_identifier)?;

        if bindings.is_empty()
            && self.container.options().auto_bind_injectable
            && self.auto_bind(service_identifier)?
        {
            bindings = self.container.get_bindings(service_identifier)?;
        }

        let active: Vec<Arc<Binding>> = if avoid_constraints {
            bindings.clone()
        } else {
            bindings
                .iter()
                .filter(|binding| {
                    let probe = Request::detached(
                        binding.service_identifier().clone(),
                        parent,
                        vec![Arc::clone(binding)],
                        target.clone(),
                    );
                    binding.constraint().matches(&probe)
                })
                .cloned()
                .collect()
        };

        validate_active_binding_count(service_identifier, active, target, &bindings)
    }

    /// Register a self binding for an unbound injectable type
    fn auto_bind(&self, service_identifier: &ServiceIdentifier) -> Result<bool> {
        let Some(type_key) = service_identifier.as_type() else {
            return Ok(false);
        };
        let metadata = self.reader.get_constructor_metadata(type_key)?;
        if metadata.compiler_generated.is_none() {
            return Ok(false);
        }
        let Some(newable) = self.container.types().newable(type_key) else {
            return Ok(false);
        };

        warn!(service = %service_identifier, "auto-binding injectable type to itself");
        self.container
            .bind(service_identifier.clone())?
            .to_newable(newable);
        Ok(true)
    }
}

fn validate_active_binding_count(
    service_identifier: &ServiceIdentifier,
    active: Vec<Arc<Binding>>,
    target: &Target,
    registered: &[Arc<Binding>],
) -> Result<Vec<Arc<Binding>>> {
    match active.len() {
        0 if target.is_optional() => Ok(active),
        // Several constrained bindings and nothing on the target to pick one
        0 if registered.len() > 1
            && !target.is_array()
            && !target.is_named()
            && !target.is_tagged() =>
        {
            let service = service_identifier.to_string();
            let details = list_registered_bindings(registered);
            Err(InjectError::AmbiguousMatch { service, details })
        }
        0 => {
            let service = service_identifier.to_string();
            let mut details = list_metadata_for_target(&service, target);
            details.push_str(&list_registered_bindings(registered));
            Err(InjectError::NotRegistered { service, details })
        }
        1 => Ok(active),
        _ if target.is_array() => Ok(active),
        _ => {
            let service = service_identifier.to_string();
            let details = list_registered_bindings(registered);
            Err(InjectError::AmbiguousMatch { service, details })
        }
    }
}
